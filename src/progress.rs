//! # Progress Simulation and Indicator Module
//!
//! Questo modulo gestisce il progress cosmetico e il rendering dell'indicatore.
//!
//! ## Responsabilità:
//! - Trait `ProgressSimulator`: strategia iniettabile che produce il prossimo
//!   valore di progress (i test usano uno stub deterministico al posto dei timer)
//! - `FixedStep`: incremento fisso per i post (+5 ogni 100 ms di default)
//! - `RandomStep`: incremento casuale per le story (+0..=5 ogni 300 ms)
//! - `IndicatorBar`: componente render-only con `indicatif` che osserva lo
//!   slot pendente e non ha altri input oltre a quello stato
//!
//! ## Progress cosmetico:
//! Il valore è generato da un timer e non riflette i byte trasferiti. Il tetto
//! (90 di default) è applicato dallo slot; solo lo snap autoritativo a 100
//! comunica il successo reale.
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [████████████████████░░░░]  82% publishing post…
//! ```

use crate::pending::{PendingContent, PendingStatus};
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use std::time::Duration;
use tokio::sync::watch;

/// Strategy producing the next cosmetic progress value
pub trait ProgressSimulator: Send {
    /// Next value given the current one (clamping happens at the slot)
    fn tick(&mut self, current: u8) -> u8;
    /// Interval between ticks
    fn period(&self) -> Duration;
}

/// Fixed increment per tick (post submissions)
pub struct FixedStep {
    step: u8,
    period: Duration,
}

impl FixedStep {
    pub fn new(step: u8, period: Duration) -> Self {
        Self { step, period }
    }
}

impl ProgressSimulator for FixedStep {
    fn tick(&mut self, current: u8) -> u8 {
        current.saturating_add(self.step)
    }

    fn period(&self) -> Duration {
        self.period
    }
}

/// Random increment drawn from `0..=max_step` per tick (story submissions)
pub struct RandomStep {
    max_step: u8,
    period: Duration,
}

impl RandomStep {
    pub fn new(max_step: u8, period: Duration) -> Self {
        Self { max_step, period }
    }
}

impl ProgressSimulator for RandomStep {
    fn tick(&mut self, current: u8) -> u8 {
        let step = rand::thread_rng().gen_range(0..=self.max_step);
        current.saturating_add(step)
    }

    fn period(&self) -> Duration {
        self.period
    }
}

/// Render-only pending indicator backed by an indicatif bar.
///
/// Mirrors the shared `PendingSlot` into a terminal progress bar and returns
/// the last terminal status once the slot clears.
pub struct IndicatorBar {
    bar: ProgressBar,
}

impl IndicatorBar {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Follow the slot until the pending item is removed.
    ///
    /// Returns the last terminal status observed, if any.
    pub async fn run(
        &self,
        mut rx: watch::Receiver<Option<PendingContent>>,
    ) -> Option<PendingStatus> {
        let mut last_terminal = None;
        let mut seen_item = false;

        loop {
            {
                let snapshot = rx.borrow_and_update();
                match snapshot.as_ref() {
                    Some(content) => {
                        seen_item = true;
                        self.render(content);
                        if content.status.is_terminal() {
                            last_terminal = Some(content.status.clone());
                        }
                    }
                    None => {
                        // Stories clear without a cooldown; leaving on removal
                        // covers a coalesced terminal snapshot too
                        if seen_item {
                            break;
                        }
                    }
                }
            }

            if rx.changed().await.is_err() {
                break;
            }
        }

        match &last_terminal {
            Some(PendingStatus::Success) => self.bar.finish_with_message("published"),
            Some(PendingStatus::Error(msg)) => {
                self.bar.abandon_with_message(format!("failed: {}", msg))
            }
            _ => self.bar.finish_and_clear(),
        }

        last_terminal
    }

    fn render(&self, content: &PendingContent) {
        self.bar.set_position(content.progress as u64);
        let message = match &content.status {
            PendingStatus::Publishing if content.progress == 0 => "connecting…".to_string(),
            PendingStatus::Publishing => format!("publishing {:?}…", content.kind).to_lowercase(),
            PendingStatus::Success => "done".to_string(),
            PendingStatus::Error(msg) => format!("error: {}", msg),
        };
        self.bar.set_message(message);
    }
}

impl Default for IndicatorBar {
    fn default() -> Self {
        Self::new()
    }
}
