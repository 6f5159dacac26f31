//! # Progress Ticker Module
//!
//! Timer del progress cosmetico, incapsulato in una guard RAII.
//!
//! ## Invariante:
//! Al massimo un ticker attivo per sottomissione pendente. La guard aborta il
//! task dell'intervallo quando viene droppata, quindi ogni percorso di uscita
//! dell'orchestratore (successo, errore, cancellazione del task) ferma il
//! timer in modo dimostrabile: un ticker che sopravvive al suo stato
//! `Publishing` è un bug.

use crate::pending::PendingSlot;
use crate::progress::ProgressSimulator;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// RAII guard around the repeating cosmetic-progress task
pub struct ProgressTicker {
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    /// Spawn the interval task; the first increment lands one full period
    /// after the start, never immediately.
    pub fn start(
        slot: Arc<PendingSlot>,
        local_id: String,
        mut simulator: Box<dyn ProgressSimulator>,
        ceiling: u8,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(simulator.period());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // tokio intervals fire once immediately; swallow that tick
            interval.tick().await;

            loop {
                interval.tick().await;
                let current = slot.current().map(|c| c.progress).unwrap_or(0);
                let next = simulator.tick(current);
                slot.advance_progress(&local_id, next, ceiling);
            }
        });

        Self { handle }
    }

    /// Stop ticking; equivalent to dropping the guard
    pub fn stop(self) {
        debug!("Stopping progress ticker");
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pending::{PendingContent, PendingKind};
    use crate::progress::FixedStep;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_ticker_increments_on_the_period() {
        let slot = Arc::new(PendingSlot::new());
        slot.install(PendingContent::new(PendingKind::Post, "t".into(), vec![]));
        let id = slot.current().unwrap().local_id;

        let ticker = ProgressTicker::start(
            Arc::clone(&slot),
            id,
            Box::new(FixedStep::new(5, Duration::from_millis(100))),
            90,
        );

        // Nothing lands before the first period elapses
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(slot.current().unwrap().progress, 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(slot.current().unwrap().progress, 5);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(slot.current().unwrap().progress, 20);

        ticker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_respects_ceiling() {
        let slot = Arc::new(PendingSlot::new());
        slot.install(PendingContent::new(PendingKind::Post, "t".into(), vec![]));
        let id = slot.current().unwrap().local_id;

        let _ticker = ProgressTicker::start(
            Arc::clone(&slot),
            id,
            Box::new(FixedStep::new(50, Duration::from_millis(100))),
            90,
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(slot.current().unwrap().progress, 90);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_the_guard_stops_increments() {
        let slot = Arc::new(PendingSlot::new());
        slot.install(PendingContent::new(PendingKind::Post, "t".into(), vec![]));
        let id = slot.current().unwrap().local_id;

        let ticker = ProgressTicker::start(
            Arc::clone(&slot),
            id,
            Box::new(FixedStep::new(5, Duration::from_millis(100))),
            90,
        );

        tokio::time::sleep(Duration::from_millis(350)).await;
        let frozen = slot.current().unwrap().progress;
        assert!(frozen > 0);

        drop(ticker);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(slot.current().unwrap().progress, frozen);
    }
}
