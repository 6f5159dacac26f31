//! # Pending Content Module
//!
//! Questo modulo definisce la rappresentazione transiente del contenuto in
//! pubblicazione (l'entità ottimistica) e lo slot condiviso osservabile.
//!
//! ## Strutture dati:
//! - `PendingKind`: Post oppure Story
//! - `PendingStatus`: Publishing / Success / Error(messaggio)
//! - `PendingContent`: Entità ottimistica (testo, preview locali, autore, progress)
//! - `PendingSlot`: Slot singolo per kind, osservabile via canale `watch`
//!
//! ## Macchina a stati (per item pendente):
//! ```text
//! Idle -> Publishing --(network success)--> Success --(timeout)--> Idle
//!                    \--(network failure)--> Error --(timeout)--> Idle
//! ```
//!
//! ## Invarianti:
//! - `progress` non decresce mai; tentativi di abbassarlo vengono ignorati
//! - `progress` non supera il ceiling finché la rete non conferma, poi viene
//!   portato a 100 in un solo snap
//! - Gli stati terminali non tornano mai a Publishing
//! - L'orchestratore è l'unico writer dello slot; indicator e test osservano
//!   tramite `subscribe()`
//! - Ogni mutazione dopo `install` è vincolata al `local_id` della
//!   sottomissione che l'ha emessa: un task rimpiazzato che arriva tardi al
//!   suo clear o set_status non può toccare la card di chi l'ha sostituito

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

static LOCAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Kind of content in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingKind {
    Post,
    Story,
}

/// Lifecycle state of a pending submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "message")]
pub enum PendingStatus {
    Publishing,
    Success,
    Error(String),
}

impl PendingStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PendingStatus::Publishing)
    }
}

/// Transient local representation of content before server confirmation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingContent {
    /// Opaque placeholder identifier, never server-assigned
    pub local_id: String,
    pub kind: PendingKind,
    pub text: String,
    /// Local preview URLs for attached media (not yet durable)
    pub preview_urls: Vec<String>,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    /// 0-100, monotone non-decreasing until the terminal snap
    pub progress: u8,
    pub status: PendingStatus,
}

impl PendingContent {
    /// Build a fresh optimistic entity in the Publishing state
    pub fn new(kind: PendingKind, text: String, preview_urls: Vec<String>) -> Self {
        let n = LOCAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self {
            local_id: format!("temp-pending-{}", n),
            kind,
            text,
            preview_urls,
            author_name: None,
            author_avatar: None,
            progress: 0,
            status: PendingStatus::Publishing,
        }
    }

    pub fn with_author(mut self, name: Option<String>, avatar: Option<String>) -> Self {
        self.author_name = name;
        self.author_avatar = avatar;
        self
    }

    /// Advance the cosmetic progress, enforcing monotonicity and the ceiling.
    ///
    /// Only meaningful while Publishing; terminal states ignore the tick.
    pub fn advance_progress(&mut self, next: u8, ceiling: u8) {
        if self.status.is_terminal() {
            return;
        }
        let capped = next.min(ceiling);
        if capped > self.progress {
            self.progress = capped;
        }
    }

    /// Authoritative completion signal: snap to 100 in one step.
    pub fn snap_complete(&mut self) {
        self.progress = 100;
    }
}

/// Single observable slot holding at most one pending item of a given kind.
///
/// Wraps a `watch` channel so every mutation is a broadcast snapshot; the
/// indicator (and the tests) read the sequence of snapshots without ever
/// mutating it.
pub struct PendingSlot {
    tx: watch::Sender<Option<PendingContent>>,
}

impl PendingSlot {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PendingContent>> {
        self.tx.subscribe()
    }

    /// Install a new pending item, silently overwriting whatever was shown
    pub fn install(&self, content: PendingContent) {
        self.tx.send_replace(Some(content));
    }

    /// Apply a progress tick to the item, if it is still the given one
    pub fn advance_progress(&self, local_id: &str, next: u8, ceiling: u8) {
        self.tx.send_if_modified(|slot| match slot.as_mut() {
            Some(content) if content.local_id == local_id => {
                content.advance_progress(next, ceiling);
                true
            }
            _ => false,
        });
    }

    /// Snap the item's progress to 100, if it is still the given one
    pub fn snap_complete(&self, local_id: &str) {
        self.tx.send_if_modified(|slot| match slot.as_mut() {
            Some(content) if content.local_id == local_id => {
                content.snap_complete();
                true
            }
            _ => false,
        });
    }

    /// Transition the item's status, if it is still the given one
    pub fn set_status(&self, local_id: &str, status: PendingStatus) {
        self.tx.send_if_modified(|slot| match slot.as_mut() {
            Some(content) if content.local_id == local_id => {
                content.status = status;
                true
            }
            _ => false,
        });
    }

    /// Remove the pending item from display, if it is still the given one.
    ///
    /// The identity guard is what makes replacement safe: a replaced task
    /// already past its abort check cannot wipe its successor's card.
    pub fn clear(&self, local_id: &str) {
        self.tx.send_if_modified(|slot| {
            let owned = matches!(slot, Some(content) if content.local_id == local_id);
            if owned {
                *slot = None;
            }
            owned
        });
    }

    /// Current snapshot (for one-shot reads; observers should subscribe)
    pub fn current(&self) -> Option<PendingContent> {
        self.tx.borrow().clone()
    }
}

impl Default for PendingSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotone_and_capped() {
        let mut content = PendingContent::new(PendingKind::Post, "hi".into(), vec![]);
        content.advance_progress(5, 90);
        assert_eq!(content.progress, 5);

        // Lower values are ignored
        content.advance_progress(3, 90);
        assert_eq!(content.progress, 5);

        // Ceiling caps the value
        content.advance_progress(95, 90);
        assert_eq!(content.progress, 90);

        // Only the snap reaches 100
        content.snap_complete();
        assert_eq!(content.progress, 100);
    }

    #[test]
    fn test_terminal_states_ignore_ticks() {
        let mut content = PendingContent::new(PendingKind::Post, "hi".into(), vec![]);
        content.advance_progress(40, 90);
        content.status = PendingStatus::Error("boom".into());
        content.advance_progress(80, 90);
        assert_eq!(content.progress, 40);
    }

    #[test]
    fn test_local_ids_are_unique() {
        let a = PendingContent::new(PendingKind::Post, String::new(), vec![]);
        let b = PendingContent::new(PendingKind::Story, String::new(), vec![]);
        assert_ne!(a.local_id, b.local_id);
        assert!(a.local_id.starts_with("temp-pending-"));
    }

    #[test]
    fn test_slot_install_overwrites() {
        let slot = PendingSlot::new();
        assert!(slot.current().is_none());

        let first = PendingContent::new(PendingKind::Post, "first".into(), vec![]);
        slot.install(first);
        let second = PendingContent::new(PendingKind::Post, "second".into(), vec![]);
        slot.install(second);

        assert_eq!(slot.current().unwrap().text, "second");
    }

    #[tokio::test]
    async fn test_slot_broadcasts_snapshots() {
        let slot = PendingSlot::new();
        let mut rx = slot.subscribe();

        slot.install(PendingContent::new(PendingKind::Story, "s".into(), vec![]));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().progress, 0);
        let id = slot.current().unwrap().local_id;

        slot.advance_progress(&id, 30, 90);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().progress, 30);

        slot.clear(&id);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn test_slot_ignores_mutations_from_replaced_submission() {
        let slot = PendingSlot::new();

        let first = PendingContent::new(PendingKind::Post, "first".into(), vec![]);
        let first_id = first.local_id.clone();
        slot.install(first);

        let second = PendingContent::new(PendingKind::Post, "second".into(), vec![]);
        let second_id = second.local_id.clone();
        slot.install(second);

        // A replaced submission arriving late cannot touch its successor's card
        slot.set_status(&first_id, PendingStatus::Error("late".into()));
        slot.clear(&first_id);

        let current = slot.current().unwrap();
        assert_eq!(current.text, "second");
        assert_eq!(current.status, PendingStatus::Publishing);

        slot.clear(&second_id);
        assert!(slot.current().is_none());
    }
}
