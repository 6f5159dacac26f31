//! # JSON Event Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per comunicazione con
//! host esterni (Electron/Python) che embeddano la pipeline.
//!
//! ## Responsabilità:
//! - Emette messaggi JSON strutturati per gli eventi della pipeline
//! - Rispecchia lo slot pendente senza mai mutarlo
//! - Fornisce interfaccia standardizzata per comunicazione inter-processo
//!
//! ## Tipi di messaggi:
//! - `start`: Sottomissione accettata, entità ottimistica installata
//! - `progress`: Tick di progress cosmetico
//! - `success`: Pubblicazione confermata dal server
//! - `error`: Pubblicazione fallita (messaggio inline)
//! - `story_refresh`: La lista story va ricaricata (refresh key incrementata)

use crate::pending::{PendingContent, PendingKind, PendingStatus};
use serde::Serialize;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Sottomissione partita
    Start {
        kind: PendingKind,
        local_id: String,
        media_count: usize,
    },

    /// Tick di progress
    Progress { kind: PendingKind, progress: u8 },

    /// Pubblicazione confermata
    Success { kind: PendingKind },

    /// Pubblicazione fallita
    Error { kind: PendingKind, message: String },

    /// La lista story deve essere ricaricata
    StoryRefresh { refresh_key: u64 },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// Crea un messaggio di inizio dall'entità ottimistica
    pub fn start(content: &PendingContent) -> Self {
        Self::Start {
            kind: content.kind,
            local_id: content.local_id.clone(),
            media_count: content.preview_urls.len(),
        }
    }

    /// Crea il messaggio corrispondente a uno snapshot dello slot
    pub fn from_snapshot(content: &PendingContent) -> Self {
        match &content.status {
            PendingStatus::Publishing => Self::Progress {
                kind: content.kind,
                progress: content.progress,
            },
            PendingStatus::Success => Self::Success { kind: content.kind },
            PendingStatus::Error(message) => Self::Error {
                kind: content.kind,
                message: message.clone(),
            },
        }
    }

    pub fn story_refresh(refresh_key: u64) -> Self {
        Self::StoryRefresh { refresh_key }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_wire_shape() {
        let content = PendingContent::new(PendingKind::Post, "hi".into(), vec!["u".into()]);
        let json = serde_json::to_value(JsonMessage::start(&content)).unwrap();
        assert_eq!(json["type"], "start");
        assert_eq!(json["kind"], "post");
        assert_eq!(json["media_count"], 1);
    }

    #[test]
    fn test_snapshot_mapping() {
        let mut content = PendingContent::new(PendingKind::Story, "s".into(), vec![]);
        content.advance_progress(42, 90);

        let json = serde_json::to_value(JsonMessage::from_snapshot(&content)).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["progress"], 42);

        content.status = PendingStatus::Error("offline".into());
        let json = serde_json::to_value(JsonMessage::from_snapshot(&content)).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "offline");
    }

    #[test]
    fn test_story_refresh() {
        let json = serde_json::to_value(JsonMessage::story_refresh(7)).unwrap();
        assert_eq!(json["type"], "story_refresh");
        assert_eq!(json["refresh_key"], 7);
    }
}
