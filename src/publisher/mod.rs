//! # Publisher Module
//!
//! Questo modulo contiene l'orchestratore della pubblicazione ottimistica e
//! il ticker del progress cosmetico.
//!
//! ## Componenti:
//! - `orchestrator`: ciclo di vita completo di post e story (entità
//!   ottimistica, catena di rete, stati terminali, pulizia temporizzata)
//! - `ticker`: guard RAII sul timer degli incrementi cosmetici

pub mod orchestrator;
pub mod ticker;

pub use orchestrator::{PostDraft, PublishTask, Publisher};
pub use ticker::ProgressTicker;
