//! # Haraj Publisher Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e costanti di timing della pipeline
//! - `error`: Tipi di errore custom per le diverse operazioni
//! - `session`: Profilo utente autenticato e persistenza della sessione
//! - `pending`: Entità ottimistica e slot osservabile (macchina a stati)
//! - `preview`: URL di preview locali con disciplina di revoca RAII
//! - `progress`: Simulatori di progress cosmetico e indicator da terminale
//! - `api`: Boundary HTTP verso il marketplace (upload, post, story, promote)
//! - `publisher`: Orchestratore della pubblicazione ottimistica
//! - `editor`: Editor story (trim, overlay, filtri, thumbnail)
//! - `media`: Discovery e classificazione dei file media
//! - `events`: Output JSON strutturato per consumo da altri processi
//! - `platform`: Risoluzione dei tool esterni (ffmpeg/ffprobe)
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use haraj_publisher::{Config, Publisher, PostDraft, HttpApi};
//! use haraj_publisher::session::MemorySessionStore;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::default();
//! let api = HttpApi::new(&config, None)?;
//! let publisher = Publisher::new(api, config, Arc::new(MemorySessionStore::new()))?;
//! let task = publisher.submit_post(PostDraft {
//!     text: "selling my bike".to_string(),
//!     ..Default::default()
//! });
//! task.wait().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod editor;
pub mod error;
pub mod events;
pub mod media;
pub mod pending;
pub mod platform;
pub mod preview;
pub mod progress;
pub mod publisher;
pub mod session;
pub mod utils;

pub use api::{HttpApi, PostPayload, PublishApi, StoryPayload};
pub use config::Config;
pub use editor::EditorSession;
pub use error::PublishError;
pub use pending::{PendingContent, PendingKind, PendingStatus};
pub use publisher::{PostDraft, PublishTask, Publisher};
pub use session::{FileSessionStore, SessionProfile, SessionStore};
