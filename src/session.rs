//! # Session Management Module
//!
//! Questo modulo gestisce l'identità di sessione usata per popolare i campi
//! autore dell'entità ottimistica.
//!
//! ## Responsabilità:
//! - Definisce `SessionProfile` (token, user id, nome, avatar)
//! - Espone il trait `SessionStore` con metodi espliciti di lettura/scrittura
//!   (niente storage globale ambientale: l'orchestratore riceve lo store iniettato)
//! - Persiste il profilo in file JSON per API base specifiche
//! - Fornisce uno store in-memory per i test
//!
//! ## Strategia di persistence:
//! - Un file JSON per API base (basato su hash dell'URL)
//! - Salvataggio in `~/.haraj-publisher/session_<hash>.json`
//! - Load-or-default: file mancante o corrotto equivale a nessuna sessione
//!
//! ## Esempio struttura session file:
//! ```json
//! {
//!   "token": "eyJhbGci...",
//!   "userId": "84210",
//!   "userName": "Sara",
//!   "userAvatar": "https://cdn.haraj.app/u/84210.jpg"
//! }
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::fs;

/// Cached identity of the logged-in user
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionProfile {
    pub token: String,
    pub user_id: String,
    pub user_name: String,
    pub user_avatar: Option<String>,
}

/// Explicit read/write access to the session identity.
///
/// The publish orchestrator only ever reads; the CLI `session` subcommand
/// writes. Synchronous on purpose: both backends are cheap and the read
/// happens once per submission, before any suspension point.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<SessionProfile>>;
    fn store(&self, profile: SessionProfile) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// File-backed session store, one file per API base URL
pub struct FileSessionStore {
    session_file_path: PathBuf,
}

impl FileSessionStore {
    /// Create a session store scoped to a specific API base URL
    pub async fn new(api_base_url: &str) -> Result<Self> {
        let session_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?
            .join(".haraj-publisher");

        fs::create_dir_all(&session_dir).await?;

        // Create unique session file based on API base hash
        let mut hasher = Sha256::new();
        hasher.update(api_base_url.trim_end_matches('/').as_bytes());
        let hash = hex::encode(hasher.finalize())[..16].to_string();

        let session_file_path = session_dir.join(format!("session_{}.json", hash));

        Ok(Self { session_file_path })
    }

    /// Path of the backing file (exposed for diagnostics)
    pub fn path(&self) -> &PathBuf {
        &self.session_file_path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionProfile>> {
        if !self.session_file_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.session_file_path)?;
        // A corrupt session file behaves like a missing one
        Ok(serde_json::from_str(&content).ok())
    }

    fn store(&self, profile: SessionProfile) -> Result<()> {
        let content = serde_json::to_string_pretty(&profile)?;
        std::fs::write(&self.session_file_path, content)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.session_file_path.exists() {
            std::fs::remove_file(&self.session_file_path)?;
        }
        Ok(())
    }
}

/// In-memory session store for tests and embedding hosts
#[derive(Default)]
pub struct MemorySessionStore {
    profile: Mutex<Option<SessionProfile>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: SessionProfile) -> Self {
        Self {
            profile: Mutex::new(Some(profile)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionProfile>> {
        Ok(self
            .profile
            .lock()
            .map_err(|_| anyhow::anyhow!("Session store lock poisoned"))?
            .clone())
    }

    fn store(&self, profile: SessionProfile) -> Result<()> {
        *self
            .profile
            .lock()
            .map_err(|_| anyhow::anyhow!("Session store lock poisoned"))? = Some(profile);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self
            .profile
            .lock()
            .map_err(|_| anyhow::anyhow!("Session store lock poisoned"))? = None;
        Ok(())
    }
}
