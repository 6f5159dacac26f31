//! # Local Preview URL Module
//!
//! Questo modulo gestisce il ciclo di vita degli URL di preview locali usati
//! dall'entità ottimistica prima che l'upload produca URL durevoli.
//!
//! ## Responsabilità:
//! - `acquire()` registra un URL di preview per un file raw
//! - `PreviewUrl` è un handle RAII: `release()` esplicita oppure rilascio
//!   automatico al Drop, in ogni caso esattamente una volta
//! - Il registry conta gli handle vivi, così i test possono dimostrare che
//!   nessun percorso di uscita (sostituzione, upload riuscito, teardown)
//!   dimentica una revoca
//!
//! Equivalente lato-client di `URL.createObjectURL`/`revokeObjectURL`: qui
//! l'URL è sintetico ma la disciplina di revoca è la stessa.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Process-local registry of live preview URLs
#[derive(Default)]
pub struct PreviewRegistry {
    live: Mutex<HashSet<String>>,
    counter: AtomicU64,
}

impl PreviewRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a preview URL for a raw media file
    pub fn acquire(self: &Arc<Self>, file: &Path) -> PreviewUrl {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let name = file
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media".to_string());
        let url = format!("local://preview/{}/{}", n, name);

        if let Ok(mut live) = self.live.lock() {
            live.insert(url.clone());
        }
        debug!("Acquired preview URL: {}", url);

        PreviewUrl {
            url,
            registry: Arc::clone(self),
            released: false,
        }
    }

    /// Number of preview URLs not yet released
    pub fn live_count(&self) -> usize {
        self.live.lock().map(|l| l.len()).unwrap_or(0)
    }

    fn revoke(&self, url: &str) {
        if let Ok(mut live) = self.live.lock() {
            if live.remove(url) {
                debug!("Released preview URL: {}", url);
            }
        }
    }
}

/// RAII handle over a registered preview URL.
///
/// Release happens exactly once, on whichever comes first: an explicit
/// `release()` call or the handle going out of scope.
pub struct PreviewUrl {
    url: String,
    registry: Arc<PreviewRegistry>,
    released: bool,
}

impl PreviewUrl {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Revoke the URL now; further calls are no-ops
    pub fn release(&mut self) {
        if !self.released {
            self.registry.revoke(&self.url);
            self.released = true;
        }
    }
}

impl Drop for PreviewUrl {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_acquire_and_explicit_release() {
        let registry = PreviewRegistry::new();
        let mut preview = registry.acquire(&PathBuf::from("/tmp/cat.jpg"));
        assert!(preview.url().contains("cat.jpg"));
        assert_eq!(registry.live_count(), 1);

        preview.release();
        assert_eq!(registry.live_count(), 0);

        // Idempotent
        preview.release();
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_drop_releases() {
        let registry = PreviewRegistry::new();
        {
            let _a = registry.acquire(&PathBuf::from("a.png"));
            let _b = registry.acquire(&PathBuf::from("b.png"));
            assert_eq!(registry.live_count(), 2);
        }
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_urls_are_unique_per_acquire() {
        let registry = PreviewRegistry::new();
        let a = registry.acquire(&PathBuf::from("same.jpg"));
        let b = registry.acquire(&PathBuf::from("same.jpg"));
        assert_ne!(a.url(), b.url());
    }
}
