//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `PublishError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//! - Supporta error chaining per mantenere il contesto degli errori
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file non trovati, permessi, etc.)
//! - `Http`: Errori di trasporto HTTP (connessione, TLS, timeout)
//! - `Upload`: Upload media rifiutato dal server
//! - `Creation`: Creazione post/story rifiutata dal server
//! - `Json`: Errori di (de)serializzazione JSON
//! - `Session`: Errori del session store (profilo mancante, file corrotto)
//! - `Probe`: Errori di analisi media con ffprobe/ffmpeg
//! - `MissingDependency`: Tool esterno mancante (ffmpeg, ffprobe)
//! - `Validation`: Errori di validazione input
//!
//! Nota: il fallimento della promozione a pagamento non ha una variante
//! propria perché non attraversa mai il boundary dell'orchestratore
//! (viene loggato e inghiottito, mai mostrato all'utente).

/// Custom error types for the publish pipeline
#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Creation failed: {0}")]
    Creation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Media probe error: {0}")]
    Probe(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl PublishError {
    /// Human-readable message shown inline on the pending indicator.
    pub fn user_message(&self) -> String {
        match self {
            PublishError::Upload(msg) => msg.clone(),
            PublishError::Creation(msg) => msg.clone(),
            PublishError::Http(_) => "Network error, please try again".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_rejections_surface_their_message_verbatim() {
        assert_eq!(
            PublishError::Upload("file too large".into()).user_message(),
            "file too large"
        );
        assert_eq!(
            PublishError::Creation("title too short".into()).user_message(),
            "title too short"
        );
    }

    #[test]
    fn test_cli_facing_variants_keep_their_prefix() {
        let session = PublishError::Session("No stored session".into());
        assert_eq!(session.to_string(), "Session error: No stored session");
        assert_eq!(session.user_message(), "Session error: No stored session");

        let validation = PublishError::Validation("Unknown filter: neon".into());
        assert_eq!(validation.to_string(), "Validation error: Unknown filter: neon");
    }
}
