//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri della pipeline
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `api_base_url`: Base URL dell'API remota (default: https://api.haraj.app)
//! - `connect_delay_ms`: Attesa "connecting" prima del progress numerico (default: 1500)
//! - `post_tick_ms` / `post_tick_step`: Cadenza e passo del progress simulato dei post (default: 100 / 5)
//! - `progress_ceiling`: Tetto del progress finché la rete non conferma (default: 90)
//! - `success_hold_ms`: Pausa tra snap a 100 e stato success (default: 500)
//! - `post_success_clear_ms` / `post_error_clear_ms`: Finestre di display terminali (default: 3000 / 10000)
//! - `story_tick_ms` / `story_tick_max_step`: Cadenza e passo massimo random delle story (default: 300 / 5)
//! - `request_timeout_secs`: Timeout delle richieste HTTP (default: 120)
//! - `json_output`: Emette eventi JSON su stdout per uso programmatico
//!
//! ## Validazione:
//! - Controlla che il tetto di progress sia 1-99 (100 è riservato allo snap finale)
//! - Controlla che passi e cadenze siano > 0
//! - Controlla che la base URL non sia vuota
//!
//! ## Esempio:
//! ```rust
//! use haraj_publisher::Config;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config {
//!     api_base_url: "https://staging.haraj.app".to_string(),
//!     post_tick_ms: 50,
//!     ..Default::default()
//! };
//! config.validate()?;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the publish pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the remote marketplace API
    pub api_base_url: String,
    /// Fixed "connecting" hold before any numeric progress (posts only)
    pub connect_delay_ms: u64,
    /// Cosmetic progress tick interval for posts
    pub post_tick_ms: u64,
    /// Cosmetic progress increment per tick for posts
    pub post_tick_step: u8,
    /// Progress ceiling until the network chain confirms (then snapped to 100)
    pub progress_ceiling: u8,
    /// Pause between the snap to 100 and the success state
    pub success_hold_ms: u64,
    /// Display window of the success card before removal (posts)
    pub post_success_clear_ms: u64,
    /// Display window of the error card before removal (posts)
    pub post_error_clear_ms: u64,
    /// Cosmetic progress tick interval for stories
    pub story_tick_ms: u64,
    /// Maximum random increment per tick for stories (step drawn from 0..=max)
    pub story_tick_max_step: u8,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.haraj.app".to_string(),
            connect_delay_ms: 1500,
            post_tick_ms: 100,
            post_tick_step: 5,
            progress_ceiling: 90,
            success_hold_ms: 500,
            post_success_clear_ms: 3000,
            post_error_clear_ms: 10000,
            story_tick_ms: 300,
            story_tick_max_step: 5,
            request_timeout_secs: 120,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("API base URL must not be empty"));
        }

        if self.progress_ceiling == 0 || self.progress_ceiling > 99 {
            return Err(anyhow::anyhow!(
                "Progress ceiling must be between 1 and 99 (100 is the terminal snap)"
            ));
        }

        if self.post_tick_step == 0 {
            return Err(anyhow::anyhow!("Post progress step must be greater than 0"));
        }

        if self.story_tick_max_step == 0 {
            return Err(anyhow::anyhow!("Story max progress step must be greater than 0"));
        }

        if self.post_tick_ms == 0 || self.story_tick_ms == 0 {
            return Err(anyhow::anyhow!("Progress tick interval must be greater than 0"));
        }

        if self.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Request timeout must be greater than 0"));
        }

        Ok(())
    }

    /// Load configuration from file
    pub async fn from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }

    pub fn success_hold(&self) -> Duration {
        Duration::from_millis(self.success_hold_ms)
    }

    pub fn post_success_clear(&self) -> Duration {
        Duration::from_millis(self.post_success_clear_ms)
    }

    pub fn post_error_clear(&self) -> Duration {
        Duration::from_millis(self.post_error_clear_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.progress_ceiling = 0;
        assert!(config.validate().is_err());

        config.progress_ceiling = 100;
        assert!(config.validate().is_err());

        config.progress_ceiling = 90;
        config.post_tick_step = 0;
        assert!(config.validate().is_err());

        config.post_tick_step = 5;
        config.api_base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.connect_delay_ms, 1500);
        assert_eq!(config.post_tick_ms, 100);
        assert_eq!(config.post_tick_step, 5);
        assert_eq!(config.progress_ceiling, 90);
        assert_eq!(config.success_hold_ms, 500);
        assert_eq!(config.post_success_clear_ms, 3000);
        assert_eq!(config.post_error_clear_ms, 10000);
        assert_eq!(config.story_tick_ms, 300);
        assert_eq!(config.story_tick_max_step, 5);
        assert!(!config.json_output);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            api_base_url: "https://staging.haraj.app".to_string(),
            connect_delay_ms: 500,
            post_tick_ms: 50,
            progress_ceiling: 80,
            ..Default::default()
        };

        // Save config
        original_config.save_to_file(&config_path).await.unwrap();

        // Load config
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.api_base_url, "https://staging.haraj.app");
        assert_eq!(loaded_config.connect_delay_ms, 500);
        assert_eq!(loaded_config.post_tick_ms, 50);
        assert_eq!(loaded_config.progress_ceiling, 80);
    }

    #[tokio::test]
    async fn test_config_missing_file_falls_back_to_default() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("absent.json");

        let loaded = Config::from_file(&config_path).await.unwrap();
        assert_eq!(loaded.post_success_clear_ms, 3000);
    }
}
