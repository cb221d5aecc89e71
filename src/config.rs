//! Configuration handling for the TUI

use crate::api::ApiConfig;
use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const API_URL_ENV: &str = "PATIENT_TUI_API_URL";
pub const FALLBACK_URL_ENV: &str = "PATIENT_TUI_FALLBACK_URL";
pub const CLINICIAN_ID_ENV: &str = "PATIENT_TUI_CLINICIAN_ID";

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_FALLBACK_URL: &str = "http://localhost:8081/api";

/// User configuration for the TUI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Primary REST API base URL
    pub api_base_url: String,
    /// Base URL queried when the primary source fails for templates and structures
    pub fallback_api_base_url: String,
    /// Clinician the session submits forms as
    pub clinician_id: Option<String>,
    /// HTTP request timeout; the client default applies when unset
    pub request_timeout_secs: Option<u64>,
    /// Delay before a doctor-name lookup is sent
    pub doctor_debounce_ms: u64,
    /// Maximum number of cached doctor names
    pub doctor_cache_capacity: usize,
    /// Delay between a successful submission and clearing the form
    pub submit_clear_delay_ms: u64,
    /// Largest file accepted for upload, checked before sending
    pub max_upload_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            fallback_api_base_url: DEFAULT_FALLBACK_URL.to_string(),
            clinician_id: None,
            request_timeout_secs: None,
            doctor_debounce_ms: 300,
            doctor_cache_capacity: 512,
            submit_clear_delay_ms: 1500,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("org", "clinic", "patient-tui")
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Directory holding the log file
    pub fn data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Load configuration from file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                let config: AppConfig = serde_json::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = lookup(API_URL_ENV) {
            self.api_base_url = url;
        }
        if let Some(url) = lookup(FALLBACK_URL_ENV) {
            self.fallback_api_base_url = url;
        }
        if let Some(id) = lookup(CLINICIAN_ID_ENV) {
            self.clinician_id = Some(id);
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_base_url.clone(),
            fallback_base_url: self.fallback_api_base_url.clone(),
            timeout_secs: self.request_timeout_secs,
        }
    }

    pub fn doctor_debounce(&self) -> Duration {
        Duration::from_millis(self.doctor_debounce_ms)
    }

    pub fn submit_clear_delay(&self) -> Duration {
        Duration::from_millis(self.submit_clear_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert!(config.clinician_id.is_none());
        assert!(config.request_timeout_secs.is_none());
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_deserialize_from_empty_json() {
        let parsed: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, AppConfig::default());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{"api_base_url": "https://dossier.example/api", "doctor_debounce_ms": 50}"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.api_base_url, "https://dossier.example/api");
        assert_eq!(parsed.doctor_debounce(), Duration::from_millis(50));
        assert_eq!(parsed.fallback_api_base_url, DEFAULT_FALLBACK_URL);
    }

    #[test]
    fn test_deserialize_with_extra_fields() {
        // Unknown fields are ignored
        let json = r#"{"clinician_id": "c1", "theme": "dark"}"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.clinician_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (API_URL_ENV, "http://primary"),
            (CLINICIAN_ID_ENV, "c9"),
            (FALLBACK_URL_ENV, "  "),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_base_url, "http://primary");
        assert_eq!(config.clinician_id.as_deref(), Some("c9"));
        assert_eq!(config.fallback_api_base_url, DEFAULT_FALLBACK_URL);
    }

    #[test]
    fn test_api_config_carries_timeout() {
        let config = AppConfig {
            request_timeout_secs: Some(12),
            ..Default::default()
        };
        let api = config.api_config();
        assert_eq!(api.timeout_secs, Some(12));
        assert_eq!(api.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_load_does_not_panic() {
        // Fails only when a malformed config file exists on this machine
        let _ = AppConfig::load();
        let _path = AppConfig::config_path();
    }
}
