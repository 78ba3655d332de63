//! Configuration management
//!
//! Settings live in `settings.json` inside the EduGate directory:
//! ```json
//! {
//!   "apiBaseUrl": "http://localhost:3000",
//!   "requestTimeoutSecs": 10,
//!   "reconcileAfterWrite": true,
//!   "coursesPerPage": 20
//! }
//! ```
//! Keys this crate does not manage are preserved on save.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::DEFAULT_COURSES_PER_PAGE;

/// Gateway host used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// Environment variable overriding the gateway base URL
pub const API_BASE_URL_ENV: &str = "EDUGATE_API_BASE_URL";

/// Environment variable overriding the request timeout
pub const REQUEST_TIMEOUT_ENV: &str = "EDUGATE_REQUEST_TIMEOUT_SECS";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reconcile_after_write: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    courses_per_page: Option<u32>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// EduGate client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Re-fetch seat info and enrollments after a successful enroll/unenroll
    pub reconcile_after_write: bool,
    pub courses_per_page: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            reconcile_after_write: true,
            courses_per_page: DEFAULT_COURSES_PER_PAGE,
        }
    }
}

impl Config {
    /// Load config from the EduGate directory
    ///
    /// A missing or unreadable settings file yields defaults. Environment
    /// variables win over the file:
    /// 1. `EDUGATE_API_BASE_URL`
    /// 2. `EDUGATE_REQUEST_TIMEOUT_SECS`
    pub fn load(edugate_dir: &Path) -> Result<Self> {
        let settings_path = edugate_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %settings_path.display(), error = %e, "ignoring malformed settings file");
                SettingsFile::default()
            })
        } else {
            SettingsFile::default()
        };

        let defaults = Self::default();
        let mut config = Self {
            api_base_url: raw
                .api_base_url
                .filter(|u| !u.trim().is_empty())
                .unwrap_or(defaults.api_base_url),
            request_timeout_secs: raw
                .request_timeout_secs
                .filter(|s| *s > 0)
                .unwrap_or(defaults.request_timeout_secs),
            reconcile_after_write: raw
                .reconcile_after_write
                .unwrap_or(defaults.reconcile_after_write),
            courses_per_page: raw
                .courses_per_page
                .filter(|n| *n > 0)
                .unwrap_or(defaults.courses_per_page),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
        if let Some(secs) = std::env::var(REQUEST_TIMEOUT_ENV)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|s| *s > 0)
        {
            self.request_timeout_secs = secs;
        }
    }

    /// Save config to the EduGate directory
    /// Preserves other settings that this crate doesn't manage
    pub fn save(&self, edugate_dir: &Path) -> Result<()> {
        let settings_path = edugate_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.api_base_url = Some(self.api_base_url.clone());
        settings.request_timeout_secs = Some(self.request_timeout_secs);
        settings.reconcile_after_write = Some(self.reconcile_after_write);
        settings.courses_per_page = Some(self.courses_per_page);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
