//! 宿主设置：模式、服务地址、凭证与限制，决定使用网络还是离线传输。
//!
//! Host settings document (version 1).
//!
//! Settings arrive as YAML or JSON (YAML is a superset, so one parser covers
//! both). Invalid or unknown-version documents are rejected by
//! [`Settings::from_yaml_str`] and replaced by defaults in [`Settings::migrate`].
//!
//! Environment overrides, applied by [`Settings::apply_env_overrides`]:
//! - `AUDITOR_MODE` (`mock` | `remote`)
//! - `AUDITOR_BASE_URL`
//! - `AUDITOR_API_KEY`
//! - `AUDITOR_TIMEOUT_MS`
//! - `AUDITOR_MAX_ATTEMPTS`

use crate::client::policy::RetryPolicyConfig;
use crate::client::{IdempotencyConfig, DEFAULT_TIMEOUT_MS};
use crate::transport::TransportKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

pub const SETTINGS_VERSION: u32 = 1;
pub const DEFAULT_MAX_LENGTH: u64 = 2000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Mock,
    Remote,
}

/// UI-only keys stored by hosts (`flags`, `autoAnalyzeOnPaste`) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub version: u32,
    pub mode: Mode,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub max_length: u64,
    pub retry: RetryPolicyConfig,
    pub idempotency: IdempotencyConfig,
    pub headers: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            mode: Mode::Mock,
            base_url: String::new(),
            api_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_length: DEFAULT_MAX_LENGTH,
            retry: RetryPolicyConfig::default(),
            idempotency: IdempotencyConfig::default(),
            headers: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Parse and validate a settings document.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(raw).map_err(|e| {
            Error::validation(format!("invalid settings document: {}", e)).with_source("settings")
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::validation(format!("cannot read settings {}: {}", path.display(), e))
                .with_source("settings")
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Best-effort upgrade of a stored document; anything unusable yields defaults.
    pub fn migrate(value: serde_json::Value) -> Self {
        match serde_json::from_value::<Settings>(value) {
            Ok(s) => match s.validate() {
                Ok(()) => s,
                Err(e) => {
                    warn!(error = %e, "settings rejected, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "settings unreadable, using defaults");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != SETTINGS_VERSION {
            return Err(Error::validation(format!(
                "unsupported settings version {}",
                self.version
            ))
            .with_source("settings"));
        }
        if self.max_length == 0 {
            return Err(Error::validation("maxLength must be positive").with_source("settings"));
        }
        if !self.base_url.is_empty() {
            url::Url::parse(&self.base_url).map_err(|e| {
                Error::validation(format!("invalid baseUrl: {}", e)).with_source("settings")
            })?;
        }
        Ok(())
    }

    pub fn apply_env_overrides(self) -> Self {
        self.with_env_overrides_from(|k| std::env::var(k).ok())
    }

    /// Apply overrides from any key lookup (the process environment in production).
    pub fn with_env_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("AUDITOR_MODE") {
            match mode.trim().to_ascii_lowercase().as_str() {
                "mock" => self.mode = Mode::Mock,
                "remote" => self.mode = Mode::Remote,
                other => warn!(value = other, "ignoring unknown AUDITOR_MODE"),
            }
        }
        if let Some(url) = lookup("AUDITOR_BASE_URL") {
            self.base_url = url.trim().to_string();
        }
        if let Some(key) = lookup("AUDITOR_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(ms) = lookup("AUDITOR_TIMEOUT_MS").and_then(|s| s.trim().parse::<u64>().ok()) {
            self.timeout_ms = ms;
        }
        if let Some(n) = lookup("AUDITOR_MAX_ATTEMPTS").and_then(|s| s.trim().parse::<u32>().ok()) {
            self.retry.max_attempts = Some(n);
        }
        self
    }

    /// Offline in mock mode, or whenever the service is not fully configured.
    pub fn transport_kind(&self) -> TransportKind {
        let has_key = self
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if self.mode == Mode::Mock || self.base_url.trim().is_empty() || !has_key {
            TransportKind::Offline
        } else {
            TransportKind::Network
        }
    }

    /// Reject text longer than `max_length` characters.
    pub fn check_length(&self, text: &str) -> Result<()> {
        let chars = text.chars().count() as u64;
        if chars > self.max_length {
            return Err(Error::validation_with_details(
                "text exceeds maxLength",
                serde_json::json!({ "maxLength": self.max_length, "length": chars }),
            )
            .with_source("settings"));
        }
        Ok(())
    }
}
