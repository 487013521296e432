//! Credential sources for the `Authorization: Bearer` header.
//!
//! A provider resolving to `None` (or a blank string) makes network calls
//! fail fast with `Unauthorized` before any request is sent.

use async_trait::async_trait;
use keyring::Entry;
use std::sync::Arc;
use tracing::debug;

/// Resolves the API key for a call. Called once per logical call, not per attempt.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn api_key(&self) -> Option<String>;
}

/// Fixed key, typically loaded from settings.
#[derive(Clone, Default)]
pub struct StaticCredential {
    key: Option<String>,
}

impl StaticCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }

    pub fn none() -> Self {
        Self { key: None }
    }
}

impl std::fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredential")
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn api_key(&self) -> Option<String> {
        self.key.clone()
    }
}

/// Reads the key from an environment variable at call time.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub const DEFAULT_VAR: &'static str = "AUDITOR_API_KEY";

    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

#[async_trait]
impl CredentialProvider for EnvCredential {
    async fn api_key(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

/// Reads the key from the OS keychain (`service`/`user` entry).
#[derive(Debug, Clone)]
pub struct KeyringCredential {
    service: String,
    user: String,
}

impl KeyringCredential {
    pub fn new(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: user.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for KeyringCredential {
    async fn api_key(&self) -> Option<String> {
        let entry = match Entry::new(&self.service, &self.user) {
            Ok(e) => e,
            Err(e) => {
                debug!(service = self.service.as_str(), error = %e, "keyring entry unavailable");
                return None;
            }
        };
        match entry.get_password() {
            Ok(key) => Some(key),
            Err(e) => {
                debug!(service = self.service.as_str(), error = %e, "keyring lookup failed");
                None
            }
        }
    }
}

/// Wraps a synchronous closure, e.g. a host's settings getter.
pub struct FnCredential<F>(F);

impl<F> FnCredential<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> CredentialProvider for FnCredential<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    async fn api_key(&self) -> Option<String> {
        (self.0)()
    }
}

/// Tries each provider in order and returns the first non-blank key.
#[derive(Clone, Default)]
pub struct ChainCredential {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl ChainCredential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Keychain entry first, then the environment variable.
    pub fn keyring_then_env(service: &str, user: &str, var: &str) -> Self {
        Self::new()
            .with(Arc::new(KeyringCredential::new(service, user)))
            .with(Arc::new(EnvCredential::new(var)))
    }
}

#[async_trait]
impl CredentialProvider for ChainCredential {
    async fn api_key(&self) -> Option<String> {
        for p in &self.providers {
            if let Some(key) = p.api_key().await.filter(|k| !k.trim().is_empty()) {
                return Some(key);
            }
        }
        None
    }
}
