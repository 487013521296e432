use crate::analyzers::PromptAuditAnalyzer;
use crate::client::core::{AuditClient, IdempotencyConfig};
use crate::client::credentials::{CredentialProvider, StaticCredential};
use crate::client::headers::{build_headers, HeaderSet};
use crate::client::policy::{RetryPolicy, RetryPolicyConfig};
use crate::config::Settings;
use crate::transport::{HttpTransport, LocalAnalyzer, OfflineTransport, Transport, TransportKind};
use crate::types::EnvMeta;
use crate::utils::{IdGenerator, UuidIds};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

enum TransportChoice {
    Network,
    Offline(Option<Arc<dyn LocalAnalyzer>>),
    Custom(Arc<dyn Transport>),
}

/// Builder for [`AuditClient`].
///
/// Keep this surface area small and predictable: everything the client
/// needs is fixed here, once.
pub struct AuditClientBuilder {
    base_url: Option<String>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    transport: TransportChoice,
    timeout: Duration,
    retry: RetryPolicyConfig,
    headers: HeaderSet,
    env: Option<EnvMeta>,
    idempotency: IdempotencyConfig,
    ids: Arc<dyn IdGenerator>,
}

impl Default for AuditClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            credentials: None,
            transport: TransportChoice::Network,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retry: RetryPolicyConfig::default(),
            headers: HeaderSet::new(),
            env: None,
            idempotency: IdempotencyConfig::default(),
            ids: Arc::new(UuidIds),
        }
    }

    /// Service base URL; routes are appended as `/{route}`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Shorthand for a [`StaticCredential`].
    pub fn api_key(self, key: impl Into<String>) -> Self {
        self.credentials(Arc::new(StaticCredential::new(key)))
    }

    /// Use the network transport (default).
    pub fn network(mut self) -> Self {
        self.transport = TransportChoice::Network;
        self
    }

    /// Use the offline transport backed by `analyzer`.
    pub fn offline(mut self, analyzer: Arc<dyn LocalAnalyzer>) -> Self {
        self.transport = TransportChoice::Offline(Some(analyzer));
        self
    }

    /// Use the offline transport with the built-in [`PromptAuditAnalyzer`].
    pub fn offline_default(mut self) -> Self {
        self.transport = TransportChoice::Offline(None);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = TransportChoice::Custom(transport);
        self
    }

    /// Per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry(mut self, cfg: RetryPolicyConfig) -> Self {
        self.retry = cfg;
        self
    }

    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(mut self, headers: &HeaderSet) -> Self {
        self.headers = self.headers.merged(headers);
        self
    }

    pub fn env_meta(mut self, env: EnvMeta) -> Self {
        self.env = Some(env);
        self
    }

    pub fn idempotency(mut self, enabled: bool) -> Self {
        self.idempotency.enabled = enabled;
        self
    }

    /// Header carrying the idempotency key. Also enables idempotency.
    pub fn idempotency_header(mut self, name: impl Into<String>) -> Self {
        self.idempotency.enabled = true;
        self.idempotency.header_name = name.into();
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Seed the builder from host settings.
    ///
    /// Mock mode, an empty base URL or a missing API key select the offline
    /// transport with the built-in analyzer; otherwise the network transport.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut b = Self::new()
            .timeout(Duration::from_millis(settings.timeout_ms.max(1)))
            .retry(settings.retry.clone())
            .headers(&settings.headers.iter().collect::<HeaderSet>());
        b.idempotency = settings.idempotency.clone();
        if let Some(key) = settings.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            b = b.api_key(key);
        }
        match settings.transport_kind() {
            TransportKind::Offline => b.offline_default(),
            TransportKind::Network => b.base_url(settings.base_url.clone()).network(),
        }
    }

    pub fn build(self) -> Result<AuditClient> {
        let transport: Arc<dyn Transport> = match self.transport {
            TransportChoice::Network => {
                let raw = self.base_url.as_deref().unwrap_or_default().trim();
                let parsed = url::Url::parse(raw).map_err(|e| {
                    Error::validation(format!("invalid base URL {:?}: {}", raw, e))
                        .with_source("client_builder")
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(Error::validation(format!(
                        "base URL must be http(s), got {:?}",
                        parsed.scheme()
                    ))
                    .with_source("client_builder"));
                }
                Arc::new(HttpTransport::new(raw)?)
            }
            TransportChoice::Offline(analyzer) => {
                let analyzer = analyzer.unwrap_or_else(|| {
                    Arc::new(PromptAuditAnalyzer::default()) as Arc<dyn LocalAnalyzer>
                });
                Arc::new(OfflineTransport::new(analyzer))
            }
            TransportChoice::Custom(t) => t,
        };

        if self.idempotency.enabled && self.idempotency.header_name.trim().is_empty() {
            return Err(Error::validation("idempotency header name must not be empty")
                .with_source("client_builder"));
        }

        let base_headers = build_headers(&self.headers, self.env.as_ref());

        Ok(AuditClient {
            transport,
            credentials: self
                .credentials
                .unwrap_or_else(|| Arc::new(StaticCredential::none()) as Arc<dyn CredentialProvider>),
            base_headers: Arc::new(base_headers),
            timeout: self.timeout,
            retry: RetryPolicy::normalize(&self.retry),
            idempotency: self.idempotency,
            ids: self.ids,
            env: self.env,
        })
    }
}
