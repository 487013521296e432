use crate::client::credentials::CredentialProvider;
use crate::client::headers::{HeaderSet, DEFAULT_IDEMPOTENCY_HEADER, HEADER_PRIORITY};
use crate::client::policy::RetryPolicy;
use crate::client::types::{CallOptions, CallStats, Priority};
use crate::transport::{IdempotencyHeader, Route, SendContext, Transport, TransportKind};
use crate::types::{AnalyzeRequest, AnalyzeResponse, EnvMeta, ReviseRequest, ReviseResponse};
use crate::utils::IdGenerator;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, Instrument};

/// Idempotency settings. Disabled by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdempotencyConfig {
    pub enabled: bool,
    pub header_name: String,
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            header_name: DEFAULT_IDEMPOTENCY_HEADER.to_string(),
        }
    }
}

/// Resilient analysis/revision client.
///
/// Immutable after construction and cheap to clone; concurrent calls share
/// nothing but the transport's connection pool.
#[derive(Clone)]
pub struct AuditClient {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) credentials: Arc<dyn CredentialProvider>,
    pub(crate) base_headers: Arc<HeaderSet>,
    pub(crate) timeout: Duration,
    pub(crate) retry: RetryPolicy,
    pub(crate) idempotency: IdempotencyConfig,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) env: Option<EnvMeta>,
}

impl std::fmt::Debug for AuditClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditClient")
            .field("transport", &self.transport.kind())
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("idempotency", &self.idempotency)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

impl AuditClient {
    pub fn builder() -> crate::client::AuditClientBuilder {
        crate::client::AuditClientBuilder::new()
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Headers sent with every call (static headers plus env metadata).
    pub fn base_headers(&self) -> &HeaderSet {
        &self.base_headers
    }

    pub fn env_meta(&self) -> Option<&EnvMeta> {
        self.env.as_ref()
    }

    pub async fn analyze(&self, req: &AnalyzeRequest, opts: CallOptions) -> Result<AnalyzeResponse> {
        self.analyze_with_stats(req, opts).await.map(|(r, _)| r)
    }

    pub async fn revise(&self, req: &ReviseRequest, opts: CallOptions) -> Result<ReviseResponse> {
        self.revise_with_stats(req, opts).await.map(|(r, _)| r)
    }

    pub async fn analyze_with_stats(
        &self,
        req: &AnalyzeRequest,
        opts: CallOptions,
    ) -> Result<(AnalyzeResponse, CallStats)> {
        self.call(Route::Analyze, req, opts).await
    }

    pub async fn revise_with_stats(
        &self,
        req: &ReviseRequest,
        opts: CallOptions,
    ) -> Result<(ReviseResponse, CallStats)> {
        self.call(Route::Revise, req, opts).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        route: Route,
        req: &AnalyzeRequest,
        opts: CallOptions,
    ) -> Result<(T, CallStats)> {
        let correlation_id = req
            .correlation_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.ids.next_id());
        let span = tracing::info_span!(
            "auditor.call",
            route = route.as_str(),
            correlation_id = correlation_id.as_str(),
            transport = ?self.transport.kind(),
        );
        self.call_inner(route, req, opts, correlation_id)
            .instrument(span)
            .await
    }

    async fn call_inner<T: DeserializeOwned>(
        &self,
        route: Route,
        req: &AnalyzeRequest,
        opts: CallOptions,
        correlation_id: String,
    ) -> Result<(T, CallStats)> {
        let start = Instant::now();

        let api_key = if self.transport.requires_credential() {
            match self.credentials.api_key().await {
                Some(k) if !k.trim().is_empty() => Some(k),
                _ => {
                    debug!("no credential resolved; failing before any attempt");
                    return Err(Error::unauthorized("no API key available")
                        .with_source("credential_provider")
                        .with_correlation_id(correlation_id)
                        .with_attempts(0));
                }
            }
        } else {
            None
        };

        let body = req
            .to_wire_body(&correlation_id)
            .map_err(|e| e.with_correlation_id(correlation_id.clone()))?;

        let mut headers = self.base_headers.merged(&opts.headers);
        if opts.priority != Priority::Normal {
            headers.insert(HEADER_PRIORITY, opts.priority.as_str());
        }

        let idempotency = if self.idempotency.enabled {
            Some(IdempotencyHeader {
                name: self.idempotency.header_name.clone(),
                value: opts
                    .idempotency_key
                    .clone()
                    .filter(|k| !k.is_empty())
                    .unwrap_or_else(|| self.ids.next_id()),
            })
        } else {
            None
        };
        let idempotency_key = idempotency.as_ref().map(|h| h.value.clone());

        let ctx = SendContext {
            api_key,
            headers,
            timeout: opts.timeout.unwrap_or(self.timeout),
            retry: self.retry,
            idempotency,
            cancel: opts.cancel.as_ref().map(|c| c.token()),
            correlation_id: correlation_id.clone(),
        };

        let resp = self.transport.send(route, &body, &ctx).await?;

        let decoded: T = serde_json::from_value(resp.body).map_err(|e| {
            Error::validation(format!("response does not match the {} contract: {}", route.as_str(), e))
                .with_source("response_decoder")
                .with_correlation_id(correlation_id.clone())
                .with_attempts(resp.attempts)
        })?;

        let stats = CallStats {
            route,
            transport: self.transport.kind(),
            attempts: resp.attempts,
            duration_ms: start.elapsed().as_millis(),
            correlation_id,
            idempotency_key,
            http_status: resp.http_status,
            upstream_request_id: resp.upstream_request_id,
        };
        info!(
            attempts = stats.attempts,
            duration_ms = stats.duration_ms as u64,
            http_status = stats.http_status.unwrap_or_default(),
            "call completed"
        );
        Ok((decoded, stats))
    }
}
