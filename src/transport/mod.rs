//! 传输层：单次逻辑调用的可插拔发送策略（网络 / 离线）。
//!
//! # Transport Module
//!
//! A [`Transport`] performs one logical call: it sends the request body to a
//! route and returns the decoded JSON or a classified [`Error`](crate::Error).
//! The network transport owns the retry loop because timeout and abort
//! plumbing is transport-specific; the offline transport never retries.
//!
//! | Transport | Retries | Needs credential |
//! |-----------|---------|------------------|
//! | [`HttpTransport`] | yes, per [`RetryPolicy`] | yes |
//! | [`OfflineTransport`] | no | no |

pub mod classify;
pub mod http;
pub mod offline;

pub use http::HttpTransport;
pub use offline::{LocalAnalyzer, OfflineTransport};

use crate::client::headers::HeaderSet;
use crate::client::policy::RetryPolicy;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Service route. Each maps to `POST {baseUrl}/{route}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Analyze,
    Revise,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Analyze => "analyze",
            Route::Revise => "revise",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Network,
    Offline,
}

/// Idempotency header resolved for one logical call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyHeader {
    pub name: String,
    pub value: String,
}

/// Everything a transport needs for one logical call.
///
/// Built fresh by the client for every call; the idempotency value is fixed
/// here so every attempt of the call reuses it.
pub struct SendContext {
    pub api_key: Option<String>,
    pub headers: HeaderSet,
    /// Per-attempt deadline.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub idempotency: Option<IdempotencyHeader>,
    /// External cancellation; the transport derives its own child controller from it.
    pub cancel: Option<CancellationToken>,
    pub correlation_id: String,
}

impl SendContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self {
            api_key: None,
            headers: HeaderSet::new(),
            timeout: Duration::from_millis(crate::client::DEFAULT_TIMEOUT_MS),
            retry: RetryPolicy::default(),
            idempotency: None,
            cancel: None,
            correlation_id: correlation_id.into(),
        }
    }
}

/// Successful transport result.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub body: serde_json::Value,
    /// Attempts made, including the successful one.
    pub attempts: u32,
    pub http_status: Option<u16>,
    pub upstream_request_id: Option<String>,
}

impl TransportResponse {
    pub fn local(body: serde_json::Value) -> Self {
        Self {
            body,
            attempts: 1,
            http_status: None,
            upstream_request_id: None,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Whether the client must resolve a credential before calling [`send`](Transport::send).
    fn requires_credential(&self) -> bool {
        true
    }

    async fn send(
        &self,
        route: Route,
        body: &serde_json::Value,
        ctx: &SendContext,
    ) -> Result<TransportResponse>;
}
