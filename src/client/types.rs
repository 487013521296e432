use crate::client::headers::HeaderSet;
use crate::transport::{Route, TransportKind};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Cooperative cancellation for one or more in-flight calls.
///
/// Cancelling aborts the current attempt and any pending backoff sleep; the
/// call then fails with a `Timeout` whose context is marked `cancelled`.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Request priority hint, forwarded as `X-Priority` when not `Normal`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

/// Per-call options. All fields are optional; `CallOptions::default()` is a plain call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub cancel: Option<CancelHandle>,
    /// Overrides the client's per-attempt timeout.
    pub timeout: Option<Duration>,
    /// Merged over the client's base headers; these win.
    pub headers: HeaderSet,
    /// Caller-chosen idempotency key; generated when absent and idempotency is enabled.
    pub idempotency_key: Option<String>,
    pub priority: Priority,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, handle: &CancelHandle) -> Self {
        self.cancel = Some(handle.clone());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Per-call observability snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CallStats {
    pub route: Route,
    pub transport: TransportKind,
    pub attempts: u32,
    pub duration_ms: u128,
    pub correlation_id: String,
    pub idempotency_key: Option<String>,
    pub http_status: Option<u16>,
    pub upstream_request_id: Option<String>,
}
