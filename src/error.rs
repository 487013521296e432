//! 错误分类：客户端对外暴露的封闭错误类型。
//!
//! Closed error taxonomy for the auditor client.
//!
//! Every failure a [`Transport`](crate::transport::Transport) produces is mapped
//! into exactly one [`Error`] variant before the retry decision is made, so
//! retry policy is a total `match` rather than string sniffing.

use crate::error_code::ErrorKind;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Correlation id of the logical call that failed.
    pub correlation_id: Option<String>,
    /// Number of attempts made before the error surfaced.
    pub attempts: Option<u32>,
    /// Additional context about the error (e.g., header name, content type).
    pub details: Option<String>,
    /// Source of the error (e.g., "http_transport", "credential_provider").
    pub source: Option<String>,
    /// Set when a `Timeout` was caused by external cancellation rather than a deadline.
    pub cancelled: bool,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_cancelled(mut self, cancelled: bool) -> Self {
        self.cancelled = cancelled;
        self
    }
}

/// Classified failure of an `analyze`/`revise` call.
///
/// The set is closed: callers may match exhaustively.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Request timed out{}", format_context(.context))]
    Timeout { context: ErrorContext },

    #[error("Network error: {message}{}", format_context(.context))]
    Network {
        message: String,
        context: ErrorContext,
    },

    #[error("Unauthorized: {message}{}", format_context(.context))]
    Unauthorized {
        message: String,
        context: ErrorContext,
    },

    #[error("Rate limited{}{}", format_retry_after(.retry_after_sec), format_context(.context))]
    RateLimited {
        retry_after_sec: Option<u64>,
        context: ErrorContext,
    },

    #[error("Server error: HTTP {status}{}", format_context(.context))]
    ServerError {
        status: u16,
        body: Option<serde_json::Value>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
        context: ErrorContext,
    },
}

fn format_retry_after(secs: &Option<u64>) -> String {
    match secs {
        Some(s) => format!(" (retry after {}s)", s),
        None => String::new(),
    }
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref id) = ctx.correlation_id {
        parts.push(format!("correlation_id: {}", id));
    }
    if let Some(attempts) = ctx.attempts {
        parts.push(format!("attempts: {}", attempts));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if ctx.cancelled {
        parts.push("cancelled".to_string());
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn timeout() -> Self {
        Error::Timeout {
            context: ErrorContext::new(),
        }
    }

    /// Cancellation is reported as a `Timeout` with the `cancelled` flag set.
    pub fn cancelled() -> Self {
        Error::Timeout {
            context: ErrorContext::new().with_cancelled(true),
        }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Error::Network {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Error::Unauthorized {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn rate_limited(retry_after_sec: Option<u64>) -> Self {
        Error::RateLimited {
            retry_after_sec,
            context: ErrorContext::new(),
        }
    }

    pub fn server(status: u16, body: Option<serde_json::Value>) -> Self {
        Error::ServerError {
            status,
            body,
            context: ErrorContext::new(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation {
            message: msg.into(),
            details: None,
            context: ErrorContext::new(),
        }
    }

    /// Create a validation error carrying structured details.
    pub fn validation_with_details(msg: impl Into<String>, details: serde_json::Value) -> Self {
        Error::Validation {
            message: msg.into(),
            details: Some(details),
            context: ErrorContext::new(),
        }
    }

    /// The classification tag of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Network { .. } => ErrorKind::Network,
            Error::Unauthorized { .. } => ErrorKind::Unauthorized,
            Error::RateLimited { .. } => ErrorKind::RateLimited,
            Error::ServerError { .. } => ErrorKind::ServerError,
            Error::Validation { .. } => ErrorKind::Validation,
        }
    }

    /// HTTP status associated with the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ServerError { status, .. } => Some(*status),
            Error::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Whether this failure was caused by external cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Timeout { context } if context.cancelled)
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Error::Timeout { context }
            | Error::Network { context, .. }
            | Error::Unauthorized { context, .. }
            | Error::RateLimited { context, .. }
            | Error::ServerError { context, .. }
            | Error::Validation { context, .. } => context,
        }
    }

    pub fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Error::Timeout { context }
            | Error::Network { context, .. }
            | Error::Unauthorized { context, .. }
            | Error::RateLimited { context, .. }
            | Error::ServerError { context, .. }
            | Error::Validation { context, .. } => context,
        }
    }

    /// Replace the context, keeping the `cancelled` flag if it was already set.
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        let cancelled = self.context().cancelled;
        let ctx = self.context_mut();
        *ctx = context;
        ctx.cancelled |= cancelled;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.context_mut().source = Some(source.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.context_mut().details = Some(details.into());
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.context_mut().correlation_id = Some(id.into());
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.context_mut().attempts = Some(attempts);
        self
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::validation(e.to_string()).with_source("serde_json")
    }
}
