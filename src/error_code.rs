//! 错误标签：封闭错误分类的稳定标识符与重试语义。
//!
//! Stable tags for the closed error taxonomy.
//!
//! | Tag | Code | Retryable |
//! |-----|------|-----------|
//! | `timeout` | A1001 | yes |
//! | `network` | A1002 | yes |
//! | `rate_limited` | A2001 | yes |
//! | `server_error` | A3001 | 5xx only |
//! | `unauthorized` | A4001 | no |
//! | `validation` | A4002 | no |
//!
//! ```rust
//! use auditor_client::error_code::ErrorKind;
//!
//! let kind = ErrorKind::from_name("rate_limited").unwrap();
//! assert_eq!(kind.code(), "A2001");
//! assert!(kind.transient());
//! ```

use std::fmt;

/// Classification tag of an [`Error`](crate::Error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Per-attempt deadline elapsed, or the call was cancelled
    Timeout,
    /// Connection could not be established or was interrupted
    Network,
    /// Missing credential or HTTP 401
    Unauthorized,
    /// HTTP 429
    RateLimited,
    /// Non-2xx response other than 401/429
    ServerError,
    /// Protocol mismatch or malformed request/response
    Validation,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 6] = [
        Self::Timeout,
        Self::Network,
        Self::Unauthorized,
        Self::RateLimited,
        Self::ServerError,
        Self::Validation,
    ];

    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout => "A1001",
            Self::Network => "A1002",
            Self::RateLimited => "A2001",
            Self::ServerError => "A3001",
            Self::Unauthorized => "A4001",
            Self::Validation => "A4002",
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::Validation => "validation",
        }
    }

    /// Whether failures of this kind may be transient.
    ///
    /// `ServerError` is transient here, but only 5xx statuses are retried;
    /// see [`is_retryable`](crate::client::policy::is_retryable).
    #[inline]
    pub fn transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Network | Self::RateLimited | Self::ServerError
        )
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}
