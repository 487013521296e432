//! # auditor-client
//!
//! 提示词审计服务的弹性客户端：网络/离线传输、带抖动的退避重试、封闭错误分类、幂等键与取消。
//!
//! Resilient client for the prompt analysis/revision service, shared by the
//! browser extension, the editor extension and the dashboard.
//!
//! ## Overview
//!
//! Call sites build one [`AuditClient`] per session and call
//! [`analyze`](AuditClient::analyze) / [`revise`](AuditClient::revise). The
//! client injects a correlation id and schema version, attaches credentials
//! and environment headers, and hands the call to a [`Transport`]. The network
//! transport retries transient failures with exponential backoff and jitter;
//! the offline transport answers from a local analyzer with no caller changes.
//!
//! ## Key Features
//!
//! - **Closed error taxonomy**: every failure is one [`Error`] variant; retry is a total match
//! - **Idempotency**: one key per logical call, stable across its retries
//! - **Cancellation**: [`CancelHandle`] aborts the in-flight attempt and pending backoff
//! - **Transport swap**: [`HttpTransport`] or [`OfflineTransport`] behind one trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use auditor_client::{AnalyzeRequest, AuditClientBuilder, CallOptions, EnvMeta, HostEnv};
//!
//! #[tokio::main]
//! async fn main() -> auditor_client::Result<()> {
//!     let client = AuditClientBuilder::new()
//!         .base_url("https://audit.example.com/v1")
//!         .api_key("your-api-key")
//!         .env_meta(EnvMeta::detect(HostEnv::Vscode, "1.4.0"))
//!         .idempotency(true)
//!         .build()?;
//!
//!     let resp = client
//!         .analyze(&AnalyzeRequest::new("Summarize this contract"), CallOptions::default())
//!         .await?;
//!     for f in &resp.findings {
//!         println!("{:?} {}", f.severity, f.message);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builder, retry policy, headers, credentials |
//! | [`transport`] | Network and offline transports |
//! | [`types`] | Request/response wire types and env metadata |
//! | [`analyzers`] | Built-in local analyzer for offline mode |
//! | [`config`] | Host settings and transport selection |
//! | [`host`] | Finding merge and UI severity helpers |

pub mod analyzers;
pub mod client;
pub mod config;
pub mod error_code;
pub mod host;
pub mod prelude;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use client::{
    AuditClient, AuditClientBuilder, CallOptions, CallStats, CancelHandle, CredentialProvider,
    Priority, RetryPolicy, RetryPolicyConfig,
};
pub use config::Settings;
pub use error_code::ErrorKind;
pub use transport::{HttpTransport, LocalAnalyzer, OfflineTransport, Transport, TransportKind};
pub use types::{
    AnalyzeRequest, AnalyzeResponse, EnvMeta, Finding, HostEnv, Lang, ReviseRequest,
    ReviseResponse, Severity,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
