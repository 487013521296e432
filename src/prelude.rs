//! Minimal prelude for application code.
//!
//! Goal: reduce import noise without hiding important concepts.

pub use crate::client::{
    AuditClient, AuditClientBuilder, CallOptions, CallStats, CancelHandle, CredentialProvider,
    Priority, RetryPolicyConfig,
};
pub use crate::config::Settings;
pub use crate::host::{merge_findings, UiSeverity};
pub use crate::types::{AnalyzeRequest, AnalyzeResponse, EnvMeta, HostEnv, ReviseResponse};
pub use crate::{Error, ErrorKind, Result};
