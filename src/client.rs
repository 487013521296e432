//! Resilient client for the analysis/revision service.
//!
//! Keep the public surface small and predictable: build once with
//! [`AuditClientBuilder`], then call `analyze`/`revise` from any task.
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
pub mod credentials;
pub mod headers;
pub mod policy;
pub mod types;

pub use builder::{AuditClientBuilder, DEFAULT_TIMEOUT_MS};
pub use core::{AuditClient, IdempotencyConfig};
pub use credentials::{
    ChainCredential, CredentialProvider, EnvCredential, FnCredential, KeyringCredential,
    StaticCredential,
};
pub use headers::HeaderSet;
pub use policy::{Decision, RetryPolicy, RetryPolicyConfig};
pub use types::{CallOptions, CallStats, CancelHandle, Priority};
