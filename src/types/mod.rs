//! 类型系统模块：分析/修订请求与响应的线上契约。
//!
//! # Types Module
//!
//! Wire contract types for the analysis service. All types serialize in
//! camelCase to match the JSON the service and the extensions exchange.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`request`] | `AnalyzeRequest` / `ReviseRequest` |
//! | [`response`] | Findings, suggestions and responses |
//! | [`env`] | Host environment metadata attached as headers |
//!
//! ## Example
//!
//! ```rust
//! use auditor_client::types::{AnalyzeRequest, Lang};
//!
//! let req = AnalyzeRequest::new("Summarize this contract")
//!     .with_lang(Lang::En)
//!     .with_detector("pii");
//! assert!(req.correlation_id.is_none());
//! ```

pub mod env;
pub mod request;
pub mod response;

pub use env::{EnvMeta, HostEnv};
pub use request::{AnalyzeRequest, Lang, ReviseRequest, SCHEMA_VERSION};
pub use response::{
    AnalyzeResponse, Cost, Finding, Limits, ReviseResponse, Severity, Suggestion, TextRange,
};
