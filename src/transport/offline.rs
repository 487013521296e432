//! Offline transport: delegate to an in-process analyzer, no network.

use super::{Route, SendContext, Transport, TransportKind, TransportResponse};
use crate::types::{AnalyzeRequest, AnalyzeResponse, ReviseRequest, ReviseResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Local analysis engine used when the service is unreachable or not configured.
#[async_trait]
pub trait LocalAnalyzer: Send + Sync {
    async fn analyze(&self, req: &AnalyzeRequest) -> anyhow::Result<AnalyzeResponse>;

    /// `Ok(None)` means the analyzer cannot revise; the transport answers with
    /// an empty result instead.
    async fn revise(&self, _req: &ReviseRequest) -> anyhow::Result<Option<ReviseResponse>> {
        Ok(None)
    }
}

#[derive(Clone)]
pub struct OfflineTransport {
    analyzer: Arc<dyn LocalAnalyzer>,
}

impl OfflineTransport {
    pub fn new(analyzer: Arc<dyn LocalAnalyzer>) -> Self {
        Self { analyzer }
    }
}

fn classify_local(e: anyhow::Error) -> Error {
    match e.downcast::<Error>() {
        Ok(err) => err,
        Err(other) => Error::validation(other.to_string()).with_source("local_analyzer"),
    }
}

#[async_trait]
impl Transport for OfflineTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Offline
    }

    fn requires_credential(&self) -> bool {
        false
    }

    async fn send(
        &self,
        route: Route,
        body: &serde_json::Value,
        ctx: &SendContext,
    ) -> Result<TransportResponse> {
        if ctx.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(Error::cancelled()
                .with_source("offline_transport")
                .with_attempts(0)
                .with_correlation_id(ctx.correlation_id.clone()));
        }

        let req: AnalyzeRequest = serde_json::from_value(body.clone()).map_err(|e| {
            Error::validation(format!("malformed request body: {}", e))
                .with_source("offline_transport")
        })?;
        debug!(
            route = route.as_str(),
            correlation_id = ctx.correlation_id.as_str(),
            "running local analyzer"
        );

        let value = match route {
            Route::Analyze => {
                let resp = self.analyzer.analyze(&req).await.map_err(classify_local)?;
                serde_json::to_value(resp)?
            }
            Route::Revise => {
                let resp = self
                    .analyzer
                    .revise(&req)
                    .await
                    .map_err(classify_local)?
                    .unwrap_or_else(ReviseResponse::empty);
                serde_json::to_value(resp)?
            }
        };
        Ok(TransportResponse::local(value))
    }
}
