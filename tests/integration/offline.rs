//! Offline transport through the public client API.

use async_trait::async_trait;
use auditor_client::config::Mode;
use auditor_client::prelude::*;
use auditor_client::{LocalAnalyzer, ReviseRequest, Severity, TransportKind};
use std::sync::Arc;

#[tokio::test]
async fn test_offline_analyze_uses_local_heuristics() {
    let client = AuditClientBuilder::new().offline_default().build().unwrap();
    let (resp, stats) = client
        .analyze_with_stats(
            &AnalyzeRequest::new("ping me: jane.doe@example.com"),
            CallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(stats.transport, TransportKind::Offline);
    assert_eq!(stats.attempts, 1);
    assert_eq!(resp.findings.len(), 1);
    assert_eq!(resp.findings[0].id, "pii-email");
    assert_eq!(resp.findings[0].severity, Severity::High);
}

#[tokio::test]
async fn test_offline_revise_falls_back_to_empty() {
    let client = AuditClientBuilder::new().offline_default().build().unwrap();
    let resp = client
        .revise(&AnalyzeRequest::new("anything"), CallOptions::default())
        .await
        .unwrap();
    assert!(resp.analysis.findings.is_empty());
    assert_eq!(resp.analysis.suggestions, Some(vec![]));
    assert_eq!(resp.revised_text, None);
}

struct UpperCaser;

#[async_trait]
impl LocalAnalyzer for UpperCaser {
    async fn analyze(&self, _req: &AnalyzeRequest) -> anyhow::Result<AnalyzeResponse> {
        Ok(AnalyzeResponse::default())
    }

    async fn revise(&self, req: &ReviseRequest) -> anyhow::Result<Option<ReviseResponse>> {
        Ok(Some(ReviseResponse {
            revised_text: Some(req.text.to_uppercase()),
            ..Default::default()
        }))
    }
}

#[tokio::test]
async fn test_custom_analyzer_revises() {
    let client = AuditClientBuilder::new()
        .offline(Arc::new(UpperCaser))
        .build()
        .unwrap();
    let resp = client
        .revise(&AnalyzeRequest::new("quiet"), CallOptions::default())
        .await
        .unwrap();
    assert_eq!(resp.revised_text.as_deref(), Some("QUIET"));
}

#[tokio::test]
async fn test_settings_without_key_run_offline() {
    let settings = Settings {
        mode: Mode::Remote,
        base_url: "https://audit.example.com".into(),
        api_key: None,
        ..Default::default()
    };
    let client = AuditClientBuilder::from_settings(&settings).build().unwrap();
    assert_eq!(client.transport_kind(), TransportKind::Offline);

    let resp = client
        .analyze(&AnalyzeRequest::new(""), CallOptions::default())
        .await
        .unwrap();
    assert_eq!(resp.findings[0].id, "empty");
}

#[tokio::test]
async fn test_offline_honours_prior_cancellation() {
    let client = AuditClientBuilder::new().offline_default().build().unwrap();
    let cancel = CancelHandle::new();
    cancel.cancel();
    let err = client
        .analyze(&AnalyzeRequest::new("x"), CallOptions::new().with_cancel(&cancel))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_local_and_remote_merge_for_display() {
    let client = AuditClientBuilder::new().offline_default().build().unwrap();
    let local = client
        .analyze(&AnalyzeRequest::new(""), CallOptions::default())
        .await
        .unwrap()
        .findings;
    let remote = client
        .analyze(&AnalyzeRequest::new("call +7 9161234567"), CallOptions::default())
        .await
        .unwrap()
        .findings;

    let merged = merge_findings(local, remote);
    let ids: Vec<_> = merged.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["empty", "pii-phone"]);
    assert_eq!(UiSeverity::from(merged[1].severity), UiSeverity::Error);
}
