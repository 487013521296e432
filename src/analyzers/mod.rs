//! 本地分析器：离线传输使用的提示词审计启发式规则。
//!
//! # Analyzers Module
//!
//! [`PromptAuditAnalyzer`] is the built-in [`LocalAnalyzer`] behind the
//! offline transport. It runs a fixed chain of cheap detectors and never
//! revises text.
//!
//! | Detector | Selector | Finding ids |
//! |----------|----------|-------------|
//! | [`EmptyInputDetector`] | `self_check` | `empty` |
//! | [`LengthDetector`] | `length` | `length-1`, `length-2` |
//! | [`PiiDetector`] | `pii` | `pii-email`, `pii-phone` |
//!
//! When a request names `detectors`, only those run; order stays fixed.

pub mod detectors;

pub use detectors::{Detector, EmptyInputDetector, LengthDetector, PiiDetector};

use crate::transport::LocalAnalyzer;
use crate::types::{AnalyzeRequest, AnalyzeResponse, Limits};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct PromptAuditAnalyzer {
    detectors: Vec<Arc<dyn Detector>>,
    max_length: Option<u64>,
}

impl Default for PromptAuditAnalyzer {
    fn default() -> Self {
        Self {
            detectors: vec![
                Arc::new(EmptyInputDetector),
                Arc::new(LengthDetector),
                Arc::new(PiiDetector),
            ],
            max_length: None,
        }
    }
}

impl PromptAuditAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `limits.inputChars` in responses.
    pub fn with_max_length(mut self, max_length: u64) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Append a custom detector after the built-in ones.
    pub fn with_detector(mut self, detector: Arc<dyn Detector>) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn run(&self, req: &AnalyzeRequest) -> AnalyzeResponse {
        let started = Instant::now();
        let mut findings = Vec::new();
        for d in &self.detectors {
            let selected = req
                .detectors
                .as_ref()
                .map_or(true, |names| names.contains(d.name()));
            if selected {
                d.detect(&req.text, &mut findings);
            }
        }
        AnalyzeResponse {
            findings,
            suggestions: Some(Vec::new()),
            latency_ms: Some(started.elapsed().as_secs_f64() * 1000.0),
            limits: self.max_length.map(|n| Limits {
                input_chars: Some(n),
            }),
            ..Default::default()
        }
    }
}

#[async_trait]
impl LocalAnalyzer for PromptAuditAnalyzer {
    async fn analyze(&self, req: &AnalyzeRequest) -> anyhow::Result<AnalyzeResponse> {
        Ok(self.run(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(resp: &AnalyzeResponse) -> Vec<&str> {
        resp.findings.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn emission_order_is_fixed() {
        let text = format!("{} reach me at jo@example.org", "x".repeat(1200));
        let resp = PromptAuditAnalyzer::new().run(&AnalyzeRequest::new(text));
        assert_eq!(ids(&resp), vec!["length-1", "pii-email"]);
        assert_eq!(resp.suggestions, Some(vec![]));
    }

    #[test]
    fn empty_text() {
        let resp = PromptAuditAnalyzer::new().run(&AnalyzeRequest::new(""));
        assert_eq!(ids(&resp), vec!["empty"]);
    }

    #[test]
    fn detector_selection() {
        let text = format!("{} jo@example.org", "x".repeat(700));
        let req = AnalyzeRequest::new(text).with_detector("pii");
        let resp = PromptAuditAnalyzer::new().run(&req);
        assert_eq!(ids(&resp), vec!["pii-email"]);
    }

    #[test]
    fn limits_reported_when_configured() {
        let resp = PromptAuditAnalyzer::new()
            .with_max_length(2000)
            .run(&AnalyzeRequest::new("hi"));
        assert_eq!(resp.limits.and_then(|l| l.input_chars), Some(2000));
    }

    #[tokio::test]
    async fn revise_is_unsupported() {
        let a = PromptAuditAnalyzer::new();
        assert!(a.revise(&AnalyzeRequest::new("hi")).await.unwrap().is_none());
    }
}
