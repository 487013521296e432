//! Helpers for host surfaces (extensions, dashboard) that render findings.

use crate::types::{Finding, Severity, TextRange};
use serde::{Deserialize, Serialize};

/// Local findings first, then remote; no deduplication.
pub fn merge_findings(local: Vec<Finding>, remote: Vec<Finding>) -> Vec<Finding> {
    let mut out = local;
    out.extend(remote);
    out
}

/// Severity vocabulary used by UI surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiSeverity {
    Info,
    Warn,
    Error,
}

impl From<Severity> for UiSeverity {
    fn from(s: Severity) -> Self {
        match s {
            Severity::High => UiSeverity::Error,
            Severity::Medium => UiSeverity::Warn,
            Severity::Low => UiSeverity::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiFinding {
    pub id: String,
    pub severity: UiSeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<TextRange>,
}

impl From<&Finding> for UiFinding {
    fn from(f: &Finding) -> Self {
        Self {
            id: f.id.clone(),
            severity: f.severity.into(),
            message: f.message.clone(),
            range: f.range,
        }
    }
}

pub fn to_ui_findings(findings: &[Finding]) -> Vec<UiFinding> {
    findings.iter().map(UiFinding::from).collect()
}

/// Per-severity counts for badges and summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
}

impl RiskSummary {
    pub fn of(findings: &[Finding]) -> Self {
        findings.iter().fold(Self::default(), |mut acc, f| {
            match f.severity {
                Severity::High => acc.high_risk += 1,
                Severity::Medium => acc.medium_risk += 1,
                Severity::Low => acc.low_risk += 1,
            }
            acc
        })
    }

    pub fn has_high_risk(&self) -> bool {
        self.high_risk > 0
    }
}
