//! Local heuristic detectors: empty input, length and PII.

use crate::types::{Finding, Severity, TextRange};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9_.-]+@[A-Za-z0-9_.-]+\.[A-Za-z]{2,6}").expect("email pattern is valid")
});

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+[0-9]{1,3}[ -]?)?[0-9]{10,14}").expect("phone pattern is valid")
});

/// Samples quoted in a PII finding message.
const MAX_SAMPLES: usize = 3;

pub const LONG_TEXT_CHARS: usize = 500;
pub const VERY_LONG_TEXT_CHARS: usize = 1000;

/// A single local check. Findings are appended in emission order.
pub trait Detector: Send + Sync {
    /// Name used in `AnalyzeRequest::detectors` to select this detector.
    fn name(&self) -> &'static str;

    fn detect(&self, text: &str, out: &mut Vec<Finding>);
}

/// Flags empty input.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyInputDetector;

impl Detector for EmptyInputDetector {
    fn name(&self) -> &'static str {
        "self_check"
    }

    fn detect(&self, text: &str, out: &mut Vec<Finding>) {
        if text.is_empty() {
            out.push(Finding::new("empty", "self_check.empty", Severity::Low, "Empty input"));
        }
    }
}

/// Flags long prompts; only the strongest threshold fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthDetector;

impl Detector for LengthDetector {
    fn name(&self) -> &'static str {
        "length"
    }

    fn detect(&self, text: &str, out: &mut Vec<Finding>) {
        let chars = text.chars().count();
        if chars > VERY_LONG_TEXT_CHARS {
            out.push(Finding::new(
                "length-1",
                "length",
                Severity::Medium,
                format!("Text is very long (>{} chars)", VERY_LONG_TEXT_CHARS),
            ));
        } else if chars > LONG_TEXT_CHARS {
            out.push(Finding::new(
                "length-2",
                "length",
                Severity::Low,
                format!("Text is long (>{} chars)", LONG_TEXT_CHARS),
            ));
        }
    }
}

/// Flags email-like and phone-like patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct PiiDetector;

impl PiiDetector {
    fn finding(id: &str, rule: &str, label: &str, text: &str, re: &Regex) -> Option<Finding> {
        let matches: Vec<regex::Match<'_>> = re.find_iter(text).collect();
        let first = matches.first()?;
        let samples: Vec<&str> = matches.iter().take(MAX_SAMPLES).map(|m| m.as_str()).collect();
        let mut finding = Finding::new(
            id,
            rule,
            Severity::High,
            format!("Contains {}-like patterns: {}", label, samples.join(", ")),
        );
        if let Some(range) = char_range(text, first.start(), first.end()) {
            finding = finding.with_range(range);
        }
        Some(finding)
    }
}

impl Detector for PiiDetector {
    fn name(&self) -> &'static str {
        "pii"
    }

    fn detect(&self, text: &str, out: &mut Vec<Finding>) {
        out.extend(Self::finding("pii-email", "pii.email", "email", text, &EMAIL_PATTERN));
        out.extend(Self::finding("pii-phone", "pii.phone", "phone", text, &PHONE_PATTERN));
    }
}

/// Byte offsets of a match → character offsets.
fn char_range(text: &str, start: usize, end: usize) -> Option<TextRange> {
    let s = text.get(..start)?.chars().count() as u64;
    let len = text.get(start..end)?.chars().count() as u64;
    TextRange::new(s, s + len)
}
