use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Schema version injected into every request body.
pub const SCHEMA_VERSION: u32 = 1;

/// Language hint for the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Ru,
    En,
}

/// Request for `POST /analyze`.
///
/// `correlation_id` is optional here; the client assigns one per logical call
/// when the caller leaves it empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<Lang>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detectors: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Request for `POST /revise`. Same shape as an analyze request.
pub type ReviseRequest = AnalyzeRequest;

impl AnalyzeRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_lang(mut self, lang: Lang) -> Self {
        self.lang = Some(lang);
        self
    }

    /// Add a detector name to the requested set.
    pub fn with_detector(mut self, detector: impl Into<String>) -> Self {
        self.detectors
            .get_or_insert_with(BTreeSet::new)
            .insert(detector.into());
        self
    }

    pub fn with_flag(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.flags
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Caller-side precondition check: text must be non-empty.
    ///
    /// The client itself does not enforce this; hosts call it before dispatch.
    pub fn validate(&self) -> crate::Result<()> {
        if self.text.is_empty() {
            return Err(crate::Error::validation("text must not be empty")
                .with_source("request_validator"));
        }
        Ok(())
    }

    /// Serialize into the wire body: the request plus `correlationId` and `schemaVersion`.
    pub(crate) fn to_wire_body(&self, correlation_id: &str) -> crate::Result<serde_json::Value> {
        let mut body = serde_json::to_value(self)?;
        if let serde_json::Value::Object(map) = &mut body {
            map.insert(
                "correlationId".to_string(),
                serde_json::Value::String(correlation_id.to_string()),
            );
            map.insert("schemaVersion".to_string(), SCHEMA_VERSION.into());
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_camel_case_and_skips_empty() {
        let req = AnalyzeRequest::new("hello")
            .with_lang(Lang::Ru)
            .with_correlation_id("abc");
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, json!({"text": "hello", "lang": "ru", "correlationId": "abc"}));
    }

    #[test]
    fn wire_body_injects_ids() {
        let req = AnalyzeRequest::new("hello").with_detector("pii");
        let body = req.to_wire_body("c-42").unwrap();
        assert_eq!(body["correlationId"], "c-42");
        assert_eq!(body["schemaVersion"], 1);
        assert_eq!(body["detectors"], json!(["pii"]));
        // The caller's request is untouched.
        assert!(req.correlation_id.is_none());
    }

    #[test]
    fn validate_rejects_empty_text() {
        assert!(AnalyzeRequest::new("").validate().is_err());
        assert!(AnalyzeRequest::new("x").validate().is_ok());
    }

    #[test]
    fn detectors_are_a_set() {
        let req = AnalyzeRequest::new("x")
            .with_detector("pii")
            .with_detector("length")
            .with_detector("pii");
        assert_eq!(req.detectors.as_ref().map(|d| d.len()), Some(2));
    }
}
