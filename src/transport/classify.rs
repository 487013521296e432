//! Raw HTTP outcome → classified [`Error`].
//!
//! Only 5xx and 429 are retried downstream; everything else that is not 2xx
//! is still a `ServerError`, just a fatal one.

use super::TransportResponse;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;

const SOURCE: &str = "http_transport";

const UPSTREAM_ID_HEADERS: &[&str] = &["x-request-id", "request-id", "x-trace-id", "cf-ray"];

/// Extract the first non-empty header value from a list of header names.
pub(crate) fn header_first(headers: &HeaderMap, names: &[&str]) -> Option<String> {
    for name in names {
        if let Some(v) = headers.get(*name) {
            if let Ok(s) = v.to_str() {
                let s = s.trim();
                if !s.is_empty() {
                    return Some(s.to_string());
                }
            }
        }
    }
    None
}

/// Parse a `Retry-After` value into whole seconds.
///
/// Accepts delta-seconds or an HTTP date (dates in the past yield 0).
/// Anything else is treated as "no hint".
pub fn parse_retry_after(raw: &str, now: DateTime<Utc>) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(secs);
    }
    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    let ms = (at - now).num_milliseconds();
    if ms <= 0 {
        Some(0)
    } else {
        Some(((ms + 999) / 1000) as u64)
    }
}

/// Map a reqwest failure (no usable response) to a classification.
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::timeout().with_details(e.to_string()).with_source(SOURCE)
    } else if e.is_builder() {
        Error::validation(format!("invalid request: {}", e)).with_source(SOURCE)
    } else {
        Error::network(e.to_string()).with_source(SOURCE)
    }
}

fn decode_error_body(bytes: &[u8]) -> Option<serde_json::Value> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(v) => Some(v),
        Err(_) => Some(serde_json::Value::String(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
    }
}

/// Classify a response; 2xx JSON bodies are decoded, everything else becomes an `Error`.
pub(crate) async fn read_response(resp: reqwest::Response) -> Result<TransportResponse> {
    let status = resp.status();
    let headers = resp.headers().clone();
    let upstream_request_id = header_first(&headers, UPSTREAM_ID_HEADERS);

    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::unauthorized("HTTP 401").with_source(SOURCE));
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = header_first(&headers, &["retry-after"])
            .and_then(|raw| parse_retry_after(&raw, Utc::now()));
        return Err(Error::rate_limited(retry_after).with_source(SOURCE));
    }

    if !status.is_success() {
        // A body that fails to arrive does not change the classification.
        let body = match resp.bytes().await {
            Ok(b) => decode_error_body(&b),
            Err(_) => None,
        };
        let mut err = Error::server(status.as_u16(), body).with_source(SOURCE);
        if let Some(id) = upstream_request_id {
            err = err.with_details(format!("upstream_id: {}", id));
        }
        return Err(err);
    }

    let content_type = header_first(&headers, &[CONTENT_TYPE.as_str()]).unwrap_or_default();
    if !content_type.to_ascii_lowercase().contains("application/json") {
        return Err(Error::validation_with_details(
            "Unexpected content-type",
            serde_json::json!({ "contentType": content_type, "status": status.as_u16() }),
        )
        .with_source(SOURCE));
    }

    let bytes = resp.bytes().await.map_err(from_reqwest)?;
    let body: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
        Error::validation(format!("Response body is not valid JSON: {}", e)).with_source(SOURCE)
    })?;

    Ok(TransportResponse {
        body,
        attempts: 1,
        http_status: Some(status.as_u16()),
        upstream_request_id,
    })
}
