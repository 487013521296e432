//! Network transport against a mock server: classification, retry, idempotency, cancellation.

use crate::integration::mock_server::{
    fast_builder, hanging_server, refused_url, MockServerFixture, EMPTY_ANALYSIS,
};
use auditor_client::prelude::*;
use auditor_client::{EnvMeta, HostEnv, RetryPolicyConfig, TransportKind};
use mockito::Matcher;
use std::time::{Duration, Instant};

fn req() -> AnalyzeRequest {
    AnalyzeRequest::new("Summarize this contract")
}

#[tokio::test]
async fn test_retry_on_transient_error() {
    let fixture = MockServerFixture::new().await;
    let fail = fixture
        .mock_json("/analyze", 500, r#"{"error":"boom"}"#, 1)
        .await;
    let ok = fixture
        .mock_json(
            "/analyze",
            200,
            r#"{"findings":[{"id":"f1","rule":"r","severity":"high","message":"m"}]}"#,
            1,
        )
        .await;

    let (resp, stats) = fixture
        .client()
        .analyze_with_stats(&req(), CallOptions::default())
        .await
        .expect("second attempt succeeds");

    fail.assert_async().await;
    ok.assert_async().await;
    assert_eq!(stats.attempts, 2);
    assert_eq!(stats.http_status, Some(200));
    assert_eq!(stats.transport, TransportKind::Network);
    assert_eq!(resp.findings[0].id, "f1");
}

#[tokio::test]
async fn test_server_errors_exhaust_attempts() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json("/analyze", 503, r#"{"error":"overloaded"}"#, 3)
        .await;

    let err = fixture
        .client()
        .analyze(&req(), CallOptions::default())
        .await
        .unwrap_err();

    mock.assert_async().await;
    match &err {
        Error::ServerError { status, body, .. } => {
            assert_eq!(*status, 503);
            assert_eq!(body.as_ref().unwrap()["error"], "overloaded");
        }
        other => panic!("expected ServerError, got {other:?}"),
    }
    assert_eq!(err.context().attempts, Some(3));
    assert_eq!(err.context().correlation_id.as_deref(), Some("id-1"));
}

#[tokio::test]
async fn test_rate_limit_surfaces_retry_after() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_rate_limited("/analyze", "2", 1).await;

    let client = fixture
        .builder()
        .retry(RetryPolicyConfig::default().max_attempts(1))
        .build()
        .unwrap();
    let err = client.analyze(&req(), CallOptions::default()).await.unwrap_err();

    mock.assert_async().await;
    match err {
        Error::RateLimited {
            retry_after_sec, ..
        } => assert_eq!(retry_after_sec, Some(2)),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_hint_drives_retry() {
    let fixture = MockServerFixture::new().await;
    let limited = fixture.mock_rate_limited("/analyze", "0", 1).await;
    let ok = fixture.mock_json("/analyze", 200, EMPTY_ANALYSIS, 1).await;

    let (_, stats) = fixture
        .client()
        .analyze_with_stats(&req(), CallOptions::default())
        .await
        .unwrap();

    limited.assert_async().await;
    ok.assert_async().await;
    assert_eq!(stats.attempts, 2);
}

#[tokio::test]
async fn test_unauthorized_is_never_retried() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_status("/analyze", 401, 1).await;

    let client = fixture
        .builder()
        .retry(RetryPolicyConfig::default().max_attempts(5).base_delay_ms(1))
        .build()
        .unwrap();
    let err = client.analyze(&req(), CallOptions::default()).await.unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.context().attempts, Some(1));
}

#[tokio::test]
async fn test_client_error_status_is_fatal_server_error() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json("/analyze", 404, r#"{"error":"no such route"}"#, 1)
        .await;

    let err = fixture
        .client()
        .analyze(&req(), CallOptions::default())
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_non_json_success_is_validation() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/analyze")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html>maintenance</html>")
            .expect(1)
            .create_async()
            .await
    };

    let err = fixture
        .client()
        .analyze(&req(), CallOptions::default())
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_response_contract_mismatch_is_validation() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json("/analyze", 200, r#"{"findings":[{"id":1}]}"#, 1)
        .await;

    let err = fixture
        .client()
        .analyze(&req(), CallOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_missing_credential_sends_nothing() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_json("/analyze", 200, EMPTY_ANALYSIS, 0).await;

    let client = AuditClientBuilder::new()
        .base_url(fixture.base_url.clone())
        .build()
        .unwrap();
    let err = client.analyze(&req(), CallOptions::default()).await.unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn test_wire_body_and_headers() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/analyze")
            .match_header("authorization", "Bearer sk-test")
            .match_header("content-type", "application/json")
            .match_header("accept", "application/json")
            .match_header("x-client-env", "vscode")
            .match_header("x-client-version", "1.4.0")
            .match_header("x-tenant", "per-call")
            .match_header("x-priority", "low")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "text": "Summarize this contract",
                "lang": "en",
                "correlationId": "id-1",
                "schemaVersion": 1
            })))
            .with_status(200)
            .with_header("content-type", "application/json; charset=utf-8")
            .with_header("x-request-id", "up-77")
            .with_body(EMPTY_ANALYSIS)
            .expect(1)
            .create_async()
            .await
    };

    let client = fixture
        .builder()
        .header("X-Tenant", "static")
        .env_meta(EnvMeta::new(HostEnv::Vscode, "1.4.0"))
        .build()
        .unwrap();
    let opts = CallOptions::new()
        .with_header("x-tenant", "per-call")
        .with_priority(Priority::Low);
    let (_, stats) = client
        .analyze_with_stats(&req().with_lang(auditor_client::Lang::En), opts)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(stats.correlation_id, "id-1");
    assert_eq!(stats.upstream_request_id.as_deref(), Some("up-77"));
    assert_eq!(stats.idempotency_key, None);
}

#[tokio::test]
async fn test_idempotency_key_stable_across_retries() {
    let fixture = MockServerFixture::new().await;
    let (first_fail, first_ok, second_ok) = {
        let mut server = fixture.server.lock().await;
        let first_fail = server
            .mock("POST", "/analyze")
            .match_header("idempotency-key", "id-2")
            .with_status(502)
            .expect(1)
            .create_async()
            .await;
        let first_ok = server
            .mock("POST", "/analyze")
            .match_header("idempotency-key", "id-2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(EMPTY_ANALYSIS)
            .expect(1)
            .create_async()
            .await;
        let second_ok = server
            .mock("POST", "/analyze")
            .match_header("idempotency-key", "id-4")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(EMPTY_ANALYSIS)
            .expect(1)
            .create_async()
            .await;
        (first_fail, first_ok, second_ok)
    };

    let client = fixture.builder().idempotency(true).build().unwrap();
    let (_, a) = client
        .analyze_with_stats(&req(), CallOptions::default())
        .await
        .unwrap();
    let (_, b) = client
        .analyze_with_stats(&req(), CallOptions::default())
        .await
        .unwrap();

    first_fail.assert_async().await;
    first_ok.assert_async().await;
    second_ok.assert_async().await;
    assert_eq!(a.attempts, 2);
    assert_eq!(a.idempotency_key.as_deref(), Some("id-2"));
    assert_eq!(b.idempotency_key.as_deref(), Some("id-4"));
}

#[tokio::test]
async fn test_custom_idempotency_header() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/revise")
            .match_header("x-request-key", "caller-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"findings":[],"revisedText":"Shorter."}"#)
            .expect(1)
            .create_async()
            .await
    };

    let client = fixture
        .builder()
        .idempotency_header("X-Request-Key")
        .build()
        .unwrap();
    let resp = client
        .revise(&req(), CallOptions::new().with_idempotency_key("caller-key"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(resp.revised_text.as_deref(), Some("Shorter."));
}

#[tokio::test]
async fn test_base_url_with_path_prefix() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_json("/v1/analyze", 200, EMPTY_ANALYSIS, 1).await;

    let client = fast_builder(&format!("{}/v1/", fixture.base_url))
        .build()
        .unwrap();
    client.analyze(&req(), CallOptions::default()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_json("/analyze", 200, EMPTY_ANALYSIS, 5).await;

    let client = fixture.builder().idempotency(true).build().unwrap();
    let calls = (0..5).map(|_| {
        let c = client.clone();
        async move { c.analyze_with_stats(&req(), CallOptions::default()).await }
    });
    let results = futures::future::join_all(calls).await;

    mock.assert_async().await;
    let mut keys: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().1.idempotency_key.unwrap())
        .collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 5);
}

#[tokio::test]
async fn test_per_attempt_timeout_is_retried() {
    let (url, server) = hanging_server().await;
    let client = fast_builder(&url)
        .timeout(Duration::from_millis(100))
        .retry(RetryPolicyConfig::default().max_attempts(2).base_delay_ms(1))
        .build()
        .unwrap();

    let err = client.analyze(&req(), CallOptions::default()).await.unwrap_err();
    server.abort();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(!err.is_cancelled());
    assert_eq!(err.context().attempts, Some(2));
}

#[tokio::test]
async fn test_cancellation_stops_the_call() {
    let (url, server) = hanging_server().await;
    let client = fast_builder(&url)
        .timeout(Duration::from_secs(10))
        .retry(RetryPolicyConfig::default().max_attempts(5))
        .build()
        .unwrap();

    let cancel = CancelHandle::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = client
        .analyze(&req(), CallOptions::new().with_cancel(&cancel))
        .await
        .unwrap_err();
    server.abort();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.is_cancelled());
    assert_eq!(err.context().attempts, Some(1));
}

#[tokio::test]
async fn test_cancel_before_call_makes_no_attempt() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_json("/analyze", 200, EMPTY_ANALYSIS, 0).await;

    let cancel = CancelHandle::new();
    cancel.cancel();
    let err = fixture
        .client()
        .analyze(&req(), CallOptions::new().with_cancel(&cancel))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(err.is_cancelled());
    assert_eq!(err.context().attempts, Some(0));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let client = fast_builder(&refused_url())
        .retry(RetryPolicyConfig::default().max_attempts(2).base_delay_ms(1))
        .build()
        .unwrap();

    let err = client.analyze(&req(), CallOptions::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.context().attempts, Some(2));
}

#[tokio::test]
async fn test_cancel_interrupts_backoff_sleep() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json("/analyze", 503, r#"{"error":"overloaded"}"#, 1)
        .await;
    let client = fixture
        .builder()
        .retry(
            RetryPolicyConfig::default()
                .max_attempts(5)
                .base_delay_ms(5_000)
                .max_delay_ms(5_000)
                .jitter(0.0),
        )
        .build()
        .unwrap();

    let cancel = CancelHandle::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = client
        .analyze(&req(), CallOptions::new().with_cancel(&cancel))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.is_cancelled());
    assert_eq!(err.context().attempts, Some(1));
}

#[tokio::test]
async fn test_elapsed_budget_stops_retries() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/analyze")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"boom"}"#)
            .expect_at_least(2)
            .create_async()
            .await
    };
    let client = fixture
        .builder()
        .retry(
            RetryPolicyConfig::default()
                .max_attempts(100)
                .base_delay_ms(20)
                .max_delay_ms(20)
                .max_elapsed_ms(200)
                .jitter(0.0),
        )
        .build()
        .unwrap();

    let started = Instant::now();
    let err = client.analyze(&req(), CallOptions::default()).await.unwrap_err();

    mock.assert_async().await;
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.status(), Some(500));
    let attempts = err.context().attempts.unwrap_or_default();
    assert!(attempts >= 2 && attempts < 100, "attempts = {attempts}");
}
