//! Resilience Patterns Example
//!
//! This example demonstrates how the client behaves under failure:
//! - The backoff schedule produced by a retry policy
//! - Which error kinds are retried and which fail fast
//! - Cancelling a call that is stuck on a slow server
//!
//! Usage:
//!   cargo run --example resilience_patterns

use auditor_client::client::policy::{is_retryable, Decision};
use auditor_client::prelude::*;
use auditor_client::RetryPolicy;
use std::time::Duration;

#[tokio::main]
async fn main() {
    println!("=== Auditor Client Resilience Demo ===\n");

    // Example 1: Backoff schedule
    demo_backoff_schedule();

    // Example 2: Retry classification
    demo_retry_classification();

    // Example 3: Cancellation
    demo_cancellation().await;
}

fn demo_backoff_schedule() {
    println!("--- Example 1: Backoff Schedule ---\n");

    let policy = RetryPolicy::normalize(
        &RetryPolicyConfig::default()
            .max_attempts(6)
            .base_delay_ms(250)
            .max_delay_ms(3_000),
    );

    println!("Policy: {:?}\n", policy);
    for attempt in 1..policy.max_attempts() {
        let low = policy.delay_for_attempt(attempt, 0.0);
        let high = policy.delay_for_attempt(attempt, 0.999);
        println!(
            "After attempt {}: wait {}ms .. {}ms",
            attempt,
            low.as_millis(),
            high.as_millis()
        );
    }
    println!();
}

fn demo_retry_classification() {
    println!("--- Example 2: Retry Classification ---\n");

    let policy = RetryPolicy::default();
    let samples = vec![
        Error::timeout(),
        Error::cancelled(),
        Error::network("connection reset"),
        Error::rate_limited(Some(2)),
        Error::server(503, None),
        Error::server(404, None),
        Error::unauthorized("HTTP 401"),
        Error::validation("unexpected content-type"),
    ];

    for err in &samples {
        let decision = policy.decide(err, 1, Duration::ZERO, 0.5);
        let verdict = match decision {
            Decision::Retry { delay } => format!("retry in {}ms", delay.as_millis()),
            Decision::Fail => "fail".to_string(),
        };
        println!(
            "{:<12} retryable={:<5} -> {}   ({})",
            err.kind().name(),
            is_retryable(err),
            verdict,
            err
        );
    }
    println!();
}

async fn demo_cancellation() {
    println!("--- Example 3: Cancellation ---\n");

    // A listener that accepts but never answers stands in for a stuck server.
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
        Ok(l) => l,
        Err(e) => {
            println!("cannot bind local listener: {}", e);
            return;
        }
    };
    let url = match listener.local_addr() {
        Ok(addr) => format!("http://{}", addr),
        Err(e) => {
            println!("cannot read local address: {}", e);
            return;
        }
    };
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });

    let client = match AuditClientBuilder::new()
        .base_url(url)
        .api_key("demo-key")
        .timeout(Duration::from_secs(30))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            println!("failed to build client: {}", e);
            return;
        }
    };

    let cancel = CancelHandle::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        println!("cancelling after 300ms...");
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let result = client
        .analyze(
            &AnalyzeRequest::new("a prompt the server will never answer"),
            CallOptions::new().with_cancel(&cancel),
        )
        .await;
    server.abort();

    match result {
        Ok(_) => println!("unexpected success"),
        Err(e) => println!(
            "call ended after {}ms: {} (cancelled={})",
            started.elapsed().as_millis(),
            e,
            e.is_cancelled()
        ),
    }
}
