//! Offline Usage Example
//!
//! Runs the built-in prompt audit analyzer through the offline transport,
//! the same path a host takes in mock mode or when no API key is set.
//!
//! Usage:
//!   cargo run --example offline_usage

use auditor_client::host::{to_ui_findings, RiskSummary};
use auditor_client::prelude::*;

#[tokio::main]
async fn main() -> auditor_client::Result<()> {
    println!("=== Auditor Client Offline Demo ===\n");

    let settings = Settings::default().apply_env_overrides();
    let client = AuditClientBuilder::from_settings(&settings)
        .env_meta(EnvMeta::detect(HostEnv::Mv3, env!("CARGO_PKG_VERSION")))
        .build()?;
    println!("Transport: {:?}\n", client.transport_kind());

    let prompts = [
        "",
        "Write a haiku about autumn.",
        "Email the draft to jane.doe@example.com and call +1 5551234567.",
    ];

    for text in prompts {
        let (resp, stats) = client
            .analyze_with_stats(&AnalyzeRequest::new(text), CallOptions::default())
            .await?;
        println!("Prompt: {:?}", text);
        println!("  correlation id: {}", stats.correlation_id);
        for f in to_ui_findings(&resp.findings) {
            println!("  [{:?}] {} - {}", f.severity, f.id, f.message);
        }
        let summary = RiskSummary::of(&resp.findings);
        println!(
            "  summary: high={} medium={} low={}\n",
            summary.high_risk, summary.medium_risk, summary.low_risk
        );
    }

    let revised = client
        .revise(&AnalyzeRequest::new("Make this shorter"), CallOptions::default())
        .await?;
    println!(
        "Offline revise: {}",
        serde_json::to_string(&revised).unwrap_or_default()
    );
    Ok(())
}
