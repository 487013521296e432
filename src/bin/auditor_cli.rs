//! auditor-cli — 提示词审计服务的命令行客户端
//!
//! Usage:
//!   auditor-cli analyze [--text <t>] [--settings <path>] [--offline] [--lang ru|en]
//!   auditor-cli revise  [--text <t>] [--settings <path>] [--offline] [--lang ru|en]
//!   auditor-cli version

use anyhow::Context;
use auditor_client::analyzers::PromptAuditAnalyzer;
use auditor_client::host::{merge_findings, to_ui_findings, RiskSummary};
use auditor_client::{
    AnalyzeRequest, AuditClientBuilder, CallOptions, CallStats, EnvMeta, HostEnv, Lang, Settings,
    TransportKind,
};
use std::io::Read;
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "analyze" | "revise" => {
            init_tracing();
            let revise = args[1] == "revise";
            if let Err(code) = run_call(revise, &args[2..]) {
                std::process::exit(code);
            }
        }
        "version" | "--version" | "-V" => cmd_version(),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!(
        r#"auditor-cli — 提示词审计命令行工具

USAGE:
    auditor-cli <COMMAND> [OPTIONS]

COMMANDS:
    analyze                     Analyze a prompt (local + service findings)
    revise                      Ask the service for a revision
    version                     Show version information
    help                        Show this help message

OPTIONS:
    --text <text>               Prompt text (read from stdin when omitted)
    --settings <path>           Settings file (YAML or JSON)
    --offline                   Force the offline transport
    --lang <ru|en>              Language hint

ENVIRONMENT:
    AUDITOR_MODE, AUDITOR_BASE_URL, AUDITOR_API_KEY,
    AUDITOR_TIMEOUT_MS, AUDITOR_MAX_ATTEMPTS     Settings overrides
    RUST_LOG                                     Log filter (logs go to stderr)"#
    );
}

fn cmd_version() {
    println!("auditor-cli {}", env!("CARGO_PKG_VERSION"));
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn run_call(revise: bool, args: &[String]) -> Result<(), i32> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            eprintln!("Error: cannot start runtime: {e}");
            1
        })?;

    match runtime.block_on(execute(revise, args)) {
        Ok(out) => {
            println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
            Ok(())
        }
        Err(e) => {
            match e.downcast_ref::<auditor_client::Error>() {
                Some(err) => eprintln!("Error [{}]: {err}", err.kind()),
                None => eprintln!("Error: {e:#}"),
            }
            Err(1)
        }
    }
}

async fn execute(revise: bool, args: &[String]) -> anyhow::Result<serde_json::Value> {
    let settings = match flag_value(args, "--settings") {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    }
    .apply_env_overrides();

    let text = match flag_value(args, "--text") {
        Some(t) => t.to_string(),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading prompt from stdin")?;
            buf.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    settings.check_length(&text)?;

    let mut req = AnalyzeRequest::new(text);
    match flag_value(args, "--lang") {
        Some("ru") => req = req.with_lang(Lang::Ru),
        Some("en") => req = req.with_lang(Lang::En),
        Some(other) => anyhow::bail!("unsupported --lang {other:?}"),
        None => {}
    }

    let mut builder = AuditClientBuilder::from_settings(&settings)
        .env_meta(EnvMeta::detect(HostEnv::Dashboard, env!("CARGO_PKG_VERSION")));
    if has_flag(args, "--offline") {
        builder = builder.offline_default();
    }
    let client = builder.build()?;

    if revise {
        let (resp, stats) = client.revise_with_stats(&req, CallOptions::default()).await?;
        return Ok(serde_json::json!({
            "result": resp,
            "stats": stats_json(&stats),
        }));
    }

    let (remote, stats) = client.analyze_with_stats(&req, CallOptions::default()).await?;
    // Online hosts show local heuristics next to the service findings.
    let local = if client.transport_kind() == TransportKind::Network {
        PromptAuditAnalyzer::new().run(&req).findings
    } else {
        Vec::new()
    };
    let findings = merge_findings(local, remote.findings);
    Ok(serde_json::json!({
        "findings": findings,
        "ui": to_ui_findings(&findings),
        "summary": RiskSummary::of(&findings),
        "suggestions": remote.suggestions.unwrap_or_default(),
        "traceId": remote.trace_id,
        "stats": stats_json(&stats),
    }))
}

fn stats_json(stats: &CallStats) -> serde_json::Value {
    serde_json::json!({
        "route": stats.route.as_str(),
        "transport": stats.transport,
        "attempts": stats.attempts,
        "durationMs": stats.duration_ms as u64,
        "correlationId": stats.correlation_id,
        "idempotencyKey": stats.idempotency_key,
        "httpStatus": stats.http_status,
        "upstreamRequestId": stats.upstream_request_id,
    })
}
