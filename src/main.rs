//! # Guardrail Orchestrator service
//!
//! Loads the TOML configuration (first argument, default `guardrails.toml`),
//! registers the validator catalog and answers JSON-lines requests on stdin:
//! one request object per line, one `{"status": ..., "body": ...}` object per
//! line on stdout. `{"health": true}` and `{"validators": true}` lines return
//! the health payload and the catalog listing.

use std::env;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use guardrail_orchestrator::api::GuardrailService;
use guardrail_orchestrator::config::Config;

const DEFAULT_CONFIG_PATH: &str = "guardrails.toml";

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let config_path = if args.len() > 1 {
        args[1].as_str()
    } else {
        DEFAULT_CONFIG_PATH
    };

    let config = if Path::new(config_path).exists() {
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("❌ Failed to load config from {}: {}", config_path, e);
                std::process::exit(1);
            }
        }
    } else if args.len() > 1 {
        eprintln!("❌ Config file not found: {}", config_path);
        std::process::exit(1);
    } else {
        Config::default()
    };

    init_logging(&config.logging.level);
    info!("🔧 Loaded configuration from: {}", config_path);

    let service = match GuardrailService::from_config(&config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("❌ Failed to build validator registry: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "✅ {} validators available, default step timeout {} ms",
        service.registry().len(),
        config.orchestrator.default_timeout_ms
    );

    tokio::select! {
        result = serve_stdio(Arc::clone(&service)) => {
            if let Err(e) = result {
                error!("❌ Server error: {}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("🔄 Shutting down");
        }
    }

    info!("📊 Final stats: {:?}", service.stats());
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries responses, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Serve one JSON request per stdin line until EOF
async fn serve_stdio(service: Arc<GuardrailService>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    info!("🃏 Ready for requests on stdin");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match control_request(&service, line) {
            Some(reply) => reply,
            None => {
                let response = service.handle_json(line).await;
                serde_json::to_value(&response).unwrap_or_else(|e| {
                    warn!("⚠️  Failed to encode response: {}", e);
                    json!({"status": 500, "body": {"error": e.to_string()}})
                })
            }
        };

        let mut out = reply.to_string();
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    info!("📭 stdin closed");
    Ok(())
}

/// Health and listing requests, answered without running a pipeline
fn control_request(service: &GuardrailService, line: &str) -> Option<Value> {
    let value: Value = serde_json::from_str(line).ok()?;
    let object = value.as_object()?;
    if object.get("health").and_then(Value::as_bool) == Some(true) {
        return Some(json!({"status": 200, "body": service.health()}));
    }
    if object.get("validators").and_then(Value::as_bool) == Some(true) {
        return Some(json!({"status": 200, "body": service.validators()}));
    }
    None
}
