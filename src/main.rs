//! Report Deployment Tool
//!
//! Publishes a directory of report definitions to a report server and binds
//! them to a shared data source.

// rsdeploy/src/main.rs
mod config;
mod deploy;
mod errors;
mod service;
mod utils;

use anyhow::{Context, Result};
use config::{AppConfig, load_deploy_config_from_json};
use deploy::DeploymentSummary;
use service::soap::SoapReportingService;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Exit code for a run that finished but had per-report failures.
const EXIT_PARTIAL_FAILURE: u8 = 2;

/// Main entry point for the deployment tool
#[tokio::main]
async fn main() -> ExitCode {
    match run_app().await {
        Ok(summary) if summary.is_clean() => {
            println!("✅ Deployment completed successfully.");
            ExitCode::SUCCESS
        }
        Ok(summary) => {
            println!(
                "⚠️ Deployment completed with {} failed report(s):",
                summary.failure_count()
            );
            for report in &summary.reports {
                if let Some(reason) = report.failure_reason() {
                    println!("   - {}: {}", report.name, reason);
                }
            }
            ExitCode::from(EXIT_PARTIAL_FAILURE)
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<DeploymentSummary> {
    // A missing .env file is fine; credentials may come from config.json or the shell.
    dotenv::dotenv().ok();
    init_tracing();

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let app_config = AppConfig::load_from_json(&config_path)
        .context(format!("Failed to load application configuration from {}", config_path.display()))?;
    let deploy_config = load_deploy_config_from_json(&app_config.raw_json_config)
        .context("Failed to load deployment configuration from JSON")?;

    println!("Report server: {}", app_config.report_server.endpoint_url);
    let service = SoapReportingService::new(&app_config.report_server)
        .context("Failed to create report server client")?;

    deploy::run_deploy_flow(&service, &deploy_config)
        .await
        .context("Deployment process failed")
}

/// Diagnostics go to stderr, filtered by `RSDEPLOY_LOG` (default `rsdeploy=warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("RSDEPLOY_LOG")
        .unwrap_or_else(|_| EnvFilter::new("rsdeploy=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
