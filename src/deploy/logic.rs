// rsdeploy/src/deploy/logic.rs
use anyhow::{Context, Result};
use chrono::Local;
use std::path::Path;

use super::datasource::{RebindOutcome, rebind_data_source};
use super::folder::reset_folder;
use super::publish::{PublishOutcome, publish_report};
use crate::config::DeployConfig;
use crate::service::ReportingService;
use crate::utils::report_files::list_report_files;

/// What happened to one report during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportResult {
    pub name: String,
    pub publish: PublishOutcome,
    /// `None` when rebinding was skipped because publication failed.
    pub rebind: Option<RebindOutcome>,
}

impl ReportResult {
    pub fn is_failure(&self) -> bool {
        self.failure_reason().is_some()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match (&self.publish, &self.rebind) {
            (PublishOutcome::Failed { reason }, _) => Some(reason),
            (_, Some(RebindOutcome::Failed { reason })) => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSummary {
    pub folder_path: String,
    pub reports: Vec<ReportResult>,
}

impl DeploymentSummary {
    pub fn failure_count(&self) -> usize {
        self.reports.iter().filter(|r| r.is_failure()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }

    /// Total server warnings across all published reports.
    pub fn warning_count(&self) -> usize {
        self.reports
            .iter()
            .map(|r| match &r.publish {
                PublishOutcome::Published { warnings } => warnings.len(),
                PublishOutcome::Failed { .. } => 0,
            })
            .sum()
    }
}

/// Orchestrates a full deployment:
/// 1. Lists the local report definitions.
/// 2. Deletes and recreates the target folder.
/// 3. Publishes each report, then binds its data source.
///
/// Only steps 1 and 2 can fail the run; per-report failures are collected
/// in the returned summary.
pub async fn perform_deploy_orchestration<S: ReportingService>(
    service: &S,
    deploy_config: &DeployConfig,
) -> Result<DeploymentSummary> {
    println!(
        "🚀 Deploying reports from {} at {}",
        deploy_config.report_source_dir,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    tracing::debug!(?deploy_config, "deployment configuration");

    // Listing happens before the folder reset so a bad source directory
    // leaves the server untouched.
    let report_files = list_report_files(Path::new(&deploy_config.report_source_dir))?;
    if report_files.is_empty() {
        println!(
            "Warning: no .rdl files found in {}. The target folder will be recreated empty.",
            deploy_config.report_source_dir
        );
    } else {
        println!("Found {} report(s) to deploy.", report_files.len());
    }

    let folder_path = reset_folder(
        service,
        &deploy_config.target_folder_parent_path,
        &deploy_config.target_folder_name,
    )
    .await
    .with_context(|| {
        format!(
            "Failed to reset folder '{}' under '{}'",
            deploy_config.target_folder_name, deploy_config.target_folder_parent_path
        )
    })?;

    let mut reports = Vec::with_capacity(report_files.len());

    for report_file in report_files {
        let report_name = report_file.name.as_str();
        println!("\n📄 {}", report_name);

        let publish = publish_report(service, &report_file, &folder_path).await;
        let rebind = if publish.is_published() {
            Some(
                rebind_data_source(
                    service,
                    &folder_path,
                    report_name,
                    &deploy_config.data_source_name,
                    &deploy_config.shared_data_sources_path,
                )
                .await,
            )
        } else {
            println!("Skipping data source binding for {}", report_name);
            None
        };

        reports.push(ReportResult {
            name: report_file.name,
            publish,
            rebind,
        });
    }

    let summary = DeploymentSummary {
        folder_path,
        reports,
    };
    println!(
        "\n{} report(s) processed into {}: {} with errors, {} warning(s).",
        summary.reports.len(),
        summary.folder_path,
        summary.failure_count(),
        summary.warning_count()
    );
    Ok(summary)
}
