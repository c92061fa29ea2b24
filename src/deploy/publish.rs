// rsdeploy/src/deploy/publish.rs
use crate::service::{ItemKind, ReportingService};
use crate::utils::paths::normalize_folder_path;
use crate::utils::report_files::{ReportFile, read_report_definition};

/// Result of publishing one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published { warnings: Vec<String> },
    Failed { reason: String },
}

impl PublishOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, PublishOutcome::Published { .. })
    }
}

/// Reads the listed report file and uploads it as a report named after its
/// stem into `folder_path`, replacing any report of the same name.
///
/// Failures are printed and returned as [`PublishOutcome::Failed`]; they
/// never abort the batch.
pub async fn publish_report<S: ReportingService>(
    service: &S,
    report: &ReportFile,
    folder_path: &str,
) -> PublishOutcome {
    let report_name = report.name.as_str();
    let folder_path = normalize_folder_path(folder_path);

    let definition = match read_report_definition(&report.path) {
        Ok(definition) => definition,
        Err(e) => {
            eprintln!("❌ {}", e);
            return PublishOutcome::Failed {
                reason: e.to_string(),
            };
        }
    };
    tracing::debug!(report = report_name, bytes = definition.len(), "read report definition");

    match service
        .create_catalog_item(ItemKind::Report, report_name, &folder_path, true, &definition)
        .await
    {
        Ok(warnings) => {
            if warnings.is_empty() {
                println!("✅ Report: {} published successfully with no warnings", report_name);
            } else {
                for warning in &warnings {
                    println!("⚠️ {}", warning);
                }
            }
            PublishOutcome::Published { warnings }
        }
        Err(e) => {
            eprintln!("❌ Report: {} failed to publish: {}", report_name, e);
            PublishOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
