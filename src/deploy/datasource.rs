// rsdeploy/src/deploy/datasource.rs
use crate::errors::{AppError, Result};
use crate::service::{BoundDataSource, DataSourceBinding, DataSourceTarget, ReportingService};
use crate::utils::paths::{join_item_path, normalize_folder_path};

/// Result of rebinding one report's data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebindOutcome {
    /// The unresolved reference, named by `data_source`, now points at the
    /// shared data source.
    Rebound { data_source: String },
    /// The reference was already valid and was left as is.
    AlreadyBound,
    Failed { reason: String },
}

/// Points the single data source reference of `report_name` at the shared
/// data source `data_source_name` when the reference is unresolved.
///
/// Failures are printed and returned as [`RebindOutcome::Failed`] so that one
/// report cannot affect the rest of the batch.
pub async fn rebind_data_source<S: ReportingService>(
    service: &S,
    folder_path: &str,
    report_name: &str,
    data_source_name: &str,
    shared_data_sources_path: &str,
) -> RebindOutcome {
    let folder_path = normalize_folder_path(folder_path);
    let report_path = join_item_path(&folder_path, report_name);
    let shared_path = join_item_path(&normalize_folder_path(shared_data_sources_path), data_source_name);

    match try_rebind(service, &report_path, &shared_path).await {
        Ok(Some(data_source)) => {
            println!(
                "🔗 Report: {} data source '{}' bound to {}",
                report_name, data_source, shared_path
            );
            RebindOutcome::Rebound { data_source }
        }
        Ok(None) => {
            tracing::debug!(report = %report_path, "data source already resolved");
            RebindOutcome::AlreadyBound
        }
        Err(e) => {
            if e.fault_code() == Some("rsItemNotFound") {
                eprintln!(
                    "❌ Report: {} could not be bound; check that {} and {} exist: {}",
                    report_name, report_path, shared_path, e
                );
            } else {
                eprintln!("❌ Report: {} data source could not be set: {}", report_name, e);
            }
            RebindOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// Returns the display name of the rebound reference, or `None` when it
/// was already resolved.
async fn try_rebind<S: ReportingService>(
    service: &S,
    report_path: &str,
    shared_path: &str,
) -> Result<Option<String>> {
    let data_sources = service.get_item_data_sources(report_path).await?;
    let [data_source] = data_sources.as_slice() else {
        return Err(AppError::UnsupportedDataSources(data_sources.len()));
    };

    match data_source.binding {
        DataSourceBinding::Resolved(_) => Ok(None),
        DataSourceBinding::Unresolved => {
            let definition = service.get_data_source_contents(shared_path).await?;
            tracing::debug!(
                shared = shared_path,
                extension = definition.get("Extension").unwrap_or("unknown"),
                "fetched shared data source"
            );
            let bound = BoundDataSource {
                name: data_source.name.clone(),
                target: DataSourceTarget::Definition(definition),
            };
            service
                .set_item_data_sources(report_path, std::slice::from_ref(&bound))
                .await?;
            Ok(Some(bound.name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::memory::{InMemoryReportServer, resolved_with};
    use crate::service::{DataSource, DataSourceDefinition};

    fn shared_definition() -> DataSourceDefinition {
        DataSourceDefinition {
            fields: vec![
                ("Extension".to_string(), "SQL".to_string()),
                ("ConnectString".to_string(), "Data Source=db01;Initial Catalog=Sales".to_string()),
            ],
        }
    }

    fn unresolved(name: &str) -> DataSource {
        DataSource {
            name: name.to_string(),
            binding: DataSourceBinding::Unresolved,
        }
    }

    fn server_with_shared_source() -> InMemoryReportServer {
        let server = InMemoryReportServer::new();
        server.add_folder("/Data Sources");
        server.add_shared_data_source("/Data Sources/My Datasource", shared_definition());
        server.add_folder("/MyReports");
        server
    }

    #[tokio::test]
    async fn unresolved_reference_is_bound_keeping_its_name() {
        let server = server_with_shared_source();
        server.add_report("/MyReports/SalesReport", vec![unresolved("SalesDS")]);

        let outcome = rebind_data_source(&server, "MyReports", "SalesReport", "My Datasource", "/Data Sources").await;

        assert_eq!(
            outcome,
            RebindOutcome::Rebound {
                data_source: "SalesDS".to_string()
            }
        );
        let item = server.item("/MyReports/SalesReport").expect("report present");
        assert_eq!(
            item.data_sources,
            vec![DataSource {
                name: "SalesDS".to_string(),
                binding: resolved_with(&shared_definition()),
            }]
        );
    }

    #[tokio::test]
    async fn resolved_reference_is_left_untouched() {
        let server = server_with_shared_source();
        let existing = DataSource {
            name: "SalesDS".to_string(),
            binding: DataSourceBinding::Resolved(DataSourceTarget::Reference("/Data Sources/Other".to_string())),
        };
        server.add_report("/MyReports/SalesReport", vec![existing.clone()]);

        let outcome = rebind_data_source(&server, "/MyReports", "SalesReport", "My Datasource", "/Data Sources").await;

        assert_eq!(outcome, RebindOutcome::AlreadyBound);
        assert_eq!(server.call_count("SetItemDataSources"), 0);
        assert_eq!(server.call_count("GetDataSourceContents"), 0);
        assert_eq!(
            server.item("/MyReports/SalesReport").map(|i| i.data_sources),
            Some(vec![existing])
        );
    }

    #[tokio::test]
    async fn rebinding_twice_is_idempotent() {
        let server = server_with_shared_source();
        server.add_report("/MyReports/SalesReport", vec![unresolved("SalesDS")]);

        let first = rebind_data_source(&server, "/MyReports", "SalesReport", "My Datasource", "/Data Sources").await;
        let second = rebind_data_source(&server, "/MyReports", "SalesReport", "My Datasource", "/Data Sources").await;

        assert_eq!(
            first,
            RebindOutcome::Rebound {
                data_source: "SalesDS".to_string()
            }
        );
        assert_eq!(second, RebindOutcome::AlreadyBound);
        assert_eq!(server.call_count("SetItemDataSources"), 1);
    }

    #[tokio::test]
    async fn multiple_references_are_unsupported() {
        let server = server_with_shared_source();
        server.add_report(
            "/MyReports/SalesReport",
            vec![unresolved("SalesDS"), unresolved("AuditDS")],
        );

        let outcome = rebind_data_source(&server, "/MyReports", "SalesReport", "My Datasource", "/Data Sources").await;

        match outcome {
            RebindOutcome::Failed { reason } => {
                assert!(reason.contains("single datasource"));
                assert!(reason.contains('2'));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(server.call_count("SetItemDataSources"), 0);
    }

    #[tokio::test]
    async fn report_without_references_is_unsupported() {
        let server = server_with_shared_source();
        server.add_report("/MyReports/Static", Vec::new());

        let outcome = rebind_data_source(&server, "/MyReports", "Static", "My Datasource", "/Data Sources").await;

        assert!(matches!(outcome, RebindOutcome::Failed { .. }));
        assert_eq!(server.call_count("SetItemDataSources"), 0);
    }

    #[tokio::test]
    async fn missing_shared_data_source_is_reported() {
        let server = server_with_shared_source();
        server.add_report("/MyReports/SalesReport", vec![unresolved("SalesDS")]);

        let outcome = rebind_data_source(&server, "/MyReports", "SalesReport", "Nope", "/Data Sources").await;

        assert!(matches!(outcome, RebindOutcome::Failed { .. }));
        assert_eq!(server.call_count("SetItemDataSources"), 0);
        assert_eq!(
            server.item("/MyReports/SalesReport").map(|i| i.data_sources),
            Some(vec![unresolved("SalesDS")])
        );
    }

    #[tokio::test]
    async fn missing_report_is_reported() {
        let server = server_with_shared_source();

        let outcome = rebind_data_source(&server, "/MyReports", "Ghost", "My Datasource", "/Data Sources").await;

        assert!(matches!(outcome, RebindOutcome::Failed { .. }));
    }
}
