// rsdeploy/src/service/memory.rs
//! In-memory report server for exercising the deployment flow in tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use super::{
    BoundDataSource, CatalogItem, DataSource, DataSourceBinding, DataSourceDefinition,
    DataSourceTarget, ItemKind, ReportingService,
};
use crate::errors::{AppError, Result};
use crate::utils::paths::join_item_path;

#[derive(Debug, Clone)]
pub struct StoredItem {
    pub kind: ItemKind,
    pub content: Vec<u8>,
    pub data_sources: Vec<DataSource>,
}

#[derive(Debug, Default)]
struct State {
    items: BTreeMap<String, StoredItem>,
    shared_data_sources: BTreeMap<String, DataSourceDefinition>,
    calls: Vec<String>,
}

/// Report server kept in memory. Every call is appended to a log so tests can
/// assert on the exact sequence of remote operations.
#[derive(Debug)]
pub struct InMemoryReportServer {
    state: RefCell<State>,
    /// Data source names given to every uploaded report, all unresolved.
    report_data_source_names: Vec<String>,
    warnings: Vec<String>,
    failing_uploads: HashSet<String>,
}

impl Default for InMemoryReportServer {
    fn default() -> Self {
        Self {
            state: RefCell::default(),
            report_data_source_names: vec!["DataSource1".to_string()],
            warnings: Vec::new(),
            failing_uploads: HashSet::new(),
        }
    }
}

fn not_found(operation: &str, path: &str) -> AppError {
    AppError::SoapFault {
        operation: operation.to_string(),
        code: Some("rsItemNotFound".to_string()),
        message: format!("The item '{}' cannot be found.", path),
    }
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "/",
    }
}

impl InMemoryReportServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_report_data_sources(mut self, names: &[&str]) -> Self {
        self.report_data_source_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_upload_warnings(mut self, warnings: &[&str]) -> Self {
        self.warnings = warnings.iter().map(|w| w.to_string()).collect();
        self
    }

    pub fn with_failing_upload(mut self, report_name: &str) -> Self {
        self.failing_uploads.insert(report_name.to_string());
        self
    }

    pub fn add_folder(&self, path: &str) {
        self.insert(path, ItemKind::Folder, Vec::new(), Vec::new());
    }

    pub fn add_report(&self, path: &str, data_sources: Vec<DataSource>) {
        self.insert(path, ItemKind::Report, b"<Report/>".to_vec(), data_sources);
    }

    pub fn add_shared_data_source(&self, path: &str, definition: DataSourceDefinition) {
        self.insert(path, ItemKind::DataSource, Vec::new(), Vec::new());
        self.state
            .borrow_mut()
            .shared_data_sources
            .insert(path.to_string(), definition);
    }

    fn insert(&self, path: &str, kind: ItemKind, content: Vec<u8>, data_sources: Vec<DataSource>) {
        self.state.borrow_mut().items.insert(
            path.to_string(),
            StoredItem {
                kind,
                content,
                data_sources,
            },
        );
    }

    pub fn item(&self, path: &str) -> Option<StoredItem> {
        self.state.borrow().items.get(path).cloned()
    }

    /// Paths of everything stored below `folder_path`.
    pub fn descendants(&self, folder_path: &str) -> Vec<String> {
        let prefix = join_item_path(folder_path, "");
        self.state
            .borrow()
            .items
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .cloned()
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.split(' ').next() == Some(operation))
            .count()
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }

    fn require(&self, operation: &str, path: &str) -> Result<StoredItem> {
        self.item(path).ok_or_else(|| not_found(operation, path))
    }
}

impl ReportingService for InMemoryReportServer {
    async fn list_children(&self, folder_path: &str) -> Result<Vec<CatalogItem>> {
        self.record(format!("ListChildren {}", folder_path));
        if folder_path != "/" {
            self.require("ListChildren", folder_path)?;
        }

        let state = self.state.borrow();
        Ok(state
            .items
            .iter()
            .filter(|(path, _)| parent_of(path) == folder_path && path.as_str() != "/")
            .map(|(path, item)| CatalogItem {
                name: path.rsplit('/').next().unwrap_or_default().to_string(),
                path: path.clone(),
                kind: item.kind.clone(),
            })
            .collect())
    }

    async fn delete_item(&self, item_path: &str) -> Result<()> {
        self.record(format!("DeleteItem {}", item_path));
        self.require("DeleteItem", item_path)?;

        let nested = join_item_path(item_path, "");
        self.state
            .borrow_mut()
            .items
            .retain(|path, _| path != item_path && !path.starts_with(&nested));
        Ok(())
    }

    async fn create_folder(&self, name: &str, parent_path: &str) -> Result<()> {
        self.record(format!("CreateFolder {} {}", name, parent_path));
        let path = join_item_path(parent_path, name);
        if self.item(&path).is_some() {
            return Err(AppError::SoapFault {
                operation: "CreateFolder".to_string(),
                code: Some("rsItemAlreadyExists".to_string()),
                message: format!("The item '{}' already exists.", path),
            });
        }
        self.add_folder(&path);
        Ok(())
    }

    async fn create_catalog_item(
        &self,
        kind: ItemKind,
        name: &str,
        parent_path: &str,
        overwrite: bool,
        content: &[u8],
    ) -> Result<Vec<String>> {
        self.record(format!("CreateCatalogItem {} {}", parent_path, name));
        if self.failing_uploads.contains(name) {
            return Err(AppError::SoapFault {
                operation: "CreateCatalogItem".to_string(),
                code: Some("rsProcessingAborted".to_string()),
                message: format!("The definition of the report '{}' is invalid.", name),
            });
        }
        if parent_path != "/" {
            self.require("CreateCatalogItem", parent_path)?;
        }

        let path = join_item_path(parent_path, name);
        if !overwrite && self.item(&path).is_some() {
            return Err(AppError::SoapFault {
                operation: "CreateCatalogItem".to_string(),
                code: Some("rsItemAlreadyExists".to_string()),
                message: format!("The item '{}' already exists.", path),
            });
        }

        let data_sources = self
            .report_data_source_names
            .iter()
            .map(|name| DataSource {
                name: name.clone(),
                binding: DataSourceBinding::Unresolved,
            })
            .collect();
        self.insert(&path, kind, content.to_vec(), data_sources);
        Ok(self.warnings.clone())
    }

    async fn get_item_data_sources(&self, item_path: &str) -> Result<Vec<DataSource>> {
        self.record(format!("GetItemDataSources {}", item_path));
        Ok(self.require("GetItemDataSources", item_path)?.data_sources)
    }

    async fn set_item_data_sources(
        &self,
        item_path: &str,
        data_sources: &[BoundDataSource],
    ) -> Result<()> {
        self.record(format!("SetItemDataSources {}", item_path));
        self.require("SetItemDataSources", item_path)?;

        let mut state = self.state.borrow_mut();
        if let Some(item) = state.items.get_mut(item_path) {
            for bound in data_sources {
                let resolved = DataSourceBinding::Resolved(bound.target.clone());
                match item.data_sources.iter_mut().find(|ds| ds.name == bound.name) {
                    Some(existing) => existing.binding = resolved,
                    None => item.data_sources.push(DataSource {
                        name: bound.name.clone(),
                        binding: resolved,
                    }),
                }
            }
        }
        Ok(())
    }

    async fn get_data_source_contents(&self, shared_path: &str) -> Result<DataSourceDefinition> {
        self.record(format!("GetDataSourceContents {}", shared_path));
        self.state
            .borrow()
            .shared_data_sources
            .get(shared_path)
            .cloned()
            .ok_or_else(|| not_found("GetDataSourceContents", shared_path))
    }
}

/// A resolved binding pointing at the given shared definition.
pub fn resolved_with(definition: &DataSourceDefinition) -> DataSourceBinding {
    DataSourceBinding::Resolved(DataSourceTarget::Definition(definition.clone()))
}
