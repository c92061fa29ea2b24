// rsdeploy/src/service/mod.rs
//! Remote report server boundary.
//!
//! The deployment flow only talks to the server through [`ReportingService`],
//! implemented over SOAP by [`soap::SoapReportingService`] and in memory for
//! tests.

#[cfg(test)]
pub(crate) mod memory;
pub(crate) mod soap;
pub(crate) mod xml;

use crate::errors::Result;

/// Catalog item types known to the report server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Folder,
    Report,
    DataSource,
    DataSet,
    Resource,
    LinkedReport,
    Component,
    Other(String),
}

impl ItemKind {
    pub fn as_str(&self) -> &str {
        match self {
            ItemKind::Folder => "Folder",
            ItemKind::Report => "Report",
            ItemKind::DataSource => "DataSource",
            ItemKind::DataSet => "DataSet",
            ItemKind::Resource => "Resource",
            ItemKind::LinkedReport => "LinkedReport",
            ItemKind::Component => "Component",
            ItemKind::Other(name) => name.as_str(),
        }
    }

    pub fn from_type_name(type_name: &str) -> Self {
        match type_name {
            "Folder" => ItemKind::Folder,
            "Report" => ItemKind::Report,
            "DataSource" => ItemKind::DataSource,
            "DataSet" => ItemKind::DataSet,
            "Resource" => ItemKind::Resource,
            "LinkedReport" => ItemKind::LinkedReport,
            "Component" => ItemKind::Component,
            other => ItemKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub name: String,
    pub path: String,
    pub kind: ItemKind,
}

/// Contents of a shared data source as returned by the server.
///
/// Kept as the ordered list of definition fields so it can be sent back
/// unchanged when binding a report to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSourceDefinition {
    pub fields: Vec<(String, String)>,
}

impl DataSourceDefinition {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }
}

/// Where a resolved data source reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceTarget {
    /// Path of a shared data source on the server.
    Reference(String),
    /// Connection definition stored with the item.
    Definition(DataSourceDefinition),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceBinding {
    Resolved(DataSourceTarget),
    /// The report points at a data source the server cannot find.
    Unresolved,
}

/// A data source reference as reported for a catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub name: String,
    pub binding: DataSourceBinding,
}

/// A data source reference to write to a catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundDataSource {
    pub name: String,
    pub target: DataSourceTarget,
}

/// Operations the deployment needs from a report server.
pub trait ReportingService {
    /// Lists the immediate children of `folder_path`.
    async fn list_children(&self, folder_path: &str) -> Result<Vec<CatalogItem>>;

    /// Deletes an item; deleting a folder removes everything inside it.
    async fn delete_item(&self, item_path: &str) -> Result<()>;

    async fn create_folder(&self, name: &str, parent_path: &str) -> Result<()>;

    /// Uploads an item and returns the server's warning messages.
    async fn create_catalog_item(
        &self,
        kind: ItemKind,
        name: &str,
        parent_path: &str,
        overwrite: bool,
        content: &[u8],
    ) -> Result<Vec<String>>;

    async fn get_item_data_sources(&self, item_path: &str) -> Result<Vec<DataSource>>;

    async fn set_item_data_sources(
        &self,
        item_path: &str,
        data_sources: &[BoundDataSource],
    ) -> Result<()>;

    async fn get_data_source_contents(&self, shared_path: &str) -> Result<DataSourceDefinition>;
}
