// rsdeploy/src/service/soap.rs
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use url::Url;

use super::xml::{self, Element, REPORT_SERVER_NS, text_element};
use super::{
    BoundDataSource, CatalogItem, DataSource, DataSourceBinding, DataSourceDefinition,
    DataSourceTarget, ItemKind, ReportingService,
};
use crate::config::{BasicCredentials, ReportServerConfig};
use crate::errors::{AppError, Result};

/// SOAP client for the report server's `ReportService2010.asmx` endpoint.
#[derive(Debug, Clone)]
pub struct SoapReportingService {
    http: reqwest::Client,
    endpoint: Url,
    credentials: Option<BasicCredentials>,
}

impl SoapReportingService {
    pub fn new(config: &ReportServerConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|source| AppError::Http {
            operation: "client_init".to_string(),
            source,
        })?;

        Ok(Self {
            http,
            endpoint: config.endpoint_url.clone(),
            credentials: config.credentials.clone(),
        })
    }

    /// Sends one SOAP call and returns the `<operation>Response` element.
    async fn call(&self, operation: &str, body: &str) -> Result<Element> {
        tracing::debug!(operation, endpoint = %self.endpoint, "sending SOAP request");

        let mut request = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}/{}\"", REPORT_SERVER_NS, operation))
            .body(xml::envelope(operation, body));
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(credentials.qualified_user_name(), Some(&credentials.password));
        }

        let response = request.send().await.map_err(|source| AppError::Http {
            operation: operation.to_string(),
            source,
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|source| AppError::Http {
            operation: operation.to_string(),
            source,
        })?;

        match xml::response_body(operation, &text) {
            Ok(element) => Ok(element),
            Err(err @ AppError::SoapFault { .. }) => {
                tracing::warn!(operation, code = ?err.fault_code(), "report server returned a SOAP fault");
                Err(err)
            }
            Err(_) if !status.is_success() => Err(AppError::HttpStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
                body: text,
            }),
            Err(err) => Err(err),
        }
    }
}

fn malformed(operation: &str, reason: impl Into<String>) -> AppError {
    AppError::MalformedResponse {
        operation: operation.to_string(),
        reason: reason.into(),
    }
}

fn parse_catalog_item(element: &Element) -> Option<CatalogItem> {
    Some(CatalogItem {
        name: element.child_text("Name")?.to_string(),
        path: element.child_text("Path").unwrap_or_default().to_string(),
        kind: ItemKind::from_type_name(element.child_text("TypeName").unwrap_or_default()),
    })
}

fn parse_definition(element: &Element) -> DataSourceDefinition {
    DataSourceDefinition {
        fields: element
            .children
            .iter()
            .filter(|field| !field.nil)
            .map(|field| (field.name.clone(), field.text.clone()))
            .collect(),
    }
}

fn parse_data_source(operation: &str, element: &Element) -> Result<DataSource> {
    let name = element
        .child_text("Name")
        .ok_or_else(|| malformed(operation, "data source without a name"))?
        .to_string();

    let binding = if element.child("InvalidDataSourceReference").is_some() {
        DataSourceBinding::Unresolved
    } else if let Some(reference) = element.child("DataSourceReference") {
        let path = reference.child_text("Reference").unwrap_or_default();
        DataSourceBinding::Resolved(DataSourceTarget::Reference(path.to_string()))
    } else if let Some(definition) = element.child("DataSourceDefinition") {
        DataSourceBinding::Resolved(DataSourceTarget::Definition(parse_definition(definition)))
    } else {
        return Err(malformed(
            operation,
            format!("data source '{}' has no reference or definition", name),
        ));
    };

    Ok(DataSource { name, binding })
}

fn data_source_xml(data_source: &BoundDataSource) -> String {
    let target = match &data_source.target {
        DataSourceTarget::Reference(path) => format!(
            "<DataSourceReference>{}</DataSourceReference>",
            text_element("Reference", path)
        ),
        DataSourceTarget::Definition(definition) => {
            let fields: String = definition
                .fields
                .iter()
                .map(|(name, value)| text_element(name, value))
                .collect();
            format!("<DataSourceDefinition>{}</DataSourceDefinition>", fields)
        }
    };
    format!(
        "<DataSource>{}{}</DataSource>",
        text_element("Name", &data_source.name),
        target
    )
}

impl ReportingService for SoapReportingService {
    async fn list_children(&self, folder_path: &str) -> Result<Vec<CatalogItem>> {
        const OP: &str = "ListChildren";
        let body = format!(
            "{}{}",
            text_element("ItemPath", folder_path),
            text_element("Recursive", "false")
        );
        let response = self.call(OP, &body).await?;

        let items = match response.child("CatalogItems") {
            Some(items) => items
                .children_named("CatalogItem")
                .map(|item| parse_catalog_item(item).ok_or_else(|| malformed(OP, "catalog item without a name")))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        Ok(items)
    }

    async fn delete_item(&self, item_path: &str) -> Result<()> {
        self.call("DeleteItem", &text_element("ItemPath", item_path))
            .await
            .map(|_| ())
    }

    async fn create_folder(&self, name: &str, parent_path: &str) -> Result<()> {
        let body = format!(
            "{}{}",
            text_element("Folder", name),
            text_element("Parent", parent_path)
        );
        self.call("CreateFolder", &body).await.map(|_| ())
    }

    async fn create_catalog_item(
        &self,
        kind: ItemKind,
        name: &str,
        parent_path: &str,
        overwrite: bool,
        content: &[u8],
    ) -> Result<Vec<String>> {
        let body = format!(
            "{}{}{}{}{}",
            text_element("ItemType", kind.as_str()),
            text_element("Name", name),
            text_element("Parent", parent_path),
            text_element("Overwrite", if overwrite { "true" } else { "false" }),
            text_element("Definition", &STANDARD.encode(content)),
        );
        let response = self.call("CreateCatalogItem", &body).await?;

        let warnings = response
            .child("Warnings")
            .map(|warnings| {
                warnings
                    .children_named("Warning")
                    .filter_map(|w| w.child_text("Message"))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(warnings)
    }

    async fn get_item_data_sources(&self, item_path: &str) -> Result<Vec<DataSource>> {
        const OP: &str = "GetItemDataSources";
        let response = self.call(OP, &text_element("ItemPath", item_path)).await?;

        match response.child("DataSources") {
            Some(sources) => sources
                .children_named("DataSource")
                .map(|source| parse_data_source(OP, source))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    async fn set_item_data_sources(
        &self,
        item_path: &str,
        data_sources: &[BoundDataSource],
    ) -> Result<()> {
        let sources: String = data_sources.iter().map(data_source_xml).collect();
        let body = format!(
            "{}<DataSources>{}</DataSources>",
            text_element("ItemPath", item_path),
            sources
        );
        self.call("SetItemDataSources", &body).await.map(|_| ())
    }

    async fn get_data_source_contents(&self, shared_path: &str) -> Result<DataSourceDefinition> {
        const OP: &str = "GetDataSourceContents";
        let response = self.call(OP, &text_element("DataSource", shared_path)).await?;

        response
            .child("Definition")
            .map(parse_definition)
            .ok_or_else(|| malformed(OP, "missing Definition element"))
    }
}
