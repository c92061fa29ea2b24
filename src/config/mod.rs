// rsdeploy/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use url::Url;

use crate::utils::paths::validate_item_name;

pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:80/ReportServer/ReportService2010.asmx";
pub const DEFAULT_PARENT_PATH: &str = "/";
pub const DEFAULT_SHARED_DATA_SOURCES_PATH: &str = "/Data Sources";

/// Environment variable consulted when `report_server.password` is absent.
pub const PASSWORD_ENV_VAR: &str = "REPORT_SERVER_PASSWORD";

// Structs for deserializing config.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonReportServerConfig {
    pub endpoint_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub domain: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawJsonConfig {
    pub report_source_dir: Option<String>,
    pub target_folder_name: Option<String>,
    pub target_folder_parent_path: Option<String>,
    pub data_source_name: Option<String>,
    pub shared_data_sources_path: Option<String>,
    pub report_server: Option<JsonReportServerConfig>,
}

// Application's internal configuration structs
#[derive(Clone)]
pub struct BasicCredentials {
    pub user_name: String,
    pub password: String,
    pub domain: Option<String>,
}

impl BasicCredentials {
    /// `DOMAIN\user` when a domain is set, otherwise the bare user name.
    pub fn qualified_user_name(&self) -> String {
        match &self.domain {
            Some(domain) => format!("{}\\{}", domain, self.user_name),
            None => self.user_name.clone(),
        }
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ReportServerConfig {
    pub endpoint_url: Url,
    /// `None` leaves authentication to the ambient identity of the process.
    pub credentials: Option<BasicCredentials>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub report_source_dir: String,
    pub target_folder_name: String,
    pub target_folder_parent_path: String,
    pub data_source_name: String,
    pub shared_data_sources_path: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub report_server: ReportServerConfig,
    pub raw_json_config: RawJsonConfig,
}

impl AppConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        Self::from_json_str(&config_content, |name| std::env::var(name).ok()).with_context(|| {
            format!(
                "Failed to load config file at {}",
                config_path.display()
            )
        })
    }

    /// Parses configuration JSON. `env_lookup` resolves environment
    /// variables so callers control where secrets come from.
    pub fn from_json_str(
        content: &str,
        env_lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let raw_json_config: RawJsonConfig =
            serde_json::from_str(content).context("Failed to parse configuration JSON")?;
        let report_server = load_report_server_config(
            raw_json_config.report_server.as_ref(),
            env_lookup,
        )?;

        Ok(AppConfig {
            report_server,
            raw_json_config,
        })
    }
}

fn load_report_server_config(
    raw: Option<&JsonReportServerConfig>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<ReportServerConfig> {
    let default_raw = JsonReportServerConfig::default();
    let raw = raw.unwrap_or(&default_raw);

    let endpoint = raw
        .endpoint_url
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_ENDPOINT_URL);
    let endpoint_url = Url::parse(endpoint)
        .with_context(|| format!("Invalid report server endpoint_url: {}", endpoint))?;
    if !matches!(endpoint_url.scheme(), "http" | "https") {
        anyhow::bail!(
            "report_server.endpoint_url must use http or https, got '{}'",
            endpoint_url.scheme()
        );
    }

    let credentials = match raw.username.as_ref().filter(|s| !s.trim().is_empty()) {
        Some(user_name) => {
            let password = raw
                .password
                .clone()
                .or_else(|| env_lookup(PASSWORD_ENV_VAR))
                .with_context(|| {
                    format!(
                        "report_server.username is set but no password was given in config.json or {}",
                        PASSWORD_ENV_VAR
                    )
                })?;
            Some(BasicCredentials {
                user_name: user_name.clone(),
                password,
                domain: raw.domain.clone().filter(|s| !s.trim().is_empty()),
            })
        }
        None => {
            if raw.password.is_some() || raw.domain.is_some() {
                println!("Warning: report_server.password/domain are set without a username and will be ignored. The ambient identity will be used.");
            }
            None
        }
    };

    if raw.timeout_secs == Some(0) {
        anyhow::bail!("report_server.timeout_secs must be greater than zero when set");
    }

    Ok(ReportServerConfig {
        endpoint_url,
        credentials,
        timeout_secs: raw.timeout_secs,
    })
}

pub fn load_deploy_config_from_json(raw_config: &RawJsonConfig) -> Result<DeployConfig> {
    let report_source_dir = raw_config
        .report_source_dir
        .as_ref()
        .filter(|s| !s.trim().is_empty())
        .context("report_source_dir must be set in config.json")?
        .clone();
    let target_folder_name = raw_config
        .target_folder_name
        .as_ref()
        .context("target_folder_name must be set in config.json")?
        .clone();
    validate_item_name(&target_folder_name).context("Invalid target_folder_name in config.json")?;

    let data_source_name = raw_config
        .data_source_name
        .as_ref()
        .filter(|s| !s.trim().is_empty())
        .context("data_source_name must be set in config.json")?
        .clone();

    let target_folder_parent_path = raw_config
        .target_folder_parent_path
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PARENT_PATH.to_string());
    let shared_data_sources_path = raw_config
        .shared_data_sources_path
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SHARED_DATA_SOURCES_PATH.to_string());

    Ok(DeployConfig {
        report_source_dir,
        target_folder_name,
        target_folder_parent_path,
        data_source_name,
        shared_data_sources_path,
    })
}
