// rsdeploy/src/deploy/mod.rs
pub(crate) mod datasource;
pub(crate) mod folder;
mod logic;
pub(crate) mod publish;

use anyhow::Result;
use crate::config::DeployConfig;
use crate::service::ReportingService;

pub use logic::DeploymentSummary;

/// Public entry point for the deployment process: resets the target folder,
/// publishes every local report and binds each one to the shared data source.
pub async fn run_deploy_flow<S: ReportingService>(
    service: &S,
    deploy_config: &DeployConfig,
) -> Result<DeploymentSummary> {
    logic::perform_deploy_orchestration(service, deploy_config).await
}
