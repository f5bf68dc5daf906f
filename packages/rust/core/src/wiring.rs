//! Build orchestrators and zones from [`AppConfig`].

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use docflow_shared::{AppConfig, DocflowError, Result, ZoneConfig, expand_home};
use docflow_source::{ConfluenceClient, FileSecretStore};
use docflow_storage::{ObjectZone, Storage};
use docflow_workflow::HttpWorkflowTrigger;

use crate::extract::ExtractOrchestrator;
use crate::process::ProcessOrchestrator;
use crate::reporter::TracingReporter;

/// The object database and both zones over it.
pub struct Zones {
    pub landing: Arc<ObjectZone>,
    pub ground_truth: Arc<ObjectZone>,
}

/// Open the object database and build the landing and ground-truth zones.
pub async fn open_zones(config: &AppConfig) -> Result<Zones> {
    let path = expand_home(&config.storage.database_path)?;
    debug!(?path, "opening object database");
    let storage = Arc::new(Storage::open(&path).await?);

    Ok(Zones {
        landing: Arc::new(zone(&storage, &config.landing)),
        ground_truth: Arc::new(zone(&storage, &config.ground_truth)),
    })
}

fn zone(storage: &Arc<Storage>, config: &ZoneConfig) -> ObjectZone {
    ObjectZone::new(storage.clone(), config.bucket.as_str(), config.prefix.as_str())
}

/// Build the ingest orchestrator. Requires `workflow.endpoint`.
pub fn build_process_orchestrator(config: &AppConfig, zones: &Zones) -> Result<ProcessOrchestrator> {
    let endpoint = config
        .workflow
        .endpoint
        .as_deref()
        .filter(|endpoint| !endpoint.is_empty())
        .ok_or_else(|| DocflowError::config("workflow.endpoint is required to process events"))?;

    let secrets = Arc::new(FileSecretStore::new(expand_home(&config.secrets.dir)?));
    let source = ConfluenceClient::new(
        config.source.base_url.as_str(),
        secrets,
        config.source.secret_name.as_str(),
        Duration::from_secs(config.source.timeout_secs),
    )?;
    let trigger = HttpWorkflowTrigger::new(
        endpoint,
        config.workflow.state_machine.as_str(),
        Duration::from_secs(config.workflow.timeout_secs),
    )?;

    Ok(ProcessOrchestrator::new(
        Arc::new(source),
        zones.landing.clone(),
        Arc::new(trigger),
        Arc::new(TracingReporter::new("process")),
    ))
}

/// Build the extraction orchestrator.
pub fn build_extract_orchestrator(zones: &Zones) -> ExtractOrchestrator {
    ExtractOrchestrator::new(
        zones.landing.clone(),
        zones.ground_truth.clone(),
        Arc::new(TracingReporter::new("extract")),
    )
}
