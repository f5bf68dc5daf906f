//! Ingest path: fetch or synthesize a payload, land it, start the workflow.

use std::sync::Arc;

use serde_json::Value;
use tracing::instrument;

use docflow_shared::{
    ContentMap, ContentSource, DocflowError, DocumentEvent, DocumentEventType, ObjectStore,
    ProcessResult, Result, WorkflowTrigger,
};

use crate::object_key::{Clock, SystemClock, build_object_key};
use crate::reporter::{Stage, StageReporter};

/// Turns change events into landed raw payloads and started workflows.
pub struct ProcessOrchestrator {
    source: Arc<dyn ContentSource>,
    landing: Arc<dyn ObjectStore>,
    trigger: Arc<dyn WorkflowTrigger>,
    reporter: Arc<dyn StageReporter>,
    clock: Arc<dyn Clock>,
}

impl ProcessOrchestrator {
    pub fn new(
        source: Arc<dyn ContentSource>,
        landing: Arc<dyn ObjectStore>,
        trigger: Arc<dyn WorkflowTrigger>,
        reporter: Arc<dyn StageReporter>,
    ) -> Self {
        Self {
            source,
            landing,
            trigger,
            reporter,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used to timestamp object keys.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run the ingest path for one event.
    ///
    /// 1. Updated: fetch the live page. Deleted: synthesize a deletion record
    /// 2. Land it under a key stamped with the current time
    /// 3. Start the workflow with the landed URI
    ///
    /// Collaborator errors propagate as-is. The trigger only runs after a
    /// successful save; a failed trigger leaves the landed object in place.
    #[instrument(skip_all, fields(document_id = %event.document_id(), event_type = %event.event_type()))]
    pub async fn process(&self, event: &DocumentEvent) -> Result<ProcessResult> {
        let result = self.run(event).await;
        if let Err(e) = &result {
            self.reporter.failed(event.document_id(), e);
        }
        result
    }

    async fn run(&self, event: &DocumentEvent) -> Result<ProcessResult> {
        let document_id = event.document_id();
        if document_id.is_empty() {
            return Err(DocflowError::missing("event without document_id"));
        }
        let event_type = event.event_type();
        self.reporter.stage(document_id, Stage::Received, event_type.as_str());

        let payload = match event_type {
            DocumentEventType::Updated => {
                let page = self.source.get_page(document_id).await?;
                self.reporter
                    .stage(document_id, Stage::Fetched, &format!("{} fields", page.len()));
                page
            }
            DocumentEventType::Deleted => {
                let record = deletion_record(document_id, event_type);
                self.reporter.stage(document_id, Stage::Synthesized, "deletion record");
                record
            }
            other => return Err(DocflowError::UnsupportedEventType(other.to_string())),
        };

        let object_key = build_object_key(document_id, event_type, self.clock.now())?;
        let saved = self.landing.save(&object_key, &payload).await?;
        self.reporter.stage(document_id, Stage::Landed, &saved.uri);

        let receipt = self
            .trigger
            .trigger(document_id, event_type, &saved.uri)
            .await?;
        self.reporter
            .stage(document_id, Stage::Triggered, &receipt.execution_id);

        Ok(ProcessResult {
            document_id: document_id.to_string(),
            event_type,
            object_key,
        })
    }
}

fn deletion_record(document_id: &str, event_type: DocumentEventType) -> ContentMap {
    let mut record = ContentMap::new();
    record.insert("page_id".into(), Value::from(document_id));
    record.insert("event_type".into(), Value::from(event_type.as_str()));
    record
}
