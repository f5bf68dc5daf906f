//! Extraction path: read a landed page, transform it, store both metadata records.

use std::sync::Arc;

use tracing::instrument;

use docflow_shared::{DocflowError, DocumentEvent, ExtractResult, ObjectStore, Result};
use docflow_transform::extract_content;

use crate::reporter::{Stage, StageReporter};

/// Key of the general metadata record for a document.
pub fn data_object_key(document_id: &str) -> String {
    format!("{document_id}.html")
}

/// Key of the filter metadata record for a document.
pub fn metadata_object_key(document_id: &str) -> String {
    format!("{document_id}.metadata.html")
}

/// Turns landed raw pages into ground-truth metadata records.
pub struct ExtractOrchestrator {
    landing: Arc<dyn ObjectStore>,
    ground_truth: Arc<dyn ObjectStore>,
    reporter: Arc<dyn StageReporter>,
}

impl ExtractOrchestrator {
    pub fn new(
        landing: Arc<dyn ObjectStore>,
        ground_truth: Arc<dyn ObjectStore>,
        reporter: Arc<dyn StageReporter>,
    ) -> Self {
        Self {
            landing,
            ground_truth,
            reporter,
        }
    }

    /// Run the extraction path for one event carrying a `document_uri`.
    ///
    /// The data record is written before the metadata record; a failure on
    /// the second write leaves the first in place.
    #[instrument(skip_all, fields(document_id = %event.document_id(), event_type = %event.event_type()))]
    pub async fn extract(&self, event: &DocumentEvent) -> Result<ExtractResult> {
        let result = self.run(event).await;
        if let Err(e) = &result {
            self.reporter.failed(event.document_id(), e);
        }
        result
    }

    async fn run(&self, event: &DocumentEvent) -> Result<ExtractResult> {
        let document_id = event.document_id();
        if document_id.is_empty() {
            return Err(DocflowError::missing("event without document_id"));
        }
        let document_uri = event
            .document_uri()
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| DocflowError::missing("event without document_uri"))?;
        self.reporter.stage(document_id, Stage::Referenced, document_uri);

        let document = self.landing.get_document_from_uri(document_uri).await?;
        self.reporter
            .stage(document_id, Stage::Retrieved, &format!("{} fields", document.len()));

        let (general, filter) = extract_content(&document);
        self.reporter.stage(
            document_id,
            Stage::Transformed,
            &format!("{} general fields", general.len()),
        );

        let data_key = data_object_key(document_id);
        let metadata_key = metadata_object_key(document_id);

        let data_saved = self
            .ground_truth
            .save(&data_key, &general.into_content_map())
            .await?;
        let metadata_saved = self
            .ground_truth
            .save(&metadata_key, &filter.into_content_map())
            .await?;
        self.reporter.stage(
            document_id,
            Stage::Stored,
            &format!("{} {}", data_saved.uri, metadata_saved.uri),
        );

        Ok(ExtractResult {
            document_id: document_id.to_string(),
            event_type: event.event_type(),
            object_key: data_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::tests::RecordingReporter;
    use crate::testing::{MemoryStore, content};
    use docflow_shared::{CollaboratorKind, DocumentEventType};
    use serde_json::json;

    struct Harness {
        landing: Arc<MemoryStore>,
        ground_truth: Arc<MemoryStore>,
        reporter: Arc<RecordingReporter>,
        orchestrator: ExtractOrchestrator,
    }

    fn harness(ground_truth: MemoryStore) -> Harness {
        let landing = Arc::new(MemoryStore::new("landing"));
        let ground_truth = Arc::new(ground_truth);
        let reporter = Arc::new(RecordingReporter::default());
        let orchestrator =
            ExtractOrchestrator::new(landing.clone(), ground_truth.clone(), reporter.clone());
        Harness {
            landing,
            ground_truth,
            reporter,
            orchestrator,
        }
    }

    fn landed_page() -> serde_json::Value {
        json!({
            "id": "42",
            "title": "Runbook",
            "status": "current",
            "type": "page",
            "version": { "number": 5 },
            "space": { "key": "OPS", "name": "Operaciones", "type": "global", "status": "current" },
            "body": { "storage": { "value":
                "<table><tr><th>Dominio</th><td> Riesgos </td></tr></table><p>Texto</p>"
            } }
        })
    }

    #[tokio::test]
    async fn stores_general_and_filter_records() {
        let h = harness(MemoryStore::new("ground-truth"));
        let uri = h.landing.insert("landing/42_x.json", content(landed_page()));
        let event = DocumentEvent::new("42", DocumentEventType::Updated).with_document_uri(&uri);

        let result = h.orchestrator.extract(&event).await.unwrap();

        assert_eq!(
            result,
            ExtractResult {
                document_id: "42".into(),
                event_type: DocumentEventType::Updated,
                object_key: "42.html".into(),
            }
        );
        assert_eq!(h.ground_truth.saved_keys(), vec!["42.html", "42.metadata.html"]);

        let general = h.ground_truth.object("42.html").unwrap();
        assert_eq!(general["page_id"], "42");
        assert_eq!(general["page_version_number"], 5);
        assert_eq!(general["Dominio"], "Riesgos");

        let filter = h.ground_truth.object("42.metadata.html").unwrap();
        assert_eq!(filter["metadataAttributes"]["space"], "OPS");
        assert_eq!(filter["metadataAttributes"]["ari"], "");

        assert_eq!(
            h.reporter.stages(),
            vec![Stage::Referenced, Stage::Retrieved, Stage::Transformed, Stage::Stored]
        );
    }

    #[tokio::test]
    async fn empty_uri_fails_before_storage_is_called() {
        let h = harness(MemoryStore::new("ground-truth"));

        for event in [
            DocumentEvent::new("42", DocumentEventType::Updated),
            DocumentEvent::new("42", DocumentEventType::Updated).with_document_uri(""),
        ] {
            let err = h.orchestrator.extract(&event).await.unwrap_err();
            assert!(matches!(err, DocflowError::MissingRequiredData { .. }));
        }

        assert_eq!(h.landing.read_count(), 0);
        assert!(h.ground_truth.saved_keys().is_empty());
        assert_eq!(h.reporter.failures().len(), 2);
    }

    #[tokio::test]
    async fn missing_landed_object_propagates() {
        let h = harness(MemoryStore::new("ground-truth"));
        let event = DocumentEvent::new("42", DocumentEventType::Updated)
            .with_document_uri("mem://landing/absent.json");

        let err = h.orchestrator.extract(&event).await.unwrap_err();

        assert!(matches!(
            err,
            DocflowError::Collaborator { kind: CollaboratorKind::ObjectStore, .. }
        ));
        assert!(h.ground_truth.saved_keys().is_empty());
    }

    #[tokio::test]
    async fn failed_data_write_stops_before_metadata_write() {
        let h = harness(MemoryStore::failing("ground-truth"));
        let uri = h.landing.insert("landing/42_x.json", content(landed_page()));
        let event = DocumentEvent::new("42", DocumentEventType::Updated).with_document_uri(&uri);

        assert!(h.orchestrator.extract(&event).await.is_err());
        assert_eq!(h.ground_truth.saved_keys(), vec!["42.html"]);
        assert_eq!(
            h.reporter.stages(),
            vec![Stage::Referenced, Stage::Retrieved, Stage::Transformed]
        );
    }

    #[tokio::test]
    async fn deletion_record_extracts_to_empty_fields() {
        let h = harness(MemoryStore::new("ground-truth"));
        let uri = h.landing.insert(
            "landing/42_x_deleted.json",
            content(json!({"page_id": "42", "event_type": "deleted"})),
        );
        let event = DocumentEvent::new("42", DocumentEventType::Deleted).with_document_uri(&uri);

        let result = h.orchestrator.extract(&event).await.unwrap();
        assert_eq!(result.event_type, DocumentEventType::Deleted);

        let general = h.ground_truth.object("42.html").unwrap();
        assert_eq!(general.len(), 4);
        assert_eq!(general["page_id"], "");
    }
}
