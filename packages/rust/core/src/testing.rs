//! In-memory collaborators for orchestrator tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use docflow_shared::{
    ContentMap, ContentSource, DocflowError, DocumentEventType, ObjectStore, Result, SaveReceipt,
    TriggerReceipt, WorkflowTrigger,
};

pub(crate) fn content(value: Value) -> ContentMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Serves one fixed page, or fails when none is set.
pub(crate) struct FakeSource {
    page: Option<ContentMap>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub(crate) fn returning(page: ContentMap) -> Self {
        Self {
            page: Some(page),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            page: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn get_page(&self, document_id: &str) -> Result<ContentMap> {
        self.calls.lock().unwrap().push(document_id.to_string());
        self.page
            .clone()
            .ok_or_else(|| DocflowError::content_source(format!("HTTP 404 for page {document_id}")))
    }
}

/// Map-backed object store addressing objects as `mem://{bucket}/{key}`.
pub(crate) struct MemoryStore {
    bucket: &'static str,
    fail_saves: bool,
    pub objects: Mutex<BTreeMap<String, ContentMap>>,
    pub saves: Mutex<Vec<String>>,
    pub reads: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub(crate) fn new(bucket: &'static str) -> Self {
        Self {
            bucket,
            fail_saves: false,
            objects: Mutex::new(BTreeMap::new()),
            saves: Mutex::new(Vec::new()),
            reads: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(bucket: &'static str) -> Self {
        Self {
            fail_saves: true,
            ..Self::new(bucket)
        }
    }

    pub(crate) fn uri(&self, key: &str) -> String {
        format!("mem://{}/{key}", self.bucket)
    }

    /// Seed an object and return its URI.
    pub(crate) fn insert(&self, key: &str, document: ContentMap) -> String {
        let uri = self.uri(key);
        self.objects.lock().unwrap().insert(uri.clone(), document);
        uri
    }

    pub(crate) fn object(&self, key: &str) -> Option<ContentMap> {
        self.objects.lock().unwrap().get(&self.uri(key)).cloned()
    }

    pub(crate) fn saved_keys(&self) -> Vec<String> {
        self.saves.lock().unwrap().clone()
    }

    pub(crate) fn read_count(&self) -> usize {
        self.reads.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn save(&self, key: &str, content: &ContentMap) -> Result<SaveReceipt> {
        self.saves.lock().unwrap().push(key.to_string());
        if self.fail_saves {
            return Err(DocflowError::object_store(format!("write of {key} refused")));
        }

        let uri = self.uri(key);
        self.objects
            .lock()
            .unwrap()
            .insert(uri.clone(), content.clone());
        Ok(SaveReceipt {
            uri,
            request_id: "req-1".into(),
            content_hash: "hash".into(),
        })
    }

    async fn get_document_from_uri(&self, uri: &str) -> Result<ContentMap> {
        self.reads.lock().unwrap().push(uri.to_string());
        self.objects
            .lock()
            .unwrap()
            .get(uri)
            .cloned()
            .ok_or_else(|| DocflowError::object_store(format!("object not found: {uri}")))
    }
}

/// Records every trigger call.
#[derive(Default)]
pub(crate) struct FakeTrigger {
    fail: bool,
    pub calls: Mutex<Vec<(String, DocumentEventType, String)>>,
}

impl FakeTrigger {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, DocumentEventType, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkflowTrigger for FakeTrigger {
    async fn trigger(
        &self,
        document_id: &str,
        event_type: DocumentEventType,
        document_uri: &str,
    ) -> Result<TriggerReceipt> {
        self.calls.lock().unwrap().push((
            document_id.to_string(),
            event_type,
            document_uri.to_string(),
        ));
        if self.fail {
            return Err(DocflowError::workflow("HTTP 500 starting execution"));
        }
        Ok(TriggerReceipt {
            execution_id: format!("exec-{document_id}"),
            started_at: None,
        })
    }
}
