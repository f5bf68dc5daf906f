//! Core domain types for docflow events, results, and metadata records.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocflowError, Result};

/// A JSON object as exchanged with collaborators (fetched pages, landed payloads).
pub type ContentMap = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// DocumentEventType
// ---------------------------------------------------------------------------

/// Why a document changed upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum DocumentEventType {
    Updated,
    Deleted,
}

impl DocumentEventType {
    /// Wire representation (`"updated"` / `"deleted"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for DocumentEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentEventType {
    type Err = DocflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            other => Err(DocflowError::UnsupportedEventType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentEvent
// ---------------------------------------------------------------------------

/// An inbound change notification for a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEvent {
    document_id: String,
    event_type: DocumentEventType,
    document_uri: Option<String>,
}

impl DocumentEvent {
    pub fn new(document_id: impl Into<String>, event_type: DocumentEventType) -> Self {
        Self {
            document_id: document_id.into(),
            event_type,
            document_uri: None,
        }
    }

    /// Attach the location of a previously landed raw object (extraction path).
    pub fn with_document_uri(mut self, uri: impl Into<String>) -> Self {
        self.document_uri = Some(uri.into());
        self
    }

    /// Build an event from loosely-typed inbound fields.
    ///
    /// Absent or empty `document_id`/`event_type` fail with
    /// [`DocflowError::MissingRequiredData`]; an unknown kind fails with
    /// [`DocflowError::UnsupportedEventType`].
    pub fn from_parts(
        document_id: Option<&str>,
        event_type: Option<&str>,
        document_uri: Option<&str>,
    ) -> Result<Self> {
        let document_id = document_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DocflowError::missing("document_id is required"))?;
        let event_type: DocumentEventType = event_type
            .filter(|kind| !kind.is_empty())
            .ok_or_else(|| DocflowError::missing("event_type is required"))?
            .parse()?;

        Ok(Self {
            document_id: document_id.to_string(),
            event_type,
            document_uri: document_uri.map(str::to_string),
        })
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn event_type(&self) -> DocumentEventType {
        self.event_type
    }

    pub fn document_uri(&self) -> Option<&str> {
        self.document_uri.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of landing a raw payload on the process path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessResult {
    pub document_id: String,
    pub event_type: DocumentEventType,
    /// Key under which the raw payload was landed.
    pub object_key: String,
}

/// Outcome of storing structured metadata on the extract path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractResult {
    pub document_id: String,
    pub event_type: DocumentEventType,
    /// Content key written to the ground-truth zone.
    pub object_key: String,
}

// ---------------------------------------------------------------------------
// Collaborator receipts
// ---------------------------------------------------------------------------

/// Location descriptor returned by an object store after a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReceipt {
    /// Canonical URI of the stored object.
    pub uri: String,
    /// Identifier of the write request.
    pub request_id: String,
    /// SHA-256 hex digest of the stored body.
    pub content_hash: String,
}

/// Acknowledgement returned by the workflow trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerReceipt {
    #[serde(alias = "executionArn")]
    pub execution_id: String,
    #[serde(default, alias = "startDate", skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
}

/// Named credential values resolved from a secret store.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, String>);

// Values are secret; only the names are printed.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

impl Credentials {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ---------------------------------------------------------------------------
// Metadata records
// ---------------------------------------------------------------------------

/// General page metadata: four fixed keys plus one entry per header-table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneralMetadata(BTreeMap<String, Value>);

impl GeneralMetadata {
    /// Insert or overwrite an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_content_map(self) -> ContentMap {
        self.0.into_iter().collect()
    }
}

/// Filterable attributes, nested under `metadataAttributes` when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterMetadata {
    #[serde(rename = "metadataAttributes")]
    pub metadata_attributes: FilterAttributes,
}

/// The fixed, non-extensible attribute set used for search filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterAttributes {
    pub id: String,
    pub title: String,
    pub space: String,
    pub spacename: String,
    pub spacetype: String,
    pub spacestatus: String,
    #[serde(rename = "base64EncodedAri")]
    pub base64_encoded_ari: String,
    pub ari: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
}

impl FilterMetadata {
    pub fn into_content_map(self) -> ContentMap {
        let mut map = ContentMap::new();
        map.insert(
            "metadataAttributes".to_string(),
            Value::Object(self.metadata_attributes.into_content_map()),
        );
        map
    }
}

impl FilterAttributes {
    /// Attributes keyed by their serialized names.
    pub fn into_content_map(self) -> ContentMap {
        [
            ("id", self.id),
            ("title", self.title),
            ("space", self.space),
            ("spacename", self.spacename),
            ("spacetype", self.spacetype),
            ("spacestatus", self.spacestatus),
            ("base64EncodedAri", self.base64_encoded_ari),
            ("ari", self.ari),
            ("type", self.kind),
            ("status", self.status),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), Value::String(value)))
        .collect()
    }
}
