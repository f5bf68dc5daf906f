//! Bucket/prefix-scoped view of [`Storage`] implementing the object store port.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use docflow_shared::{ContentMap, DocflowError, ObjectStore, Result, SaveReceipt};

use crate::{ObjectSummary, Storage, StoredObject};

/// URI scheme of object locations handed out by [`ObjectZone::save`].
pub const OBJECT_URI_SCHEME: &str = "object";

const JSON_CONTENT_TYPE: &str = "application/json";

/// A parsed `object://{bucket}/{key}` location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    /// Parse an object URI. A foreign scheme, an empty bucket or an empty key
    /// is a validation error.
    pub fn parse(uri: &str) -> Result<Self> {
        let url = Url::parse(uri)
            .map_err(|e| DocflowError::validation(format!("invalid object URI {uri:?}: {e}")))?;

        if url.scheme() != OBJECT_URI_SCHEME {
            return Err(DocflowError::validation(format!(
                "object URI {uri:?} must use the {OBJECT_URI_SCHEME}:// scheme"
            )));
        }

        let bucket = url.host_str().unwrap_or_default();
        if bucket.is_empty() {
            return Err(DocflowError::validation(format!(
                "object URI {uri:?} has no bucket"
            )));
        }

        let key = url.path().trim_start_matches('/');
        if key.is_empty() {
            return Err(DocflowError::validation(format!("object URI {uri:?} has no key")));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{OBJECT_URI_SCHEME}://{}/{}", self.bucket, self.key)
    }
}

/// One storage zone (landing or ground-truth): a bucket plus a key prefix.
#[derive(Clone)]
pub struct ObjectZone {
    storage: Arc<Storage>,
    bucket: String,
    prefix: String,
}

impl ObjectZone {
    pub fn new(storage: Arc<Storage>, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            storage,
            bucket: bucket.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Key under which `key` is stored in this zone.
    pub fn full_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{key}", self.prefix)
        }
    }

    /// Objects stored in this zone, ordered by key.
    pub async fn list(&self) -> Result<Vec<ObjectSummary>> {
        let prefix = if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        };
        self.storage.list_objects(&self.bucket, &prefix).await
    }

    /// Fetch a stored object by its full location, in any bucket.
    pub async fn get(&self, location: &ObjectLocation) -> Result<StoredObject> {
        self.storage
            .get_object(&location.bucket, &location.key)
            .await?
            .ok_or_else(|| DocflowError::object_store(format!("object not found: {location}")))
    }
}

#[async_trait]
impl ObjectStore for ObjectZone {
    #[instrument(skip(self, content), fields(bucket = %self.bucket))]
    async fn save(&self, key: &str, content: &ContentMap) -> Result<SaveReceipt> {
        let body = serde_json::to_string(content)
            .map_err(|e| DocflowError::object_store(format!("failed to encode {key}: {e}")))?;

        let location = ObjectLocation {
            bucket: self.bucket.clone(),
            key: self.full_key(key),
        };
        let write = self
            .storage
            .put_object(&location.bucket, &location.key, &body, JSON_CONTENT_TYPE)
            .await?;

        debug!(uri = %location, bytes = body.len(), "object saved");
        Ok(SaveReceipt {
            uri: location.to_string(),
            request_id: write.request_id,
            content_hash: write.content_hash,
        })
    }

    /// An unreadable URI is reported as a store failure, like a missing object.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get_document_from_uri(&self, uri: &str) -> Result<ContentMap> {
        let location = ObjectLocation::parse(uri).map_err(|e| match e {
            DocflowError::Validation { message } => DocflowError::object_store(message),
            other => other,
        })?;
        let object = self.get(&location).await?;

        match serde_json::from_str::<Value>(&object.body) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(DocflowError::object_store(format!(
                "{location} does not hold a JSON object"
            ))),
            Err(e) => Err(DocflowError::object_store(format!(
                "{location} holds invalid JSON: {e}"
            ))),
        }
    }
}
