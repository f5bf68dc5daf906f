//! Turso Embedded / libSQL object storage (offline mode).
//!
//! The [`Storage`] struct wraps a libSQL database holding JSON objects keyed by
//! `(bucket, key)`. [`ObjectZone`] scopes it to one bucket and key prefix and
//! implements the [`ObjectStore`](docflow_shared::ObjectStore) port used by the
//! landing and ground-truth zones.

mod migrations;
mod zone;

use std::path::Path;

use chrono::Utc;
use docflow_shared::{DocflowError, Result};
use libsql::{Connection, Database, Row, params};
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub use zone::{OBJECT_URI_SCHEME, ObjectLocation, ObjectZone};

/// A stored object with its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub body: String,
    pub content_type: String,
    pub content_hash: String,
    pub content_len: u64,
    pub request_id: String,
    pub stored_at: String,
}

/// Listing entry for a stored object (body omitted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub content_hash: String,
    pub content_len: u64,
    pub stored_at: String,
}

/// Identity of a single write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub request_id: String,
    pub content_hash: String,
}

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocflowError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DocflowError::object_store(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| DocflowError::object_store(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        DocflowError::object_store(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Object operations
    // -----------------------------------------------------------------------

    /// Insert or overwrite the object at `(bucket, key)`.
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &str,
        content_type: &str,
    ) -> Result<WriteReceipt> {
        let request_id = Uuid::now_v7().to_string();
        let content_hash = content_hash(body);
        let now = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO objects (bucket, key, body, content_type, content_hash, content_len, request_id, stored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(bucket, key) DO UPDATE SET
                   body = excluded.body,
                   content_type = excluded.content_type,
                   content_hash = excluded.content_hash,
                   content_len = excluded.content_len,
                   request_id = excluded.request_id,
                   stored_at = excluded.stored_at",
                params![
                    bucket,
                    key,
                    body,
                    content_type,
                    content_hash.as_str(),
                    body.len() as i64,
                    request_id.as_str(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| DocflowError::object_store(format!("{bucket}/{key}: {e}")))?;

        tracing::debug!(bucket, key, %request_id, "object stored");
        Ok(WriteReceipt {
            request_id,
            content_hash,
        })
    }

    /// Get the object at `(bucket, key)`, if any.
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>> {
        let mut rows = self
            .conn
            .query(
                "SELECT bucket, key, body, content_type, content_hash, content_len, request_id, stored_at
                 FROM objects WHERE bucket = ?1 AND key = ?2",
                params![bucket, key],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_stored_object(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// List objects in `bucket` whose key starts with `prefix`, ordered by key.
    pub async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let mut rows = self
            .conn
            .query(
                "SELECT key, content_hash, content_len, stored_at
                 FROM objects WHERE bucket = ?1 AND substr(key, 1, length(?2)) = ?2
                 ORDER BY key",
                params![bucket, prefix],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(ObjectSummary {
                key: row.get::<String>(0).map_err(storage_err)?,
                content_hash: row.get::<String>(1).map_err(storage_err)?,
                content_len: row.get::<i64>(2).map_err(storage_err)? as u64,
                stored_at: row.get::<String>(3).map_err(storage_err)?,
            });
        }
        Ok(results)
    }
}

/// SHA-256 hex digest of an object body.
pub fn content_hash(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn storage_err(e: libsql::Error) -> DocflowError {
    DocflowError::object_store(e.to_string())
}

fn row_to_stored_object(row: &Row) -> Result<StoredObject> {
    Ok(StoredObject {
        bucket: row.get::<String>(0).map_err(storage_err)?,
        key: row.get::<String>(1).map_err(storage_err)?,
        body: row.get::<String>(2).map_err(storage_err)?,
        content_type: row.get::<String>(3).map_err(storage_err)?,
        content_hash: row.get::<String>(4).map_err(storage_err)?,
        content_len: row.get::<i64>(5).map_err(storage_err)? as u64,
        request_id: row.get::<String>(6).map_err(storage_err)?,
        stored_at: row.get::<String>(7).map_err(storage_err)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
