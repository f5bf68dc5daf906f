//! Deterministic object keys for landed payloads.

use chrono::{DateTime, FixedOffset, Utc};

use docflow_shared::{DocflowError, DocumentEventType, Result};

/// Offset of America/Lima (no daylight saving), in seconds west of UTC.
const LIMA_OFFSET_SECS: i32 = 5 * 3600;

/// Source of the current instant, injected so keys can be built against a
/// fixed time in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The UTC-5 civil offset keys are rendered in.
pub fn lima_offset() -> FixedOffset {
    FixedOffset::west_opt(LIMA_OFFSET_SECS).expect("offset within one day")
}

/// Build the landing key for a document event at `now`.
///
/// `{document_id}_{%Y%m%dT%H%M%S}-0500.json`, with `_deleted` before the
/// extension for deletions. Keys have second resolution, so two events for
/// the same document within one second share a key.
pub fn build_object_key(
    document_id: &str,
    event_type: DocumentEventType,
    now: DateTime<Utc>,
) -> Result<String> {
    if document_id.is_empty() {
        return Err(DocflowError::missing("document_id is required to build a key"));
    }

    let stamp = now.with_timezone(&lima_offset()).format("%Y%m%dT%H%M%S%z");

    match event_type {
        DocumentEventType::Updated => Ok(format!("{document_id}_{stamp}.json")),
        DocumentEventType::Deleted => Ok(format!("{document_id}_{stamp}_deleted.json")),
        other => Err(DocflowError::UnsupportedEventType(other.to_string())),
    }
}
