//! Hosting boundary: raw event payloads in, status-coded JSON responses out.
//!
//! Accepted payload shapes:
//! - a direct event object: `{"document_id": "42", "event_type": "updated"}`
//! - an envelope whose `body` is that object, or that object encoded as a JSON string
//!
//! `page_id` is accepted in place of `document_id` for older producers.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};
use uuid::Uuid;

use docflow_shared::{ContentMap, DocflowError, DocumentEvent, Result};

use crate::extract::ExtractOrchestrator;
use crate::process::ProcessOrchestrator;

/// Unwrap an inbound payload into the event object it carries.
pub fn parse_event_payload(payload: Value) -> Result<ContentMap> {
    let mut object = match payload {
        Value::Object(object) => object,
        other => {
            return Err(DocflowError::parse(format!(
                "event payload must be a JSON object, got {}",
                json_kind(&other)
            )));
        }
    };

    match object.remove("body") {
        None => Ok(object),
        Some(Value::Object(body)) => Ok(body),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(body)) => Ok(body),
            Ok(other) => Err(DocflowError::parse(format!(
                "event body must be a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(DocflowError::parse(format!("event body is not valid JSON: {e}"))),
        },
        Some(other) => Err(DocflowError::parse(format!(
            "event body must be a JSON object or string, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Loosely-typed event fields as read from a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentRequest {
    pub document_id: Option<String>,
    pub event_type: Option<String>,
    pub document_uri: Option<String>,
}

impl DocumentRequest {
    pub fn from_payload(payload: &ContentMap) -> Self {
        Self {
            document_id: string_field(payload, "document_id")
                .or_else(|| string_field(payload, "page_id")),
            event_type: string_field(payload, "event_type"),
            document_uri: string_field(payload, "document_uri"),
        }
    }

    /// Validate into a [`DocumentEvent`].
    pub fn to_event(&self) -> Result<DocumentEvent> {
        DocumentEvent::from_parts(
            self.document_id.as_deref(),
            self.event_type.as_deref(),
            self.document_uri.as_deref(),
        )
    }
}

/// Strings as-is; numbers by their decimal form; anything else is absent.
fn string_field(payload: &ContentMap, name: &str) -> Option<String> {
    match payload.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Status-coded response returned to the hosting layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationResponse {
    pub status_code: u16,
    pub correlation_id: String,
    pub body: Value,
}

impl InvocationResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    fn ok(correlation_id: String, result: Value) -> Self {
        let mut body = result;
        if let Value::Object(fields) = &mut body {
            fields.insert("status".into(), Value::from("OK"));
            fields.insert("correlation_id".into(), Value::from(correlation_id.as_str()));
        }
        Self {
            status_code: 200,
            correlation_id,
            body,
        }
    }

    fn failure(correlation_id: String, error: &DocflowError) -> Self {
        let status_code = if error.is_client_error() { 400 } else { 500 };
        if status_code == 400 {
            warn!(%correlation_id, error = %error, "rejected event");
        } else {
            error!(%correlation_id, error = %error, "event processing failed");
        }

        Self {
            status_code,
            body: json!({ "error": error.to_string(), "correlation_id": correlation_id }),
            correlation_id,
        }
    }
}

fn correlation_id_or_new(correlation_id: Option<String>) -> String {
    correlation_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}

fn read_event(payload: Value) -> Result<DocumentEvent> {
    let fields = parse_event_payload(payload)?;
    DocumentRequest::from_payload(&fields).to_event()
}

fn to_body<T: Serialize>(result: &T) -> Result<Value> {
    serde_json::to_value(result).map_err(|e| DocflowError::parse(e.to_string()))
}

/// Run the ingest path for a raw payload.
pub async fn handle_process(
    orchestrator: &ProcessOrchestrator,
    payload: Value,
    correlation_id: Option<String>,
) -> InvocationResponse {
    let correlation_id = correlation_id_or_new(correlation_id);
    info!(%correlation_id, "process invocation");

    let outcome = async {
        let event = read_event(payload)?;
        let result = orchestrator.process(&event).await?;
        to_body(&result)
    }
    .await;

    match outcome {
        Ok(body) => InvocationResponse::ok(correlation_id, body),
        Err(e) => InvocationResponse::failure(correlation_id, &e),
    }
}

/// Run the extraction path for a raw payload.
pub async fn handle_extract(
    orchestrator: &ExtractOrchestrator,
    payload: Value,
    correlation_id: Option<String>,
) -> InvocationResponse {
    let correlation_id = correlation_id_or_new(correlation_id);
    info!(%correlation_id, "extract invocation");

    let outcome = async {
        let event = read_event(payload)?;
        let result = orchestrator.extract(&event).await?;
        to_body(&result)
    }
    .await;

    match outcome {
        Ok(body) => InvocationResponse::ok(correlation_id, body),
        Err(e) => InvocationResponse::failure(correlation_id, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_key::FixedClock;
    use crate::reporter::SilentReporter;
    use crate::testing::{FakeSource, FakeTrigger, MemoryStore, content};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn process_orchestrator(trigger: FakeTrigger) -> ProcessOrchestrator {
        ProcessOrchestrator::new(
            Arc::new(FakeSource::returning(content(json!({"id": "42"})))),
            Arc::new(MemoryStore::new("landing")),
            Arc::new(trigger),
            Arc::new(SilentReporter),
        )
        .with_clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 3, 1, 15, 4, 5).unwrap(),
        )))
    }

    // --- Payload parsing ---

    #[test]
    fn parses_direct_and_enveloped_payloads() {
        let direct = parse_event_payload(json!({"document_id": "1", "event_type": "updated"}));
        assert_eq!(direct.unwrap()["document_id"], "1");

        let object_body = parse_event_payload(json!({"body": {"document_id": "2"}}));
        assert_eq!(object_body.unwrap()["document_id"], "2");

        let string_body =
            parse_event_payload(json!({"body": "{\"document_id\": \"3\", \"event_type\": \"deleted\"}"}));
        assert_eq!(string_body.unwrap()["event_type"], "deleted");
    }

    #[test]
    fn rejects_malformed_payloads() {
        for payload in [
            json!("just a string"),
            json!({"body": "{not json"}),
            json!({"body": "[1, 2]"}),
            json!({"body": 17}),
        ] {
            let err = parse_event_payload(payload).unwrap_err();
            assert!(matches!(err, DocflowError::Parse { .. }));
        }
    }

    #[test]
    fn legacy_page_id_is_accepted() {
        let fields = content(json!({"page_id": 1732083713, "event_type": "deleted"}));
        let event = DocumentRequest::from_payload(&fields).to_event().unwrap();
        assert_eq!(event.document_id(), "1732083713");

        let both = content(json!({"document_id": "new", "page_id": "old", "event_type": "updated"}));
        assert_eq!(
            DocumentRequest::from_payload(&both).document_id.as_deref(),
            Some("new")
        );
    }

    // --- Handlers ---

    #[tokio::test]
    async fn process_success_response() {
        let orchestrator = process_orchestrator(FakeTrigger::default());
        let response = handle_process(
            &orchestrator,
            json!({"body": "{\"document_id\": \"42\", \"event_type\": \"updated\"}"}),
            Some("corr-1".into()),
        )
        .await;

        assert!(response.is_success());
        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.body,
            json!({
                "document_id": "42",
                "event_type": "updated",
                "object_key": "42_20240301T100405-0500.json",
                "status": "OK",
                "correlation_id": "corr-1"
            })
        );
    }

    #[tokio::test]
    async fn client_errors_map_to_400() {
        let orchestrator = process_orchestrator(FakeTrigger::default());

        for payload in [
            json!({"event_type": "updated"}),
            json!({"document_id": "42", "event_type": "created"}),
            json!({"body": "{oops"}),
        ] {
            let response = handle_process(&orchestrator, payload, None).await;
            assert_eq!(response.status_code, 400);
            assert!(response.body["error"].is_string());
            assert_eq!(response.body["correlation_id"], response.correlation_id.as_str());
            assert!(!response.correlation_id.is_empty());
        }
    }

    #[tokio::test]
    async fn collaborator_errors_map_to_500() {
        let orchestrator = process_orchestrator(FakeTrigger::failing());
        let response = handle_process(
            &orchestrator,
            json!({"document_id": "42", "event_type": "updated"}),
            None,
        )
        .await;

        assert_eq!(response.status_code, 500);
        assert!(
            response.body["error"]
                .as_str()
                .unwrap()
                .contains("workflow trigger")
        );
    }

    #[tokio::test]
    async fn extract_requires_document_uri() {
        let orchestrator = ExtractOrchestrator::new(
            Arc::new(MemoryStore::new("landing")),
            Arc::new(MemoryStore::new("ground-truth")),
            Arc::new(SilentReporter),
        );
        let response = handle_extract(
            &orchestrator,
            json!({"document_id": "42", "event_type": "updated"}),
            None,
        )
        .await;

        assert_eq!(response.status_code, 400);
        assert!(response.body["error"].as_str().unwrap().contains("document_uri"));
    }

    #[tokio::test]
    async fn extract_success_response() {
        let landing = Arc::new(MemoryStore::new("landing"));
        let uri = landing.insert("landing/42.json", content(json!({"id": "42"})));
        let orchestrator = ExtractOrchestrator::new(
            landing,
            Arc::new(MemoryStore::new("ground-truth")),
            Arc::new(SilentReporter),
        );

        let response = handle_extract(
            &orchestrator,
            json!({"document_id": "42", "event_type": "updated", "document_uri": uri}),
            Some("corr-2".into()),
        )
        .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body["object_key"], "42.html");
        assert_eq!(response.body["status"], "OK");
    }
}
