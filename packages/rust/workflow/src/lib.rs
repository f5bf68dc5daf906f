//! HTTP workflow trigger.
//!
//! Starts one execution of the configured state machine per landed document by
//! POSTing to an execution endpoint:
//!
//! ```json
//! {
//!   "stateMachine": "docflow-extract",
//!   "name": "42-0190c2e4-...",
//!   "input": "{\"document_id\":\"42\",\"event_type\":\"updated\",\"document_uri\":\"object://...\"}"
//! }
//! ```
//!
//! The response body is decoded as a [`TriggerReceipt`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, instrument};
use url::Url;
use uuid::Uuid;

use docflow_shared::{DocflowError, DocumentEventType, Result, TriggerReceipt, WorkflowTrigger};

/// User-Agent string for trigger requests.
const USER_AGENT: &str = concat!("docflow/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartExecution<'a> {
    state_machine: &'a str,
    name: String,
    /// JSON-encoded [`ExecutionInput`].
    input: String,
}

#[derive(Debug, Serialize)]
struct ExecutionInput<'a> {
    document_id: &'a str,
    event_type: DocumentEventType,
    document_uri: &'a str,
}

/// [`WorkflowTrigger`] backed by an HTTP execution endpoint.
pub struct HttpWorkflowTrigger {
    client: Client,
    endpoint: Url,
    state_machine: String,
}

impl HttpWorkflowTrigger {
    /// Build a trigger for `endpoint`. An unparsable endpoint is a config error.
    pub fn new(endpoint: &str, state_machine: impl Into<String>, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            DocflowError::config(format!("invalid workflow endpoint {endpoint:?}: {e}"))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| DocflowError::workflow(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            state_machine: state_machine.into(),
        })
    }
}

#[async_trait]
impl WorkflowTrigger for HttpWorkflowTrigger {
    #[instrument(skip(self), fields(state_machine = %self.state_machine))]
    async fn trigger(
        &self,
        document_id: &str,
        event_type: DocumentEventType,
        document_uri: &str,
    ) -> Result<TriggerReceipt> {
        let input = serde_json::to_string(&ExecutionInput {
            document_id,
            event_type,
            document_uri,
        })
        .map_err(|e| DocflowError::workflow(format!("failed to encode input: {e}")))?;

        let request = StartExecution {
            state_machine: &self.state_machine,
            name: format!("{document_id}-{}", Uuid::now_v7()),
            input,
        };

        let response = self
            .client
            .post(self.endpoint.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| DocflowError::workflow(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocflowError::workflow(format!(
                "HTTP {} starting execution {}",
                status.as_u16(),
                request.name
            )));
        }

        let receipt: TriggerReceipt = response
            .json()
            .await
            .map_err(|e| DocflowError::workflow(format!("invalid execution receipt: {e}")))?;

        info!(execution_id = %receipt.execution_id, name = %request.name, "workflow started");
        Ok(receipt)
    }
}
