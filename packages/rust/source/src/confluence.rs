//! Confluence Cloud REST client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use docflow_shared::{ContentMap, ContentSource, DocflowError, Result, SecretStore};

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("docflow/", env!("CARGO_PKG_VERSION"));

/// Expansions needed downstream: storage body, version number, space details.
const PAGE_EXPAND: &str = "body.storage,version,space";

const USER_KEY: &str = "user_api_mail";
const TOKEN_KEY: &str = "api_token";

/// Fetches pages from `GET {base_url}/rest/api/content/{id}`.
///
/// Credentials are resolved from the secret store on every call, so a rotated
/// token takes effect without rebuilding the client.
pub struct ConfluenceClient {
    client: Client,
    base_url: String,
    secrets: Arc<dyn SecretStore>,
    secret_name: String,
}

impl ConfluenceClient {
    pub fn new(
        base_url: impl Into<String>,
        secrets: Arc<dyn SecretStore>,
        secret_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DocflowError::content_source(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secrets,
            secret_name: secret_name.into(),
        })
    }

    fn page_url(&self, document_id: &str) -> Result<Url> {
        let raw = format!("{}/rest/api/content/{document_id}", self.base_url);
        let mut url = Url::parse(&raw)
            .map_err(|e| DocflowError::content_source(format!("invalid page URL {raw}: {e}")))?;
        url.query_pairs_mut().append_pair("expand", PAGE_EXPAND);
        Ok(url)
    }
}

#[async_trait]
impl ContentSource for ConfluenceClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn get_page(&self, document_id: &str) -> Result<ContentMap> {
        let credentials = self.secrets.get_secret(&self.secret_name).await;
        let (user, token) = match (credentials.get(USER_KEY), credentials.get(TOKEN_KEY)) {
            (Some(user), Some(token)) if !user.is_empty() && !token.is_empty() => (user, token),
            _ => {
                return Err(DocflowError::content_source(format!(
                    "credentials '{}' are missing {USER_KEY} or {TOKEN_KEY}",
                    self.secret_name
                )));
            }
        };

        let url = self.page_url(document_id)?;
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .header(ACCEPT, "application/json")
            .basic_auth(user, Some(token))
            .send()
            .await
            .map_err(|e| DocflowError::content_source(format!("page {document_id}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocflowError::content_source(format!(
                "HTTP {} for page {document_id}",
                status.as_u16()
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            DocflowError::content_source(format!("page {document_id}: invalid JSON body: {e}"))
        })?;

        match body {
            Value::Object(page) => Ok(page),
            _ => Err(DocflowError::content_source(format!(
                "page {document_id}: expected a JSON object"
            ))),
        }
    }
}
