//! Application configuration for docflow.
//!
//! User config lives at `~/.docflow/docflow.toml`.
//! CLI flags (and their environment variables) override config file values,
//! which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocflowError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docflow.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docflow";

// ---------------------------------------------------------------------------
// Config structs (matching docflow.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment and log level.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Upstream content source.
    #[serde(default)]
    pub source: SourceConfig,

    /// Secret store location.
    #[serde(default)]
    pub secrets: SecretsConfig,

    /// Object database.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Landing zone (raw payloads).
    #[serde(default = "default_landing")]
    pub landing: ZoneConfig,

    /// Ground-truth zone (structured metadata).
    #[serde(default = "default_ground_truth")]
    pub ground_truth: ZoneConfig,

    /// Downstream workflow trigger.
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

/// `[runtime]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Deployment environment: dev, qa, uat, or prod.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Requested log level (debug, info, error, silent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: None,
        }
    }
}

fn default_environment() -> String {
    "dev".into()
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the Confluence instance (including `/wiki`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the secret holding `user_api_mail` and `api_token`.
    #[serde(default = "default_secret_name")]
    pub secret_name: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            secret_name: default_secret_name(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://example.atlassian.net/wiki".into()
}
fn default_secret_name() -> String {
    "confluence-api".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[secrets]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Directory containing `<secret-name>.json` files.
    #[serde(default = "default_secrets_dir")]
    pub dir: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            dir: default_secrets_dir(),
        }
    }
}

fn default_secrets_dir() -> String {
    "~/.docflow/secrets".into()
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the embedded object database.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "~/.docflow/objects.db".into()
}

/// `[landing]` / `[ground_truth]` sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Bucket name.
    pub bucket: String,
    /// Key prefix prepended to every object key (no trailing slash).
    #[serde(default)]
    pub prefix: String,
}

fn default_landing() -> ZoneConfig {
    ZoneConfig {
        bucket: "landing".into(),
        prefix: "landing".into(),
    }
}

fn default_ground_truth() -> ZoneConfig {
    ZoneConfig {
        bucket: "ground-truth".into(),
        prefix: "vigente".into(),
    }
}

/// `[workflow]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Endpoint that starts workflow executions. Required for the process path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Name of the state machine to start.
    #[serde(default = "default_state_machine")]
    pub state_machine: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            state_machine: default_state_machine(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_state_machine() -> String {
    "docflow-extract".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            source: SourceConfig::default(),
            secrets: SecretsConfig::default(),
            storage: StorageConfig::default(),
            landing: default_landing(),
            ground_truth: default_ground_truth(),
            workflow: WorkflowConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Log level resolution
// ---------------------------------------------------------------------------

/// Resolve the default tracing filter directive for an environment.
///
/// `uat`/`prod` always log at `info`. `dev`/`qa` stay silent unless a level is
/// requested explicitly. Unknown levels resolve to `off`.
pub fn resolve_log_filter(environment: &str, log_level: Option<&str>) -> &'static str {
    let env = environment.to_lowercase();
    if env == "uat" || env == "prod" {
        return "info";
    }

    match log_level.map(str::to_uppercase).as_deref() {
        Some("DEBUG") => "debug",
        Some("INFO") => "info",
        Some("ERROR") => "error",
        _ => "off",
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docflow/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| DocflowError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docflow/docflow.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| DocflowError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocflowError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocflowError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocflowError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocflowError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocflowError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
