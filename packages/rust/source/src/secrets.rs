//! File-backed secret store.
//!
//! Each secret is a flat JSON object of string values stored as
//! `{dir}/{name}.json`.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use docflow_shared::{Credentials, SecretStore};

/// Resolves secrets from JSON files under a directory.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    dir: PathBuf,
}

impl FileSecretStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn secret_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_secret(&self, name: &str) -> Credentials {
        let path = self.secret_path(name);

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                // Error kind only, never the message.
                warn!(secret = name, kind = ?e.kind(), "secret could not be read");
                return Credentials::default();
            }
        };

        match serde_json::from_str::<Credentials>(&raw) {
            Ok(credentials) => {
                debug!(secret = name, "secret resolved");
                credentials
            }
            Err(e) => {
                warn!(secret = name, kind = ?e.classify(), "secret is not a flat JSON object of strings");
                Credentials::default()
            }
        }
    }
}
