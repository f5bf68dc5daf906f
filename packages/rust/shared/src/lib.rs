//! Shared types, error model, collaborator ports, and configuration for docflow.
//!
//! This crate is the foundation depended on by all other docflow crates.
//! It provides:
//! - [`DocflowError`], the unified error type
//! - Domain types ([`DocumentEvent`], [`ProcessResult`], [`ExtractResult`],
//!   [`GeneralMetadata`], [`FilterMetadata`])
//! - Ports ([`ContentSource`], [`ObjectStore`], [`WorkflowTrigger`], [`SecretStore`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod ports;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, RuntimeConfig, SecretsConfig, SourceConfig, StorageConfig, WorkflowConfig,
    ZoneConfig, config_dir, config_file_path, expand_home, init_config, load_config,
    load_config_from, resolve_log_filter,
};
pub use error::{CollaboratorKind, DocflowError, Result};
pub use ports::{ContentSource, ObjectStore, SecretStore, WorkflowTrigger};
pub use types::{
    ContentMap, Credentials, DocumentEvent, DocumentEventType, ExtractResult, FilterAttributes,
    FilterMetadata, GeneralMetadata, ProcessResult, SaveReceipt, TriggerReceipt,
};
