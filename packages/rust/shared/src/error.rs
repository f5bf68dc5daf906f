//! Error types for docflow.
//!
//! Library crates use [`DocflowError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::fmt;
use std::path::PathBuf;

/// The external collaborator that produced a [`DocflowError::Collaborator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorKind {
    /// Document fetch from the content source.
    ContentSource,
    /// Landing or ground-truth object storage.
    ObjectStore,
    /// Downstream workflow dispatch.
    WorkflowTrigger,
    /// Credential resolution.
    SecretStore,
}

impl fmt::Display for CollaboratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ContentSource => "content source",
            Self::ObjectStore => "object store",
            Self::WorkflowTrigger => "workflow trigger",
            Self::SecretStore => "secret store",
        };
        f.write_str(name)
    }
}

/// Top-level error type for all docflow operations.
#[derive(Debug, thiserror::Error)]
pub enum DocflowError {
    /// A required field is absent or empty on the inbound event.
    #[error("missing required data: {message}")]
    MissingRequiredData { message: String },

    /// Event kind outside the recognized set.
    #[error("unsupported event type: {0}")]
    UnsupportedEventType(String),

    /// Failure reported by an external collaborator (fetch, store, trigger, secret).
    #[error("{kind} failure: {message}")]
    Collaborator {
        kind: CollaboratorKind,
        message: String,
    },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed inbound payload.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Data validation error (malformed URI, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocflowError>;

impl DocflowError {
    /// Create a missing-data error from any displayable message.
    pub fn missing(msg: impl Into<String>) -> Self {
        Self::MissingRequiredData {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn content_source(msg: impl Into<String>) -> Self {
        Self::collaborator(CollaboratorKind::ContentSource, msg)
    }

    pub fn object_store(msg: impl Into<String>) -> Self {
        Self::collaborator(CollaboratorKind::ObjectStore, msg)
    }

    pub fn workflow(msg: impl Into<String>) -> Self {
        Self::collaborator(CollaboratorKind::WorkflowTrigger, msg)
    }

    pub fn secret_store(msg: impl Into<String>) -> Self {
        Self::collaborator(CollaboratorKind::SecretStore, msg)
    }

    fn collaborator(kind: CollaboratorKind, msg: impl Into<String>) -> Self {
        Self::Collaborator {
            kind,
            message: msg.into(),
        }
    }

    /// Whether the error stems from the caller's input rather than from a
    /// collaborator or the environment.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingRequiredData { .. }
                | Self::UnsupportedEventType(_)
                | Self::Parse { .. }
                | Self::Validation { .. }
        )
    }
}
