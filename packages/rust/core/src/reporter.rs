//! Lifecycle reporting injected into the orchestrators.

use std::fmt;

use tracing::{info, warn};

use docflow_shared::DocflowError;

/// A step in a document's lifecycle.
///
/// Process path: `Received → Fetched | Synthesized → Landed → Triggered`.
/// Extract path: `Referenced → Retrieved → Transformed → Stored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Received,
    Fetched,
    Synthesized,
    Landed,
    Triggered,
    Referenced,
    Retrieved,
    Transformed,
    Stored,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Fetched => "fetched",
            Self::Synthesized => "synthesized",
            Self::Landed => "landed",
            Self::Triggered => "triggered",
            Self::Referenced => "referenced",
            Self::Retrieved => "retrieved",
            Self::Transformed => "transformed",
            Self::Stored => "stored",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives lifecycle notifications from an orchestrator.
pub trait StageReporter: Send + Sync {
    /// Called when `document_id` reaches `stage`.
    fn stage(&self, document_id: &str, stage: Stage, detail: &str);
    /// Called when the step after the last reported stage fails.
    fn failed(&self, document_id: &str, error: &DocflowError);
}

/// Emits one structured `tracing` event per stage.
#[derive(Debug, Clone)]
pub struct TracingReporter {
    component: &'static str,
}

impl TracingReporter {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }
}

impl StageReporter for TracingReporter {
    fn stage(&self, document_id: &str, stage: Stage, detail: &str) {
        info!(
            component = self.component,
            document_id,
            stage = stage.as_str(),
            detail,
            "document stage reached"
        );
    }

    fn failed(&self, document_id: &str, error: &DocflowError) {
        warn!(
            component = self.component,
            document_id,
            error = %error,
            "document pipeline halted"
        );
    }
}

/// No-op reporter for headless/test usage.
pub struct SilentReporter;

impl StageReporter for SilentReporter {
    fn stage(&self, _document_id: &str, _stage: Stage, _detail: &str) {}
    fn failed(&self, _document_id: &str, _error: &DocflowError) {}
}
