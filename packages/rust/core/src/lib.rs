//! Event-to-artifact pipeline for docflow.
//!
//! Two orchestrators form a two-stage pipeline:
//! - [`ProcessOrchestrator`]: fetch (or synthesize) a page, land the raw JSON,
//!   start the downstream workflow
//! - [`ExtractOrchestrator`]: read the landed JSON, transform it, store the
//!   general and filter metadata records
//!
//! [`invocation`] adapts both to raw JSON payloads; [`wiring`] builds them
//! from configuration.

pub mod extract;
pub mod invocation;
pub mod object_key;
pub mod process;
pub mod reporter;
pub mod wiring;

#[cfg(test)]
mod testing;

pub use extract::{ExtractOrchestrator, data_object_key, metadata_object_key};
pub use invocation::{
    DocumentRequest, InvocationResponse, handle_extract, handle_process, parse_event_payload,
};
pub use object_key::{Clock, FixedClock, SystemClock, build_object_key, lima_offset};
pub use process::ProcessOrchestrator;
pub use reporter::{SilentReporter, Stage, StageReporter, TracingReporter};
pub use wiring::{Zones, build_extract_orchestrator, build_process_orchestrator, open_zones};
