//! The labelkit workflow engine: services composing the pure core with
//! the document store.
//!
//! Three services cover the public operations:
//!
//! - [`ProjectService`] — the phase controller: `create_project`,
//!   `join_project`, `turn_to_next_phase` (which plans divisions and
//!   runs the monthly tally at the right transitions).
//! - [`SampleService`] — annotator actions on individual samples.
//! - [`IngestService`] — bulk sample loading as a trackable background
//!   job.
//!
//! Every mutating operation runs a bounded read-modify-write loop over
//! the store's revisioned primitives; exhausting the bound surfaces
//! [`CoreError::Conflict`](labelkit_core::CoreError::Conflict).

pub mod config;
pub mod ingest;
pub mod project;
pub mod sample;

pub use config::EngineConfig;
pub use ingest::{IngestJob, IngestJobStatus, IngestService};
pub use project::{PhaseTurn, ProjectService};
pub use sample::SampleService;
