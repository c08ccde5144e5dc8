//! Document models and the persistence seam for labelkit.
//!
//! Projects, samples, and users are independently persisted documents.
//! The [`store::DocumentStore`] trait exposes the only primitives the
//! engine relies on: revisioned reads, conditional writes, and a few
//! range/count queries over samples. [`memory::MemoryStore`] is the
//! in-process reference adapter.

pub mod memory;
pub mod models;
pub mod store;

pub use memory::MemoryStore;
pub use store::{DocumentStore, Revision, StoreError, Versioned};
