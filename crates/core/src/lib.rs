//! Pure domain logic for the labelkit annotation workflow engine.
//!
//! Everything in this crate is synchronous, CPU-bound, and free of I/O:
//! the project/sample lifecycle state machines, the division planner,
//! the schema-driven annotation validator, and the monthly tally
//! arithmetic. The `db` and `engine` crates compose these pieces with
//! persistence and concurrency control.

pub mod annotation;
pub mod division;
pub mod error;
pub mod limits;
pub mod monthly;
pub mod phase;
pub mod schema;
pub mod types;

pub use error::{CoreError, NotAllowedReason};
