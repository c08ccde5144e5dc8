//! The persistence seam: revisioned reads and conditional writes.
//!
//! Every document read returns a [`Revision`] token; every write must
//! present the token it read, and fails with
//! [`StoreError::RevisionMismatch`] when another writer got there
//! first. The engine wraps each mutating operation in a bounded
//! read-modify-write retry loop on top of these primitives.

use async_trait::async_trait;

use labelkit_core::error::CoreError;
use labelkit_core::phase::SampleStatus;
use labelkit_core::types::DbId;

use crate::models::{Project, Sample, User};

/// Opaque, monotonically increasing per-document revision token.
pub type Revision = u64;

/// A document together with the revision it was read at.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub doc: T,
    pub revision: Revision,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Stale revision for {entity} {id}: expected {expected}, found {found}")]
    RevisionMismatch {
        entity: &'static str,
        id: DbId,
        expected: Revision,
        found: Revision,
    },
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            StoreError::RevisionMismatch { .. } => CoreError::Conflict(err.to_string()),
        }
    }
}

/// Per-document read/conditional-write primitives plus the sample
/// queries the engine needs. Implementations must make each conditional
/// write atomic with respect to concurrent writers of the same
/// document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // -- projects -----------------------------------------------------------

    /// Insert a project. The store assigns the id; any id on the input
    /// is replaced.
    async fn insert_project(&self, doc: Project) -> Result<Versioned<Project>, StoreError>;

    async fn get_project(&self, id: DbId) -> Result<Versioned<Project>, StoreError>;

    /// Write a project back, conditioned on `expected` still being the
    /// current revision.
    async fn put_project(
        &self,
        doc: Project,
        expected: Revision,
    ) -> Result<Versioned<Project>, StoreError>;

    // -- samples ------------------------------------------------------------

    /// Insert a sample. The store assigns the id.
    async fn insert_sample(&self, doc: Sample) -> Result<Versioned<Sample>, StoreError>;

    async fn get_sample(&self, id: DbId) -> Result<Versioned<Sample>, StoreError>;

    async fn put_sample(
        &self,
        doc: Sample,
        expected: Revision,
    ) -> Result<Versioned<Sample>, StoreError>;

    /// All samples of a project, ordered by `number` ascending.
    async fn list_project_samples(&self, project_id: DbId) -> Result<Vec<Sample>, StoreError>;

    /// Samples of a project whose 0-based index (`number - 1`) falls in
    /// the inclusive range, ordered by `number` ascending.
    async fn samples_in_range(
        &self,
        project_id: DbId,
        start_sample: i64,
        end_sample: i64,
    ) -> Result<Vec<Sample>, StoreError>;

    /// Count a project's samples whose status differs from `status`.
    async fn count_samples_not_in_status(
        &self,
        project_id: DbId,
        status: SampleStatus,
    ) -> Result<i64, StoreError>;

    // -- users --------------------------------------------------------------

    /// Insert a user document with the given id.
    async fn insert_user(&self, doc: User) -> Result<Versioned<User>, StoreError>;

    async fn get_user(&self, id: DbId) -> Result<Versioned<User>, StoreError>;

    async fn put_user(&self, doc: User, expected: Revision) -> Result<Versioned<User>, StoreError>;
}
