//! In-process reference implementation of [`DocumentStore`].
//!
//! Documents live in `RwLock`ed maps keyed by id, each paired with its
//! current revision. Conditional writes take the write lock for the
//! compare-and-swap, which is what makes them atomic against
//! concurrent writers. Ids come from a single shared sequence.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::RwLock;

use labelkit_core::phase::SampleStatus;
use labelkit_core::types::DbId;

use crate::models::{Project, Sample, User};
use crate::store::{DocumentStore, Revision, StoreError, Versioned};

/// The first revision assigned to a freshly inserted document.
const INITIAL_REVISION: Revision = 1;

pub struct MemoryStore {
    projects: RwLock<HashMap<DbId, (Revision, Project)>>,
    samples: RwLock<HashMap<DbId, (Revision, Sample)>>,
    users: RwLock<HashMap<DbId, (Revision, User)>>,
    next_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
            samples: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn allocate_id(&self) -> DbId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Compare-and-swap helper shared by the three collections.
fn conditional_put<T: Clone>(
    map: &mut HashMap<DbId, (Revision, T)>,
    entity: &'static str,
    id: DbId,
    doc: T,
    expected: Revision,
) -> Result<Versioned<T>, StoreError> {
    let entry = map
        .get_mut(&id)
        .ok_or(StoreError::NotFound { entity, id })?;
    if entry.0 != expected {
        return Err(StoreError::RevisionMismatch {
            entity,
            id,
            expected,
            found: entry.0,
        });
    }
    entry.0 += 1;
    entry.1 = doc.clone();
    Ok(Versioned {
        doc,
        revision: entry.0,
    })
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    // -- projects -----------------------------------------------------------

    async fn insert_project(&self, mut doc: Project) -> Result<Versioned<Project>, StoreError> {
        doc.id = self.allocate_id();
        let mut projects = self.projects.write().await;
        projects.insert(doc.id, (INITIAL_REVISION, doc.clone()));
        Ok(Versioned {
            doc,
            revision: INITIAL_REVISION,
        })
    }

    async fn get_project(&self, id: DbId) -> Result<Versioned<Project>, StoreError> {
        let projects = self.projects.read().await;
        let (revision, doc) = projects
            .get(&id)
            .ok_or(StoreError::NotFound { entity: "project", id })?;
        Ok(Versioned {
            doc: doc.clone(),
            revision: *revision,
        })
    }

    async fn put_project(
        &self,
        doc: Project,
        expected: Revision,
    ) -> Result<Versioned<Project>, StoreError> {
        let mut projects = self.projects.write().await;
        conditional_put(&mut projects, "project", doc.id, doc, expected)
    }

    // -- samples ------------------------------------------------------------

    async fn insert_sample(&self, mut doc: Sample) -> Result<Versioned<Sample>, StoreError> {
        doc.id = self.allocate_id();
        let mut samples = self.samples.write().await;
        samples.insert(doc.id, (INITIAL_REVISION, doc.clone()));
        Ok(Versioned {
            doc,
            revision: INITIAL_REVISION,
        })
    }

    async fn get_sample(&self, id: DbId) -> Result<Versioned<Sample>, StoreError> {
        let samples = self.samples.read().await;
        let (revision, doc) = samples
            .get(&id)
            .ok_or(StoreError::NotFound { entity: "sample", id })?;
        Ok(Versioned {
            doc: doc.clone(),
            revision: *revision,
        })
    }

    async fn put_sample(
        &self,
        doc: Sample,
        expected: Revision,
    ) -> Result<Versioned<Sample>, StoreError> {
        let mut samples = self.samples.write().await;
        conditional_put(&mut samples, "sample", doc.id, doc, expected)
    }

    async fn list_project_samples(&self, project_id: DbId) -> Result<Vec<Sample>, StoreError> {
        let samples = self.samples.read().await;
        let mut result: Vec<Sample> = samples
            .values()
            .filter(|(_, s)| s.project_id == project_id)
            .map(|(_, s)| s.clone())
            .collect();
        result.sort_by_key(|s| s.number);
        Ok(result)
    }

    async fn samples_in_range(
        &self,
        project_id: DbId,
        start_sample: i64,
        end_sample: i64,
    ) -> Result<Vec<Sample>, StoreError> {
        let samples = self.samples.read().await;
        let mut result: Vec<Sample> = samples
            .values()
            .filter(|(_, s)| {
                s.project_id == project_id
                    && s.number - 1 >= start_sample
                    && s.number - 1 <= end_sample
            })
            .map(|(_, s)| s.clone())
            .collect();
        result.sort_by_key(|s| s.number);
        Ok(result)
    }

    async fn count_samples_not_in_status(
        &self,
        project_id: DbId,
        status: SampleStatus,
    ) -> Result<i64, StoreError> {
        let samples = self.samples.read().await;
        let count = samples
            .values()
            .filter(|(_, s)| s.project_id == project_id && s.status != status)
            .count();
        Ok(count as i64)
    }

    // -- users --------------------------------------------------------------

    async fn insert_user(&self, doc: User) -> Result<Versioned<User>, StoreError> {
        let mut users = self.users.write().await;
        users.insert(doc.id, (INITIAL_REVISION, doc.clone()));
        Ok(Versioned {
            doc,
            revision: INITIAL_REVISION,
        })
    }

    async fn get_user(&self, id: DbId) -> Result<Versioned<User>, StoreError> {
        let users = self.users.read().await;
        let (revision, doc) = users
            .get(&id)
            .ok_or(StoreError::NotFound { entity: "user", id })?;
        Ok(Versioned {
            doc: doc.clone(),
            revision: *revision,
        })
    }

    async fn put_user(&self, doc: User, expected: Revision) -> Result<Versioned<User>, StoreError> {
        let mut users = self.users.write().await;
        conditional_put(&mut users, "user", doc.id, doc, expected)
    }
}
