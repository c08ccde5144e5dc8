//! Bulk sample ingestion as a trackable background job.
//!
//! Loading runs detached from the request that triggered it, but every
//! job is registered with a status (`queued`, `running`, `completed`,
//! `failed`) and captures its error text instead of vanishing silently.
//! Jobs are not cancellable. Samples may only be appended while the
//! project is `setting-up`; the phase is re-checked on every append so
//! a job racing a phase transition fails cleanly partway.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use labelkit_core::error::{CoreError, NotAllowedReason};
use labelkit_core::phase::{ProjectPhase, SampleStatus};
use labelkit_core::types::DbId;
use labelkit_db::models::{NewSample, Sample};
use labelkit_db::{DocumentStore, StoreError, Versioned};

use crate::config::EngineConfig;
use crate::project::retries_exhausted;

// ---------------------------------------------------------------------------
// Job tracking
// ---------------------------------------------------------------------------

/// Lifecycle status of one ingestion job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestJobStatus {
    Queued,
    Running,
    Completed { samples_added: i64 },
    Failed { error: String },
}

impl IngestJobStatus {
    /// Whether the job has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

/// One tracked ingestion job.
#[derive(Debug, Clone)]
pub struct IngestJob {
    pub id: Uuid,
    pub project_id: DbId,
    pub status: IngestJobStatus,
}

type JobRegistry = Arc<RwLock<HashMap<Uuid, IngestJob>>>;

// ---------------------------------------------------------------------------
// IngestService
// ---------------------------------------------------------------------------

pub struct IngestService {
    store: Arc<dyn DocumentStore>,
    config: EngineConfig,
    jobs: JobRegistry,
}

impl IngestService {
    pub fn new(store: Arc<dyn DocumentStore>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Validate the batch, register a job, and spawn the append loop.
    ///
    /// Shape errors and a wrong project phase are reported here,
    /// synchronously; errors during the append itself are captured on
    /// the job record.
    pub async fn enqueue(
        &self,
        project_id: DbId,
        rows: Vec<NewSample>,
    ) -> Result<Uuid, CoreError> {
        self.check_batch(project_id, &rows).await?;

        let job_id = Uuid::new_v4();
        self.jobs.write().await.insert(
            job_id,
            IngestJob {
                id: job_id,
                project_id,
                status: IngestJobStatus::Queued,
            },
        );

        let store = Arc::clone(&self.store);
        let jobs = Arc::clone(&self.jobs);
        let max_retries = self.config.max_occ_retries;
        tokio::spawn(async move {
            set_status(&jobs, job_id, IngestJobStatus::Running).await;
            match append_rows(store.as_ref(), project_id, rows, max_retries).await {
                Ok(added) => {
                    tracing::info!(project_id, %job_id, added, "ingestion job completed");
                    set_status(
                        &jobs,
                        job_id,
                        IngestJobStatus::Completed { samples_added: added },
                    )
                    .await;
                }
                Err(err) => {
                    tracing::error!(project_id, %job_id, error = %err, "ingestion job failed");
                    set_status(
                        &jobs,
                        job_id,
                        IngestJobStatus::Failed {
                            error: err.to_string(),
                        },
                    )
                    .await;
                }
            }
        });

        Ok(job_id)
    }

    /// Append the batch inline, returning the number of samples added.
    ///
    /// Same semantics as a spawned job, for callers that want to wait.
    pub async fn ingest(&self, project_id: DbId, rows: Vec<NewSample>) -> Result<i64, CoreError> {
        self.check_batch(project_id, &rows).await?;
        append_rows(self.store.as_ref(), project_id, rows, self.config.max_occ_retries).await
    }

    /// Look up a tracked job.
    pub async fn job(&self, job_id: Uuid) -> Option<IngestJob> {
        self.jobs.read().await.get(&job_id).cloned()
    }

    /// Fail fast on an ineligible project or malformed rows.
    async fn check_batch(&self, project_id: DbId, rows: &[NewSample]) -> Result<(), CoreError> {
        let project = self.store.get_project(project_id).await?.doc;
        if project.phase != ProjectPhase::SettingUp {
            return Err(CoreError::not_allowed(NotAllowedReason::ProjectNotSettingUp));
        }
        if rows.is_empty() {
            return Err(CoreError::Validation("ingestion batch is empty".into()));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.texts.is_empty() {
                return Err(CoreError::Validation(format!("row {i} has no texts")));
            }
            if row.texts.len() > self.config.limits.max_texts_per_sample {
                return Err(CoreError::Validation(format!(
                    "row {i} has {} texts, maximum is {}",
                    row.texts.len(),
                    self.config.limits.max_texts_per_sample
                )));
            }
        }
        Ok(())
    }
}

async fn set_status(jobs: &JobRegistry, job_id: Uuid, status: IngestJobStatus) {
    if let Some(job) = jobs.write().await.get_mut(&job_id) {
        job.status = status;
    }
}

/// Append rows one at a time: claim the next sample number by bumping
/// `number_of_samples` under the revision check, then insert the sample
/// document with that number.
async fn append_rows(
    store: &dyn DocumentStore,
    project_id: DbId,
    rows: Vec<NewSample>,
    max_retries: u32,
) -> Result<i64, CoreError> {
    let mut added = 0i64;
    for row in rows {
        let number = claim_next_number(store, project_id, max_retries).await?;
        let now = Utc::now();
        store
            .insert_sample(Sample {
                id: 0,
                project_id,
                number,
                texts: row.texts,
                status: SampleStatus::New,
                labelings: None,
                generated_texts: None,
                text_annotations: Vec::new(),
                comments: Vec::new(),
                created_at: now,
                updated_at: now,
            })
            .await?;
        added += 1;
    }
    Ok(added)
}

async fn claim_next_number(
    store: &dyn DocumentStore,
    project_id: DbId,
    max_retries: u32,
) -> Result<i64, CoreError> {
    let mut attempts = 0;
    loop {
        let Versioned { mut doc, revision } = store.get_project(project_id).await?;
        if doc.phase != ProjectPhase::SettingUp {
            return Err(CoreError::not_allowed(NotAllowedReason::ProjectNotSettingUp));
        }
        let number = doc.number_of_samples + 1;
        doc.number_of_samples = number;
        doc.updated_at = Utc::now();
        match store.put_project(doc, revision).await {
            Ok(_) => return Ok(number),
            Err(StoreError::RevisionMismatch { .. }) => {
                attempts += 1;
                if attempts > max_retries {
                    return Err(retries_exhausted("project", project_id));
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}
