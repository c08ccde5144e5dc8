//! The phase controller: project creation, joining, and lifecycle
//! transitions.
//!
//! All mutations follow the same discipline: read the project with its
//! revision, check the business preconditions, write back conditioned
//! on the revision, and retry from the top on a mismatch, at most
//! `max_occ_retries` times. Preconditions are re-evaluated on every
//! retry, so two concurrent joins can never over-admit and two
//! concurrent transitions can never both fire from the same phase.

use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use labelkit_core::division::{compute_ranges, PlannedRange};
use labelkit_core::error::{CoreError, NotAllowedReason};
use labelkit_core::monthly::{annotated_counts, merge_month, month_of};
use labelkit_core::phase::{
    check_can_complete, check_can_open_for_joining, check_can_start_annotating,
    check_join_allowed, ProjectPhase, SampleStatus,
};
use labelkit_core::schema::validate_config;
use labelkit_core::types::{DbId, Timestamp};
use labelkit_db::models::{CreateProject, Division, Project};
use labelkit_db::{DocumentStore, StoreError, Versioned};

use crate::config::EngineConfig;

/// Outcome of a successful `turn_to_next_phase` call.
#[derive(Debug, Clone)]
pub struct PhaseTurn {
    pub phase: ProjectPhase,
    /// Set for the `open-for-joining -> annotating` transition: the
    /// divisions with their freshly planned ranges.
    pub divisions: Option<Vec<Division>>,
}

pub struct ProjectService {
    store: Arc<dyn DocumentStore>,
    config: EngineConfig,
}

impl ProjectService {
    pub fn new(store: Arc<dyn DocumentStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Create a project in `setting-up` with an empty division list.
    ///
    /// Fails with `Validation` if the DTO shape or the annotation
    /// config is inconsistent (see `labelkit_core::schema`).
    pub async fn create_project(&self, input: CreateProject) -> Result<Project, CoreError> {
        input
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        validate_config(&input.annotation_config, &self.config.limits)?;

        let now = Utc::now();
        let doc = Project {
            id: 0,
            name: input.name,
            project_type_id: input.project_type_id,
            manager_id: input.manager_id,
            phase: ProjectPhase::SettingUp,
            maximum_of_annotators: input.maximum_of_annotators,
            divisions: Vec::new(),
            number_of_samples: 0,
            annotation_config: input.annotation_config,
            completion_time: None,
            created_at: now,
            updated_at: now,
        };
        let created = self.store.insert_project(doc).await?;
        tracing::info!(project_id = created.doc.id, name = %created.doc.name, "project created");
        Ok(created.doc)
    }

    pub async fn get_project(&self, project_id: DbId) -> Result<Project, CoreError> {
        Ok(self.store.get_project(project_id).await?.doc)
    }

    /// Add an annotator to the project's division list.
    ///
    /// Preconditions (checked on every retry): the project is
    /// `open-for-joining`, the annotator is not already in it, and the
    /// division list is below `maximum_of_annotators`. Returns the
    /// updated division list in join order.
    pub async fn join_project(
        &self,
        project_id: DbId,
        annotator_id: DbId,
    ) -> Result<Vec<Division>, CoreError> {
        // The annotator must exist before we touch the project.
        self.store.get_user(annotator_id).await?;

        let mut attempts = 0;
        loop {
            let Versioned { mut doc, revision } = self.store.get_project(project_id).await?;
            check_join_allowed(
                doc.phase,
                &doc.joined_annotators(),
                annotator_id,
                doc.maximum_of_annotators,
            )?;

            doc.divisions.push(Division::new(annotator_id));
            doc.updated_at = Utc::now();
            match self.store.put_project(doc, revision).await {
                Ok(updated) => {
                    tracing::info!(
                        project_id,
                        annotator_id,
                        joined = updated.doc.divisions.len(),
                        "annotator joined project"
                    );
                    return Ok(updated.doc.divisions);
                }
                Err(StoreError::RevisionMismatch { .. }) => {
                    attempts += 1;
                    if attempts > self.config.max_occ_retries {
                        return Err(retries_exhausted("project", project_id));
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Advance the project to its next phase.
    ///
    /// - `setting-up -> open-for-joining` requires loaded samples;
    /// - `open-for-joining -> annotating` requires joined annotators
    ///   and plans the division ranges;
    /// - `annotating -> done` requires every sample annotated, stamps
    ///   `completion_time`, and runs the monthly tally;
    /// - a `done` project always fails with `project-already-done`.
    pub async fn turn_to_next_phase(&self, project_id: DbId) -> Result<PhaseTurn, CoreError> {
        let mut attempts = 0;
        loop {
            let Versioned { mut doc, revision } = self.store.get_project(project_id).await?;

            let mut tally_at: Option<Timestamp> = None;
            let turn = match doc.phase {
                ProjectPhase::Done => {
                    return Err(CoreError::not_allowed(NotAllowedReason::ProjectAlreadyDone))
                }
                ProjectPhase::SettingUp => {
                    check_can_open_for_joining(doc.number_of_samples)?;
                    doc.phase = ProjectPhase::OpenForJoining;
                    PhaseTurn {
                        phase: doc.phase,
                        divisions: None,
                    }
                }
                ProjectPhase::OpenForJoining => {
                    check_can_start_annotating(doc.divisions.len())?;
                    let ranges =
                        compute_ranges(doc.number_of_samples, &doc.joined_annotators());
                    for (division, range) in doc.divisions.iter_mut().zip(&ranges) {
                        division.start_sample = Some(range.start_sample);
                        division.end_sample = Some(range.end_sample);
                    }
                    doc.phase = ProjectPhase::Annotating;
                    PhaseTurn {
                        phase: doc.phase,
                        divisions: Some(doc.divisions.clone()),
                    }
                }
                ProjectPhase::Annotating => {
                    let unready = self
                        .store
                        .count_samples_not_in_status(project_id, SampleStatus::Annotated)
                        .await?;
                    check_can_complete(unready)?;
                    let now = Utc::now();
                    doc.phase = ProjectPhase::Done;
                    doc.completion_time = Some(now);
                    tally_at = Some(now);
                    PhaseTurn {
                        phase: doc.phase,
                        divisions: None,
                    }
                }
            };

            doc.updated_at = Utc::now();
            match self.store.put_project(doc, revision).await {
                Ok(updated) => {
                    tracing::info!(project_id, phase = %updated.doc.phase, "project phase advanced");
                    // The done transition is committed at this point; the
                    // revision write guarantees the tally runs exactly
                    // once per project.
                    if let Some(completed_at) = tally_at {
                        self.run_monthly_tally(&updated.doc, completed_at).await?;
                    }
                    return Ok(turn);
                }
                Err(StoreError::RevisionMismatch { .. }) => {
                    attempts += 1;
                    if attempts > self.config.max_occ_retries {
                        return Err(retries_exhausted("project", project_id));
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Credit every annotator's current-month counter with the number
    /// of annotated samples in their division.
    async fn run_monthly_tally(
        &self,
        project: &Project,
        completed_at: Timestamp,
    ) -> Result<(), CoreError> {
        let ranges: Vec<PlannedRange> = project
            .divisions
            .iter()
            .map(|d| match (d.start_sample, d.end_sample) {
                (Some(start), Some(end)) => Ok(PlannedRange {
                    annotator_id: d.annotator_id,
                    start_sample: start,
                    end_sample: end,
                }),
                _ => Err(CoreError::Internal(format!(
                    "project {} completed with an unplanned division",
                    project.id
                ))),
            })
            .collect::<Result<_, _>>()?;

        let samples = self.store.list_project_samples(project.id).await?;
        let pairs: Vec<(i64, SampleStatus)> =
            samples.iter().map(|s| (s.number, s.status)).collect();
        let counts = annotated_counts(&ranges, &pairs);
        let (month, year) = month_of(completed_at);

        futures::future::try_join_all(
            counts
                .iter()
                .filter(|(_, count)| *count > 0)
                .map(|&(annotator_id, count)| self.credit_annotator(annotator_id, month, year, count)),
        )
        .await?;

        tracing::info!(project_id = project.id, month, year, "monthly tally recorded");
        Ok(())
    }

    async fn credit_annotator(
        &self,
        annotator_id: DbId,
        month: u32,
        year: i32,
        count: i64,
    ) -> Result<(), CoreError> {
        let mut attempts = 0;
        loop {
            let Versioned { mut doc, revision } = self.store.get_user(annotator_id).await?;
            merge_month(&mut doc.monthly_annotations, month, year, count);
            match self.store.put_user(doc, revision).await {
                Ok(_) => return Ok(()),
                Err(StoreError::RevisionMismatch { .. }) => {
                    attempts += 1;
                    if attempts > self.config.max_occ_retries {
                        return Err(retries_exhausted("user", annotator_id));
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// The error surfaced once an operation's retry budget is spent.
pub(crate) fn retries_exhausted(entity: &str, id: DbId) -> CoreError {
    CoreError::Conflict(format!(
        "optimistic-concurrency retries exhausted for {entity} {id}"
    ))
}
