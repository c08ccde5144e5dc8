//! Annotator actions on individual samples.
//!
//! Each sample is an independently-mutated document; concurrent
//! annotation attempts on the same sample resolve last-write-wins under
//! the usual revision discipline. Division membership is a business
//! precondition owned here: an annotator may only touch samples whose
//! index falls inside their planned range.

use std::sync::Arc;

use chrono::Utc;

use labelkit_core::annotation::{validate_annotation, AnnotationPayload};
use labelkit_core::error::{CoreError, NotAllowedReason};
use labelkit_core::phase::{ProjectPhase, SampleStatus};
use labelkit_core::types::DbId;
use labelkit_db::models::{Comment, Project, Sample};
use labelkit_db::{DocumentStore, StoreError, Versioned};

use crate::config::EngineConfig;
use crate::project::retries_exhausted;

pub struct SampleService {
    store: Arc<dyn DocumentStore>,
    config: EngineConfig,
}

impl SampleService {
    pub fn new(store: Arc<dyn DocumentStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub async fn get_sample(&self, sample_id: DbId) -> Result<Sample, CoreError> {
        Ok(self.store.get_sample(sample_id).await?.doc)
    }

    /// The samples planned for one annotator, ordered by number.
    pub async fn list_division_samples(
        &self,
        project_id: DbId,
        annotator_id: DbId,
    ) -> Result<Vec<Sample>, CoreError> {
        let project = self.store.get_project(project_id).await?.doc;
        let division = project
            .divisions
            .iter()
            .find(|d| d.annotator_id == annotator_id)
            .ok_or(CoreError::NotAllowed(NotAllowedReason::SampleNotInDivision))?;
        match (division.start_sample, division.end_sample) {
            (Some(start), Some(end)) => {
                Ok(self.store.samples_in_range(project_id, start, end).await?)
            }
            // No range planned yet: the project has not entered annotating.
            _ => Ok(Vec::new()),
        }
    }

    /// Validate a submitted annotation against the project's schema and
    /// merge it into the sample, setting the status to `annotated`.
    ///
    /// Re-annotation overwrites the previous submission as long as the
    /// sample has not been marked as a mistake.
    pub async fn validate_and_apply_annotation(
        &self,
        sample_id: DbId,
        annotator_id: DbId,
        payload: AnnotationPayload,
    ) -> Result<Sample, CoreError> {
        let mut attempts = 0;
        loop {
            let Versioned { mut doc, revision } = self.store.get_sample(sample_id).await?;
            let project = self.store.get_project(doc.project_id).await?.doc;

            self.check_annotator_action(&project, &doc, annotator_id)?;
            if doc.status == SampleStatus::MarkedAsAMistake {
                return Err(CoreError::not_allowed(
                    NotAllowedReason::SampleMarkedAsAMistake,
                ));
            }

            let validated = validate_annotation(
                &project.annotation_config,
                &doc.texts,
                &payload,
                &self.config.limits,
            )?;

            doc.labelings = validated.labelings;
            doc.generated_texts = validated.generated_texts;
            doc.text_annotations = validated.text_annotations;
            doc.status = SampleStatus::Annotated;
            doc.updated_at = Utc::now();

            match self.store.put_sample(doc, revision).await {
                Ok(updated) => {
                    tracing::debug!(sample_id, annotator_id, "sample annotated");
                    return Ok(updated.doc);
                }
                Err(StoreError::RevisionMismatch { .. }) => {
                    attempts += 1;
                    if attempts > self.config.max_occ_retries {
                        return Err(retries_exhausted("sample", sample_id));
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Mark an annotated sample as a mistake. There is no way back from
    /// this status, and it blocks project completion.
    pub async fn mark_sample_as_a_mistake(
        &self,
        sample_id: DbId,
        annotator_id: DbId,
    ) -> Result<Sample, CoreError> {
        let mut attempts = 0;
        loop {
            let Versioned { mut doc, revision } = self.store.get_sample(sample_id).await?;
            let project = self.store.get_project(doc.project_id).await?.doc;

            self.check_annotator_action(&project, &doc, annotator_id)?;
            if doc.status != SampleStatus::Annotated {
                return Err(CoreError::not_allowed(NotAllowedReason::SampleNotMistakable));
            }

            doc.status = SampleStatus::MarkedAsAMistake;
            doc.updated_at = Utc::now();

            match self.store.put_sample(doc, revision).await {
                Ok(updated) => {
                    tracing::debug!(sample_id, annotator_id, "sample marked as a mistake");
                    return Ok(updated.doc);
                }
                Err(StoreError::RevisionMismatch { .. }) => {
                    attempts += 1;
                    if attempts > self.config.max_occ_retries {
                        return Err(retries_exhausted("sample", sample_id));
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Append a comment to a sample that has been worked on.
    ///
    /// A sample in `new` status carries no comments (creation
    /// invariant), so commenting requires the sample to have left it.
    pub async fn add_comment(
        &self,
        sample_id: DbId,
        author: DbId,
        body: String,
    ) -> Result<Sample, CoreError> {
        if body.is_empty() {
            return Err(CoreError::Validation("comment body must not be empty".into()));
        }
        if body.chars().count() > self.config.limits.max_comment_len {
            return Err(CoreError::Validation(format!(
                "comment body exceeds {} characters",
                self.config.limits.max_comment_len
            )));
        }

        let mut attempts = 0;
        loop {
            let Versioned { mut doc, revision } = self.store.get_sample(sample_id).await?;
            if doc.status == SampleStatus::New {
                return Err(CoreError::not_allowed(NotAllowedReason::SampleNotCommentable));
            }

            doc.comments.push(Comment {
                author,
                body: body.clone(),
                created_at: Utc::now(),
            });
            doc.updated_at = Utc::now();

            match self.store.put_sample(doc, revision).await {
                Ok(updated) => return Ok(updated.doc),
                Err(StoreError::RevisionMismatch { .. }) => {
                    attempts += 1;
                    if attempts > self.config.max_occ_retries {
                        return Err(retries_exhausted("sample", sample_id));
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// The shared preconditions for annotator actions: the project is
    /// `annotating` and the sample's index lies in the annotator's
    /// division.
    fn check_annotator_action(
        &self,
        project: &Project,
        sample: &Sample,
        annotator_id: DbId,
    ) -> Result<(), CoreError> {
        if project.phase != ProjectPhase::Annotating {
            return Err(CoreError::not_allowed(NotAllowedReason::ProjectNotAnnotating));
        }
        let division = project
            .divisions
            .iter()
            .find(|d| d.annotator_id == annotator_id)
            .ok_or(CoreError::NotAllowed(NotAllowedReason::SampleNotInDivision))?;
        let in_range = match (division.start_sample, division.end_sample) {
            (Some(start), Some(end)) => {
                let index = sample.number - 1;
                index >= start && index <= end
            }
            _ => false,
        };
        if !in_range {
            return Err(CoreError::not_allowed(NotAllowedReason::SampleNotInDivision));
        }
        Ok(())
    }
}
