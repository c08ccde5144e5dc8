//! Error types shared by every layer of the workflow engine.
//!
//! Four kinds cover all business outcomes: `Validation` (malformed or
//! config-inconsistent input), `NotAllowed` (a lifecycle precondition
//! failed, with a machine-readable reason code), `NotFound`, and
//! `Conflict` (optimistic-concurrency retries exhausted). None of these
//! are process-fatal; callers recover by fixing input or re-fetching
//! state.

use serde::Serialize;

use crate::types::DbId;

// ---------------------------------------------------------------------------
// NotAllowed reason codes
// ---------------------------------------------------------------------------

/// Machine-readable reason for a rejected business operation.
///
/// The kebab-case codes are part of the public contract; clients branch
/// on them rather than on the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotAllowedReason {
    /// `join_project` on a project that is not `open-for-joining`.
    NotOpenForJoining,
    /// The annotator already holds a division in this project.
    AlreadyInProject,
    /// The project already has `maximum_of_annotators` divisions.
    DivisionIsFull,
    /// `setting-up -> open-for-joining` with zero samples loaded.
    NoSamples,
    /// `open-for-joining -> annotating` with no annotators joined.
    NoDivisions,
    /// `annotating -> done` while some sample is not `annotated`.
    SamplesNotReady,
    /// Any transition attempt on a `done` project.
    ProjectAlreadyDone,
    /// Sample ingestion after the project left `setting-up`.
    ProjectNotSettingUp,
    /// Annotator action on a project that is not `annotating`.
    ProjectNotAnnotating,
    /// `mark_sample_as_a_mistake` on a sample that is not `annotated`.
    SampleNotMistakable,
    /// Comment added to a sample still in `new` status.
    SampleNotCommentable,
    /// Annotator action on a sample outside their division.
    SampleNotInDivision,
    /// Annotation attempt on a sample already marked as a mistake.
    SampleMarkedAsAMistake,
}

impl NotAllowedReason {
    /// The stable kebab-case code for this reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotOpenForJoining => "not-open-for-joining",
            Self::AlreadyInProject => "already-in-project",
            Self::DivisionIsFull => "division-is-full",
            Self::NoSamples => "no-samples",
            Self::NoDivisions => "no-divisions",
            Self::SamplesNotReady => "samples-not-ready",
            Self::ProjectAlreadyDone => "project-already-done",
            Self::ProjectNotSettingUp => "project-not-setting-up",
            Self::ProjectNotAnnotating => "project-not-annotating",
            Self::SampleNotMistakable => "sample-not-mistakable",
            Self::SampleNotCommentable => "sample-not-commentable",
            Self::SampleNotInDivision => "sample-not-in-division",
            Self::SampleMarkedAsAMistake => "sample-marked-as-a-mistake",
        }
    }
}

impl std::fmt::Display for NotAllowedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// CoreError
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not allowed: {0}")]
    NotAllowed(NotAllowedReason),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotAllowed`] with the given reason.
    pub fn not_allowed(reason: NotAllowedReason) -> Self {
        Self::NotAllowed(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_are_kebab_case() {
        assert_eq!(NotAllowedReason::DivisionIsFull.code(), "division-is-full");
        assert_eq!(
            NotAllowedReason::NotOpenForJoining.code(),
            "not-open-for-joining"
        );
        assert_eq!(
            NotAllowedReason::ProjectAlreadyDone.code(),
            "project-already-done"
        );
        assert_eq!(NotAllowedReason::SamplesNotReady.code(), "samples-not-ready");
    }

    #[test]
    fn not_allowed_display_uses_code() {
        let err = CoreError::NotAllowed(NotAllowedReason::NoSamples);
        assert_eq!(err.to_string(), "Not allowed: no-samples");
    }

    #[test]
    fn not_found_mentions_entity_and_id() {
        let err = CoreError::NotFound {
            entity: "project",
            id: 42,
        };
        assert!(err.to_string().contains("project"));
        assert!(err.to_string().contains("42"));
    }
}
