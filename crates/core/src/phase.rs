//! Project and sample lifecycle states and their transition rules.
//!
//! The project phase machine is strictly linear: `setting-up ->
//! open-for-joining -> annotating -> done`, no skipping and no going
//! back. The pure precondition checks here are called by the engine's
//! phase controller inside its optimistic-concurrency loop; they take
//! plain values so they can be tested without a store.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, NotAllowedReason};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// ProjectPhase
// ---------------------------------------------------------------------------

/// Lifecycle phase of an annotation project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectPhase {
    SettingUp,
    OpenForJoining,
    Annotating,
    Done,
}

/// All valid phase strings, in lifecycle order.
pub const VALID_PHASES: &[&str] = &["setting-up", "open-for-joining", "annotating", "done"];

impl ProjectPhase {
    /// The stable kebab-case code for this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SettingUp => "setting-up",
            Self::OpenForJoining => "open-for-joining",
            Self::Annotating => "annotating",
            Self::Done => "done",
        }
    }

    /// Parse a phase from its stored string form.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "setting-up" => Ok(Self::SettingUp),
            "open-for-joining" => Ok(Self::OpenForJoining),
            "annotating" => Ok(Self::Annotating),
            "done" => Ok(Self::Done),
            _ => Err(CoreError::Validation(format!(
                "Invalid project phase '{s}'. Must be one of: {}",
                VALID_PHASES.join(", ")
            ))),
        }
    }

    /// Position in the lifecycle, 0-based. Monotonically increasing
    /// across any legal transition.
    pub fn order(&self) -> u8 {
        match self {
            Self::SettingUp => 0,
            Self::OpenForJoining => 1,
            Self::Annotating => 2,
            Self::Done => 3,
        }
    }

    /// The phase that follows this one, or `None` for the terminal phase.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::SettingUp => Some(Self::OpenForJoining),
            Self::OpenForJoining => Some(Self::Annotating),
            Self::Annotating => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Whether this is the terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl std::fmt::Display for ProjectPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SampleStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SampleStatus {
    New,
    Annotated,
    MarkedAsAMistake,
}

impl SampleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Annotated => "annotated",
            Self::MarkedAsAMistake => "marked-as-a-mistake",
        }
    }

    /// Parse a status from its stored string form.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "new" => Ok(Self::New),
            "annotated" => Ok(Self::Annotated),
            "marked-as-a-mistake" => Ok(Self::MarkedAsAMistake),
            _ => Err(CoreError::Validation(format!(
                "Invalid sample status '{s}'. Must be one of: new, annotated, marked-as-a-mistake"
            ))),
        }
    }
}

impl std::fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transition preconditions
// ---------------------------------------------------------------------------

/// Check `setting-up -> open-for-joining`: at least one sample loaded.
pub fn check_can_open_for_joining(number_of_samples: i64) -> Result<(), CoreError> {
    if number_of_samples <= 0 {
        return Err(CoreError::not_allowed(NotAllowedReason::NoSamples));
    }
    Ok(())
}

/// Check `open-for-joining -> annotating`: at least one annotator joined.
pub fn check_can_start_annotating(division_count: usize) -> Result<(), CoreError> {
    if division_count == 0 {
        return Err(CoreError::not_allowed(NotAllowedReason::NoDivisions));
    }
    Ok(())
}

/// Check `annotating -> done`: every sample in the project is annotated.
///
/// `unready_samples` is the count of samples whose status is anything
/// other than `annotated` (a `marked-as-a-mistake` sample blocks
/// completion just like a `new` one).
pub fn check_can_complete(unready_samples: i64) -> Result<(), CoreError> {
    if unready_samples > 0 {
        return Err(CoreError::not_allowed(NotAllowedReason::SamplesNotReady));
    }
    Ok(())
}

/// Check the preconditions for an annotator joining a project.
///
/// Rules, in the order they are reported:
/// - the project must be `open-for-joining`;
/// - the annotator must not already hold a division;
/// - the division list must not be at `maximum_of_annotators`.
pub fn check_join_allowed(
    phase: ProjectPhase,
    joined: &[DbId],
    annotator_id: DbId,
    maximum_of_annotators: u32,
) -> Result<(), CoreError> {
    if phase != ProjectPhase::OpenForJoining {
        return Err(CoreError::not_allowed(NotAllowedReason::NotOpenForJoining));
    }
    if joined.contains(&annotator_id) {
        return Err(CoreError::not_allowed(NotAllowedReason::AlreadyInProject));
    }
    if joined.len() >= maximum_of_annotators as usize {
        return Err(CoreError::not_allowed(NotAllowedReason::DivisionIsFull));
    }
    Ok(())
}
