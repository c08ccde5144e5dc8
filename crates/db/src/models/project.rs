//! Project document and its create DTO.

use serde::{Deserialize, Serialize};
use validator::Validate;

use labelkit_core::schema::AnnotationConfig;
use labelkit_core::phase::ProjectPhase;
use labelkit_core::types::{DbId, Timestamp};

/// One annotator's slot in a project, in join order.
///
/// `start_sample` / `end_sample` stay unset until the project enters
/// `annotating`; from then on they hold the inclusive 0-based index
/// range planned for this annotator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub annotator_id: DbId,
    #[serde(default)]
    pub start_sample: Option<i64>,
    #[serde(default)]
    pub end_sample: Option<i64>,
}

impl Division {
    /// A fresh division for a newly joined annotator, no range yet.
    pub fn new(annotator_id: DbId) -> Self {
        Self {
            annotator_id,
            start_sample: None,
            end_sample: None,
        }
    }
}

/// An annotation project document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub project_type_id: DbId,
    /// Unset when the project was created by an admin.
    pub manager_id: Option<DbId>,
    pub phase: ProjectPhase,
    pub maximum_of_annotators: u32,
    /// Insertion order is join order.
    pub divisions: Vec<Division>,
    /// Monotonic counter, bumped only while `setting-up`.
    pub number_of_samples: i64,
    pub annotation_config: AnnotationConfig,
    /// Set once, when the phase becomes `done`.
    pub completion_time: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    /// Annotator ids of the current divisions, in join order.
    pub fn joined_annotators(&self) -> Vec<DbId> {
        self.divisions.iter().map(|d| d.annotator_id).collect()
    }
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProject {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub project_type_id: DbId,
    pub manager_id: Option<DbId>,
    #[validate(range(min = 1))]
    pub maximum_of_annotators: u32,
    pub annotation_config: AnnotationConfig,
}
