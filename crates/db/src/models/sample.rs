//! Sample document and its create DTO.

use serde::{Deserialize, Serialize};

use labelkit_core::annotation::TextAnnotation;
use labelkit_core::phase::SampleStatus;
use labelkit_core::types::{DbId, Timestamp};

/// A reader comment attached to a sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: DbId,
    pub body: String,
    pub created_at: Timestamp,
}

/// One unit of annotation work.
///
/// `texts` is immutable after creation; `number` is the 1-based
/// sequential index within the project. All annotation fields stay
/// `None`/empty while the status is `new`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub id: DbId,
    pub project_id: DbId,
    pub number: i64,
    pub texts: Vec<String>,
    pub status: SampleStatus,
    pub labelings: Option<Vec<Vec<String>>>,
    pub generated_texts: Option<Vec<String>>,
    pub text_annotations: Vec<TextAnnotation>,
    pub comments: Vec<Comment>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for appending one sample during bulk ingestion.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSample {
    pub texts: Vec<String>,
}
