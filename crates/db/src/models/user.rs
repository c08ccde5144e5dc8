//! User document, projected to the annotation-relevant fields.

use serde::{Deserialize, Serialize};

use labelkit_core::monthly::MonthlyTotal;
use labelkit_core::types::DbId;

/// The annotation-relevant projection of a user.
///
/// `monthly_annotations` holds at most one entry per `(month, year)`
/// pair and is written exclusively by the monthly aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: DbId,
    pub monthly_annotations: Vec<MonthlyTotal>,
}

impl User {
    /// A user with no recorded annotation activity.
    pub fn new(id: DbId) -> Self {
        Self {
            id,
            monthly_annotations: Vec::new(),
        }
    }
}
