use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{SearchId, UserId};
use crate::services::search::SearchCriteria;

/// One entry of a user's search history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub id: SearchId,
    pub user_id: UserId,
    pub criteria: SearchCriteria,
    pub created_at: DateTime<Utc>,
}
