use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{HostReviewId, ReviewId, UserId};

/// Guest review of an accommodation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationReview {
    pub id: ReviewId,
    pub register_number: String,
    pub user_id: UserId,
    pub content: String,
    pub stars: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccommodationReview {
    pub register_number: String,
    pub user_id: UserId,
    pub content: String,
    pub stars: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewUpdate {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub stars: Option<i32>,
}

impl ReviewUpdate {
    pub fn apply(&self, review: &mut AccommodationReview) {
        if let Some(content) = &self.content {
            review.content = content.clone();
        }
        if let Some(stars) = self.stars {
            review.stars = stars;
        }
    }
}

/// Review one user leaves about a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostReview {
    pub id: HostReviewId,
    pub host_id: UserId,
    pub reviewer_id: UserId,
    pub content: String,
    pub stars: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHostReview {
    pub host_id: UserId,
    pub reviewer_id: UserId,
    pub content: String,
    pub stars: i32,
}
