//! Review repository trait for accommodation and host reviews.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{
    AccommodationReview, HostReview, HostReviewId, NewAccommodationReview, NewHostReview,
    ReviewId, ReviewUpdate, UserId,
};

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the accommodation or the author does not exist
    async fn create_accommodation_review(
        &self,
        review: NewAccommodationReview,
    ) -> RepositoryResult<AccommodationReview>;

    async fn get_accommodation_review(&self, id: ReviewId) -> RepositoryResult<AccommodationReview>;

    async fn update_accommodation_review(
        &self,
        id: ReviewId,
        update: ReviewUpdate,
    ) -> RepositoryResult<AccommodationReview>;

    async fn delete_accommodation_review(&self, id: ReviewId) -> RepositoryResult<()>;

    /// Reviews of one accommodation, oldest first.
    async fn list_accommodation_reviews(
        &self,
        register_number: &str,
    ) -> RepositoryResult<Vec<AccommodationReview>>;

    async fn create_host_review(&self, review: NewHostReview) -> RepositoryResult<HostReview>;

    async fn get_host_review(&self, id: HostReviewId) -> RepositoryResult<HostReview>;

    async fn list_host_reviews(&self, host_id: UserId) -> RepositoryResult<Vec<HostReview>>;

    async fn delete_host_review(&self, id: HostReviewId) -> RepositoryResult<()>;
}
