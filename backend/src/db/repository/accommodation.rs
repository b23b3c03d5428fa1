//! Accommodation repository trait.
//!
//! Accommodations are keyed by their register number. Locations are owned by
//! a single accommodation; images are stored in their own table and attached
//! through a link table.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{
    Accommodation, AccommodationCategory, AccommodationDetails, AccommodationImage, ImageId,
    NewAccommodation, NewCategory, NewImage, Page, SearchCriteria, SearchHit,
};

/// Repository trait for accommodations, their images and categories.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait AccommodationRepository: Send + Sync {
    /// Check if the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Store a new accommodation together with its location.
    ///
    /// # Returns
    /// * `Ok(Accommodation)` - The stored accommodation
    /// * `Err(RepositoryError::Conflict)` - If the register number is taken
    /// * `Err(RepositoryError::NotFound)` - If the host or category does not exist
    async fn create_accommodation(
        &self,
        accommodation: NewAccommodation,
    ) -> RepositoryResult<Accommodation>;

    async fn get_accommodation(&self, register_number: &str) -> RepositoryResult<Accommodation>;

    async fn list_accommodations(&self) -> RepositoryResult<Vec<Accommodation>>;

    /// Accommodations whose city equals `city`, ignoring case.
    async fn list_accommodations_by_city(&self, city: &str) -> RepositoryResult<Vec<Accommodation>>;

    /// Replace every mutable attribute of an accommodation, location included.
    async fn update_accommodation(
        &self,
        register_number: &str,
        details: AccommodationDetails,
    ) -> RepositoryResult<Accommodation>;

    /// Delete an accommodation with its location, images and reviews.
    ///
    /// # Returns
    /// * `Err(RepositoryError::Conflict)` - If bookings still reference it
    async fn delete_accommodation(&self, register_number: &str) -> RepositoryResult<()>;

    /// Run a validated multi-criteria search.
    ///
    /// Callers are expected to pass criteria that went through
    /// [`SearchCriteria::validate`].
    async fn search_accommodations(
        &self,
        criteria: &SearchCriteria,
    ) -> RepositoryResult<Page<SearchHit>>;

    // ==================== Images ====================

    /// Insert an image and link it to the accommodation in one transaction.
    async fn attach_image(
        &self,
        register_number: &str,
        image: NewImage,
    ) -> RepositoryResult<AccommodationImage>;

    async fn list_images(&self, register_number: &str) -> RepositoryResult<Vec<AccommodationImage>>;

    /// Unlink and delete an image in one transaction.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the image is not linked to this accommodation
    async fn remove_image(&self, register_number: &str, image_id: ImageId) -> RepositoryResult<()>;

    // ==================== Categories ====================

    async fn list_categories(&self) -> RepositoryResult<Vec<AccommodationCategory>>;

    /// # Returns
    /// * `Err(RepositoryError::Conflict)` - If the description already exists (ignoring case)
    async fn create_category(&self, category: NewCategory)
        -> RepositoryResult<AccommodationCategory>;
}
