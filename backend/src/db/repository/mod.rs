//! Repository traits for the hosting backend.
//!
//! Each aggregate gets its own trait; [`FullRepository`] combines them so the
//! HTTP layer and the service layer can hold a single `Arc<dyn FullRepository>`.
//!
//! Implementations enforce the referential and uniqueness rules themselves
//! (inside one transaction where the backend has them). Input shape checks
//! live in [`crate::services::validation`] and run before the repository is
//! called.

pub mod accommodation;
pub mod booking;
pub mod catalog;
pub mod error;
pub mod review;
pub mod user;

pub use accommodation::AccommodationRepository;
pub use booking::BookingRepository;
pub use catalog::CatalogRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use review::ReviewRepository;
pub use user::UserRepository;

/// Every repository capability behind one trait object.
pub trait FullRepository:
    AccommodationRepository + UserRepository + BookingRepository + ReviewRepository + CatalogRepository
{
}

impl<T> FullRepository for T where
    T: AccommodationRepository
        + UserRepository
        + BookingRepository
        + ReviewRepository
        + CatalogRepository
{
}
