//! Service layer for business logic that does not depend on storage.
//!
//! - [`geo`]: great-circle distances and bounding boxes
//! - [`search`]: accommodation search criteria, predicates, sorting and paging
//! - [`validation`]: input validation for write operations
//! - [`password`]: salted password hashing

pub mod geo;
pub mod password;
pub mod search;
pub mod validation;

pub use geo::{haversine_km, BoundingBox, GeoPoint};
pub use search::{search_in_memory, Page, Proximity, SearchCriteria, SearchHit, SortOrder};
