//! Domain records for the hosting marketplace.
//!
//! Records returned by the repositories carry their assigned identifiers;
//! the `New*` companions are the request payloads that create them.

pub mod accommodation;
pub mod booking;
pub mod catalog;
pub mod macros;
pub mod review;
pub mod search;
pub mod user;

pub use accommodation::*;
pub use booking::*;
pub use catalog::*;
pub use review::*;
pub use search::*;
pub use user::*;
