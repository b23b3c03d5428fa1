//! Public API surface for the hosting backend.
//!
//! This file consolidates the identifier newtypes and re-exports the domain
//! records that travel over the HTTP API. All types derive
//! Serialize/Deserialize for JSON serialization.

pub use crate::models::accommodation::{
    Accommodation, AccommodationCategory, AccommodationDetails, AccommodationImage,
    AccommodationLocation, NewAccommodation, NewCategory, NewImage, NewLocation,
};
pub use crate::models::booking::{
    Booking, BookingDraft, BookingUpdate, NewBooking, NewPayment, Payment,
};
pub use crate::models::catalog::{
    AppPlan, Currency, NewCurrency, NewPlan, NewPlanFeature, PlanFeature,
};
pub use crate::models::review::{
    AccommodationReview, HostReview, NewAccommodationReview, NewHostReview, ReviewUpdate,
};
pub use crate::models::search::SearchRecord;
pub use crate::models::user::{
    NewUser, NewUserConfiguration, User, UserChanges, UserConfiguration, UserConfigurationUpdate,
    UserDraft, UserRole, UserUpdate,
};
pub use crate::services::search::{Page, SearchCriteria, SearchHit, SortOrder};

use crate::define_id_type;

define_id_type!(i64, UserId);
define_id_type!(i64, UserConfigurationId);
define_id_type!(i64, CurrencyId);
define_id_type!(i64, CategoryId);
define_id_type!(i64, LocationId);
define_id_type!(i64, ImageId);
define_id_type!(i64, ReviewId);
define_id_type!(i64, HostReviewId);
define_id_type!(i64, BookingId);
define_id_type!(i64, PaymentId);
define_id_type!(i64, PlanId);
define_id_type!(i64, FeatureId);
define_id_type!(i64, SearchId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_value() {
        let id = UserId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i64::from(id), 42);
    }

    #[test]
    fn test_id_from_str() {
        assert_eq!("7".parse::<BookingId>().unwrap(), BookingId(7));
        assert_eq!(" 9 ".parse::<PaymentId>().unwrap(), PaymentId(9));
        assert!("abc".parse::<UserId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_scalar() {
        let json = serde_json::to_string(&CategoryId::new(3)).unwrap();
        assert_eq!(json, "3");
        let back: CategoryId = serde_json::from_str("3").unwrap();
        assert_eq!(back, CategoryId(3));
    }
}
