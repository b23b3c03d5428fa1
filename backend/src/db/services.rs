//! Repository-agnostic business operations.
//!
//! These functions run the checks that must hold whatever the storage backend
//! is (input validation, password hashing, host roles, guest capacity,
//! booking prices) and then delegate to the repository traits. Plain reads
//! and deletes have no rules of their own, so callers use the repository
//! directly for those.
//!
//! # Usage
//!
//! ```no_run
//! use hosting_api::api::NewUser;
//! use hosting_api::db::{repositories::LocalRepository, services};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let user = services::register_user(
//!         &repo,
//!         NewUser {
//!             name: "Marta".into(),
//!             surname: "Prieto".into(),
//!             email: "marta@example.com".into(),
//!             phone: None,
//!             password: "correct horse".into(),
//!             profile_image: None,
//!             role: Default::default(),
//!         },
//!     )
//!     .await?;
//!     println!("registered user {}", user.id);
//!     Ok(())
//! }
//! ```

use log::{debug, info, warn};

use super::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::api::{
    Accommodation, AccommodationDetails, AccommodationReview, AppPlan, Booking, BookingDraft,
    BookingId, BookingUpdate, Currency, HostReview, NewAccommodation, NewAccommodationReview,
    NewBooking, NewCurrency, NewHostReview, NewPlan, NewUser, Page, ReviewId, ReviewUpdate,
    SearchCriteria, SearchHit, User, UserChanges, UserDraft, UserId, UserUpdate,
};
use crate::services::password::{hash_password, verify_password};
use crate::services::validation;

// ==================== Health ====================

pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Users ====================

/// Validate and store a new account with a hashed password.
///
/// # Returns
/// * `Err(RepositoryError::ValidationError)` - If a field is malformed
/// * `Err(RepositoryError::Conflict)` - If the email is already registered
pub async fn register_user<R: FullRepository + ?Sized>(
    repo: &R,
    user: NewUser,
) -> RepositoryResult<User> {
    validation::validate_new_user(&user)?;
    let draft = UserDraft {
        name: user.name.trim().to_string(),
        surname: user.surname.trim().to_string(),
        email: user.email.trim().to_string(),
        phone: user.phone,
        profile_image: user.profile_image,
        role: user.role,
        password_hash: hash_password(&user.password),
    };
    let created = repo.create_user(draft).await?;
    info!("Registered user {} ({})", created.id, created.role);
    Ok(created)
}

/// Check an email and password pair.
///
/// # Returns
/// * `Ok(Some(User))` - The password matches
/// * `Ok(None)` - Unknown email or wrong password
pub async fn login<R: FullRepository + ?Sized>(
    repo: &R,
    email: &str,
    password: &str,
) -> RepositoryResult<Option<User>> {
    match repo.find_credentials(email.trim()).await? {
        Some((user, hash)) if verify_password(password, &hash) => {
            debug!("User {} logged in", user.id);
            Ok(Some(user))
        }
        _ => {
            debug!("Rejected login for {}", email.trim());
            Ok(None)
        }
    }
}

/// Apply a partial update; a new password is rehashed.
pub async fn update_user<R: FullRepository + ?Sized>(
    repo: &R,
    id: UserId,
    update: UserUpdate,
) -> RepositoryResult<User> {
    validation::validate_user_update(&update)?;
    let changes = UserChanges {
        name: update.name.map(|s| s.trim().to_string()),
        surname: update.surname.map(|s| s.trim().to_string()),
        email: update.email.map(|s| s.trim().to_string()),
        phone: update.phone,
        profile_image: update.profile_image,
        role: update.role,
        password_hash: update.password.as_deref().map(hash_password),
    };
    repo.update_user(id, changes).await
}

async fn ensure_can_host<R: FullRepository + ?Sized>(
    repo: &R,
    operation: &str,
    host_id: UserId,
) -> RepositoryResult<User> {
    let host = repo
        .get_user(host_id)
        .await
        .map_err(|e| e.with_operation(operation))?;
    if !host.role.can_host() {
        return Err(RepositoryError::validation_with_context(
            format!("User {} has role {} and cannot host", host.id, host.role),
            ErrorContext::new(operation)
                .with_entity("user")
                .with_entity_id(host.id)
                .with_details("field=host_id"),
        ));
    }
    Ok(host)
}

// ==================== Accommodations ====================

pub async fn create_accommodation<R: FullRepository + ?Sized>(
    repo: &R,
    accommodation: NewAccommodation,
) -> RepositoryResult<Accommodation> {
    const OP: &str = "create_accommodation";
    validation::validate_register_number(&accommodation.register_number)?;
    validation::validate_accommodation(&accommodation.details)?;
    ensure_can_host(repo, OP, accommodation.details.host_id).await?;

    let created = repo
        .create_accommodation(NewAccommodation {
            register_number: accommodation.register_number.trim().to_string(),
            details: accommodation.details,
        })
        .await?;
    info!(
        "Created accommodation {} in {} for host {}",
        created.register_number, created.location.city, created.host_id
    );
    Ok(created)
}

pub async fn update_accommodation<R: FullRepository + ?Sized>(
    repo: &R,
    register_number: &str,
    details: AccommodationDetails,
) -> RepositoryResult<Accommodation> {
    validation::validate_accommodation(&details)?;
    ensure_can_host(repo, "update_accommodation", details.host_id).await?;
    repo.update_accommodation(register_number, details).await
}

/// Validate and run a search, recording it in the caller's history.
///
/// History recording is best effort: a failure is logged and the results
/// are still returned.
pub async fn search_accommodations<R: FullRepository + ?Sized>(
    repo: &R,
    criteria: SearchCriteria,
    user_id: Option<UserId>,
) -> RepositoryResult<Page<SearchHit>> {
    let criteria = criteria.normalized();
    criteria.validate()?;
    let page = repo.search_accommodations(&criteria).await?;
    debug!(
        "Search matched {} accommodations (page {} of {})",
        page.total_elements,
        page.page + 1,
        page.total_pages
    );

    if let Some(user_id) = user_id {
        if let Err(e) = repo.record_search(user_id, &criteria).await {
            warn!("Failed to record search for user {}: {}", user_id, e);
        }
    }
    Ok(page)
}

// ==================== Bookings ====================

fn check_capacity(
    operation: &str,
    accommodation: &Accommodation,
    guests: i32,
) -> RepositoryResult<()> {
    if guests > accommodation.num_of_guests {
        return Err(RepositoryError::validation_with_context(
            format!(
                "{} hosts at most {} guests, requested {}",
                accommodation.register_number, accommodation.num_of_guests, guests
            ),
            ErrorContext::new(operation)
                .with_entity("accommodation")
                .with_entity_id(&accommodation.register_number)
                .with_details("field=num_of_guests"),
        ));
    }
    Ok(())
}

/// Price and store a booking.
///
/// The amount is `nights × price_per_night` of the accommodation.
pub async fn create_booking<R: FullRepository + ?Sized>(
    repo: &R,
    booking: NewBooking,
) -> RepositoryResult<Booking> {
    const OP: &str = "create_booking";
    let accommodation = repo
        .get_accommodation(&booking.register_number)
        .await
        .map_err(|e| e.with_operation(OP))?;
    let draft = BookingDraft::from_new(&booking, accommodation.price_per_night);
    validation::validate_booking(&draft)?;
    check_capacity(OP, &accommodation, draft.num_of_guests)?;

    let created = repo.create_booking(draft).await?;
    info!(
        "Booked {} from {} to {} for user {} (amount {:.2})",
        created.register_number, created.check_in, created.check_out, created.user_id, created.amount
    );
    Ok(created)
}

/// Merge an update into a booking, re-validate and reprice it.
pub async fn update_booking<R: FullRepository + ?Sized>(
    repo: &R,
    id: BookingId,
    update: BookingUpdate,
) -> RepositoryResult<Booking> {
    const OP: &str = "update_booking";
    let current = repo.get_booking(id).await?;
    let accommodation = repo
        .get_accommodation(&current.register_number)
        .await
        .map_err(|e| e.with_operation(OP))?;
    let draft = BookingDraft::from_update(&current, &update, accommodation.price_per_night);
    validation::validate_booking(&draft)?;
    check_capacity(OP, &accommodation, draft.num_of_guests)?;
    repo.update_booking(id, draft).await
}

// ==================== Reviews ====================

pub async fn add_accommodation_review<R: FullRepository + ?Sized>(
    repo: &R,
    review: NewAccommodationReview,
) -> RepositoryResult<AccommodationReview> {
    validation::validate_accommodation_review(&review)?;
    repo.create_accommodation_review(review).await
}

pub async fn update_accommodation_review<R: FullRepository + ?Sized>(
    repo: &R,
    id: ReviewId,
    update: ReviewUpdate,
) -> RepositoryResult<AccommodationReview> {
    validation::validate_review_update(&update)?;
    repo.update_accommodation_review(id, update).await
}

/// Store a review of a host; the reviewed user must be able to host.
pub async fn add_host_review<R: FullRepository + ?Sized>(
    repo: &R,
    review: NewHostReview,
) -> RepositoryResult<HostReview> {
    validation::validate_host_review(&review)?;
    ensure_can_host(repo, "create_host_review", review.host_id).await?;
    repo.create_host_review(review).await
}

// ==================== Catalog ====================

pub async fn create_currency<R: FullRepository + ?Sized>(
    repo: &R,
    currency: NewCurrency,
) -> RepositoryResult<Currency> {
    validation::validate_currency(&currency)?;
    repo.create_currency(currency).await
}

pub async fn create_plan<R: FullRepository + ?Sized>(
    repo: &R,
    plan: NewPlan,
) -> RepositoryResult<AppPlan> {
    validation::validate_plan(&plan)?;
    repo.create_plan(NewPlan {
        name: plan.name.trim().to_string(),
        price: plan.price,
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{NewLocation, UserRole};
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::UserRepository;
    use chrono::NaiveDate;

    fn new_user(email: &str, role: UserRole) -> NewUser {
        NewUser {
            name: "Iker".into(),
            surname: "Etxeberria".into(),
            email: email.into(),
            phone: None,
            password: "s3cret-pass".into(),
            profile_image: None,
            role,
        }
    }

    fn listing(register_number: &str, host_id: UserId) -> NewAccommodation {
        NewAccommodation {
            register_number: register_number.into(),
            details: AccommodationDetails {
                host_id,
                num_of_beds: 3,
                num_of_bathrooms: 1,
                num_of_bedrooms: 2,
                price_per_night: 80.0,
                num_of_guests: 4,
                area: 70.0,
                category_id: None,
                location: NewLocation {
                    city: "Bilbao".into(),
                    country: "Spain".into(),
                    address: "Calle Ercilla 1".into(),
                    latitude: 43.263,
                    longitude: -2.935,
                },
            },
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_login_checks_password() {
        let repo = LocalRepository::new();
        let user = register_user(&repo, new_user("iker@example.com", UserRole::Base))
            .await
            .unwrap();

        let ok = login(&repo, " IKER@example.com ", "s3cret-pass").await.unwrap();
        assert_eq!(ok.map(|u| u.id), Some(user.id));
        assert!(login(&repo, "iker@example.com", "wrong-pass")
            .await
            .unwrap()
            .is_none());
        assert!(login(&repo, "nobody@example.com", "s3cret-pass")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_base_user_cannot_host() {
        let repo = LocalRepository::new();
        let guest = register_user(&repo, new_user("guest@example.com", UserRole::Base))
            .await
            .unwrap();
        let err = create_accommodation(&repo, listing("BI-1", guest.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_booking_is_priced_and_capacity_checked() {
        let repo = LocalRepository::new();
        let host = register_user(&repo, new_user("host@example.com", UserRole::Host))
            .await
            .unwrap();
        let guest = register_user(&repo, new_user("guest@example.com", UserRole::Base))
            .await
            .unwrap();
        create_accommodation(&repo, listing("BI-1", host.id)).await.unwrap();

        let booking = create_booking(
            &repo,
            NewBooking {
                register_number: "BI-1".into(),
                user_id: guest.id,
                check_in: date(2024, 8, 1),
                check_out: date(2024, 8, 4),
                num_of_guests: 2,
                payment_id: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(booking.amount, 240.0);

        let err = update_booking(
            &repo,
            booking.id,
            BookingUpdate {
                num_of_guests: Some(9),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));

        let moved = update_booking(
            &repo,
            booking.id,
            BookingUpdate {
                check_out: Some(date(2024, 8, 6)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.amount, 400.0);
    }

    #[tokio::test]
    async fn test_search_records_history_for_caller() {
        let repo = LocalRepository::new();
        let host = register_user(&repo, new_user("host@example.com", UserRole::Host))
            .await
            .unwrap();
        create_accommodation(&repo, listing("BI-1", host.id)).await.unwrap();

        let criteria = SearchCriteria {
            city: Some("  bilb ".into()),
            ..Default::default()
        };
        let page = search_accommodations(&repo, criteria, Some(host.id))
            .await
            .unwrap();
        assert_eq!(page.total_elements, 1);

        let history = repo.list_searches(host.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].criteria.city.as_deref(), Some("bilb"));
    }

    #[tokio::test]
    async fn test_search_history_failure_is_not_fatal() {
        let repo = LocalRepository::new();
        let page = search_accommodations(&repo, SearchCriteria::default(), Some(UserId(99)))
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }
}
