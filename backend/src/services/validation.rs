//! Input validation for write operations.
//!
//! Every check returns `RepositoryError::ValidationError` with the offending
//! field recorded in the error context, so handlers can map it to a 400.

use crate::api::{
    AccommodationDetails, BookingDraft, NewAccommodationReview, NewCategory, NewCurrency,
    NewHostReview, NewImage, NewPayment, NewPlan, NewPlanFeature, NewUser, ReviewUpdate,
    UserUpdate,
};
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::services::geo::GeoPoint;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_STARS: i32 = 1;
pub const MAX_STARS: i32 = 5;

fn invalid(operation: &str, field: &str, message: impl Into<String>) -> RepositoryError {
    RepositoryError::validation_with_context(
        message,
        ErrorContext::new(operation).with_details(format!("field={}", field)),
    )
}

fn require_text(operation: &str, field: &str, value: &str) -> RepositoryResult<()> {
    if value.trim().is_empty() {
        return Err(invalid(operation, field, format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Loose shape check: one `@` with a non-empty local part and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

fn check_email(operation: &str, email: &str) -> RepositoryResult<()> {
    if !is_valid_email(email) {
        return Err(invalid(
            operation,
            "email",
            format!("'{}' is not a valid email address", email),
        ));
    }
    Ok(())
}

fn check_password(operation: &str, password: &str) -> RepositoryResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(
            operation,
            "password",
            format!("password must have at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}

fn check_stars(operation: &str, stars: i32) -> RepositoryResult<()> {
    if !(MIN_STARS..=MAX_STARS).contains(&stars) {
        return Err(invalid(
            operation,
            "stars",
            format!("stars must be between {} and {}, got {}", MIN_STARS, MAX_STARS, stars),
        ));
    }
    Ok(())
}

pub fn validate_new_user(user: &NewUser) -> RepositoryResult<()> {
    const OP: &str = "create_user";
    require_text(OP, "name", &user.name)?;
    require_text(OP, "surname", &user.surname)?;
    check_email(OP, &user.email)?;
    check_password(OP, &user.password)
}

pub fn validate_user_update(update: &UserUpdate) -> RepositoryResult<()> {
    const OP: &str = "update_user";
    if let Some(name) = &update.name {
        require_text(OP, "name", name)?;
    }
    if let Some(surname) = &update.surname {
        require_text(OP, "surname", surname)?;
    }
    if let Some(email) = &update.email {
        check_email(OP, email)?;
    }
    if let Some(password) = &update.password {
        check_password(OP, password)?;
    }
    Ok(())
}

pub fn validate_register_number(register_number: &str) -> RepositoryResult<()> {
    require_text("create_accommodation", "register_number", register_number)
}

pub fn validate_accommodation(details: &AccommodationDetails) -> RepositoryResult<()> {
    const OP: &str = "save_accommodation";
    for (field, value) in [
        ("num_of_beds", details.num_of_beds),
        ("num_of_bathrooms", details.num_of_bathrooms),
        ("num_of_bedrooms", details.num_of_bedrooms),
    ] {
        if value < 0 {
            return Err(invalid(OP, field, format!("{} must not be negative", field)));
        }
    }
    if details.num_of_guests < 1 {
        return Err(invalid(OP, "num_of_guests", "num_of_guests must be at least 1"));
    }
    if !details.price_per_night.is_finite() || details.price_per_night <= 0.0 {
        return Err(invalid(
            OP,
            "price_per_night",
            "price_per_night must be a positive amount",
        ));
    }
    if !details.area.is_finite() || details.area < 0.0 {
        return Err(invalid(OP, "area", "area must not be negative"));
    }
    require_text(OP, "location.city", &details.location.city)?;
    require_text(OP, "location.country", &details.location.country)?;
    let point = GeoPoint::new(details.location.latitude, details.location.longitude);
    if !point.is_valid() {
        return Err(invalid(
            OP,
            "location",
            format!(
                "coordinates ({}, {}) are out of range",
                point.latitude, point.longitude
            ),
        ));
    }
    Ok(())
}

pub fn validate_accommodation_review(review: &NewAccommodationReview) -> RepositoryResult<()> {
    const OP: &str = "create_accommodation_review";
    require_text(OP, "content", &review.content)?;
    check_stars(OP, review.stars)
}

pub fn validate_review_update(update: &ReviewUpdate) -> RepositoryResult<()> {
    const OP: &str = "update_accommodation_review";
    if let Some(content) = &update.content {
        require_text(OP, "content", content)?;
    }
    if let Some(stars) = update.stars {
        check_stars(OP, stars)?;
    }
    Ok(())
}

pub fn validate_host_review(review: &NewHostReview) -> RepositoryResult<()> {
    const OP: &str = "create_host_review";
    if review.host_id == review.reviewer_id {
        return Err(invalid(OP, "reviewer_id", "users cannot review themselves"));
    }
    require_text(OP, "content", &review.content)?;
    check_stars(OP, review.stars)
}

/// Date and guest checks for a booking; capacity is checked by the caller,
/// which knows the accommodation.
pub fn validate_booking(booking: &BookingDraft) -> RepositoryResult<()> {
    const OP: &str = "save_booking";
    if booking.check_out <= booking.check_in {
        return Err(invalid(
            OP,
            "check_out",
            format!(
                "check_out ({}) must be after check_in ({})",
                booking.check_out, booking.check_in
            ),
        ));
    }
    if booking.num_of_guests < 1 {
        return Err(invalid(OP, "num_of_guests", "num_of_guests must be at least 1"));
    }
    Ok(())
}

pub fn validate_currency(currency: &NewCurrency) -> RepositoryResult<()> {
    const OP: &str = "create_currency";
    require_text(OP, "alphanumeric_code", &currency.alphanumeric_code)?;
    require_text(OP, "name", &currency.name)
}

pub fn validate_plan(plan: &NewPlan) -> RepositoryResult<()> {
    const OP: &str = "create_plan";
    require_text(OP, "name", &plan.name)?;
    if !plan.price.is_finite() || plan.price < 0.0 {
        return Err(invalid(OP, "price", "price must not be negative"));
    }
    Ok(())
}

pub fn validate_payment(payment: &NewPayment) -> RepositoryResult<()> {
    require_text("save_payment", "title", &payment.title)
}

pub fn validate_category(category: &NewCategory) -> RepositoryResult<()> {
    require_text("create_category", "description", &category.description)
}

pub fn validate_image(image: &NewImage) -> RepositoryResult<()> {
    require_text("attach_image", "url", &image.url)
}

pub fn validate_feature(feature: &NewPlanFeature) -> RepositoryResult<()> {
    require_text("create_feature", "detail", &feature.detail)
}

/// Language of a stored configuration, when one is given.
pub fn validate_language(language: Option<&str>) -> RepositoryResult<()> {
    match language {
        Some(language) => require_text("save_user_configuration", "language", language),
        None => Ok(()),
    }
}
