use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;

use super::schema::{
    accommodation_categories, accommodation_images, accommodation_locations,
    accommodation_reviews, accommodations, app_currencies, app_plans, app_users, bookings,
    host_reviews, payments, plan_features, searches, user_configurations,
};
use crate::api::{
    AccommodationCategory, AccommodationImage, AccommodationLocation, AccommodationReview,
    Booking, BookingId, CategoryId, Currency, CurrencyId, FeatureId, HostReview, HostReviewId,
    ImageId, LocationId, Payment, PaymentId, PlanFeature, ReviewId, User, UserConfiguration,
    UserConfigurationId, UserId, UserRole,
};
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};

// ==================== Users ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = app_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub user_id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub profile_image: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn into_user(self) -> RepositoryResult<User> {
        let role: UserRole = self.role.parse().map_err(|e: String| {
            RepositoryError::internal_with_context(
                e,
                ErrorContext::new("decode_user")
                    .with_entity("user")
                    .with_entity_id(self.user_id),
            )
        })?;
        Ok(User {
            id: UserId(self.user_id),
            name: self.name,
            surname: self.surname,
            email: self.email,
            phone: self.phone,
            profile_image: self.profile_image,
            role,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = app_users)]
pub struct NewUserRow {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub profile_image: Option<String>,
    pub role: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = app_users)]
pub struct UserChangeset {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub profile_image: Option<String>,
    pub role: Option<String>,
}

impl UserChangeset {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.surname.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.password_hash.is_none()
            && self.profile_image.is_none()
            && self.role.is_none()
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_configurations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserConfigurationRow {
    pub configuration_id: i64,
    pub user_id: i64,
    pub currency_id: Option<i64>,
    pub language: String,
    pub notifications_enabled: bool,
}

impl From<UserConfigurationRow> for UserConfiguration {
    fn from(row: UserConfigurationRow) -> Self {
        UserConfiguration {
            id: UserConfigurationId(row.configuration_id),
            user_id: UserId(row.user_id),
            currency_id: row.currency_id.map(CurrencyId),
            language: row.language,
            notifications_enabled: row.notifications_enabled,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_configurations)]
pub struct NewUserConfigurationRow {
    pub user_id: i64,
    pub currency_id: Option<i64>,
    pub language: String,
    pub notifications_enabled: bool,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = user_configurations)]
pub struct UserConfigurationChangeset {
    pub currency_id: Option<i64>,
    pub language: Option<String>,
    pub notifications_enabled: Option<bool>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = searches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SearchRow {
    pub search_id: i64,
    pub criteria_json: Value,
    pub created_at: DateTime<Utc>,
}

// ==================== Catalog ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = app_currencies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CurrencyRow {
    pub currency_id: i64,
    pub alphanumeric_code: String,
    pub name: String,
    pub entity: String,
    pub code: String,
}

impl From<CurrencyRow> for Currency {
    fn from(row: CurrencyRow) -> Self {
        Currency {
            id: CurrencyId(row.currency_id),
            alphanumeric_code: row.alphanumeric_code,
            name: row.name,
            entity: row.entity,
            code: row.code,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = app_currencies)]
pub struct NewCurrencyRow {
    pub alphanumeric_code: String,
    pub name: String,
    pub entity: String,
    pub code: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = app_plans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PlanRow {
    pub plan_id: i64,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = plan_features)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FeatureRow {
    pub feature_id: i64,
    pub detail: String,
}

impl From<FeatureRow> for PlanFeature {
    fn from(row: FeatureRow) -> Self {
        PlanFeature {
            id: FeatureId(row.feature_id),
            detail: row.detail,
        }
    }
}

// ==================== Accommodations ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accommodations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AccommodationRow {
    pub register_number: String,
    pub host_id: i64,
    pub num_of_beds: i32,
    pub num_of_bathrooms: i32,
    pub num_of_bedrooms: i32,
    pub price_per_night: f64,
    pub num_of_guests: i32,
    pub area: f64,
    pub category_id: Option<i64>,
    pub location_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accommodations)]
pub struct NewAccommodationRow {
    pub register_number: String,
    pub host_id: i64,
    pub num_of_beds: i32,
    pub num_of_bathrooms: i32,
    pub num_of_bedrooms: i32,
    pub price_per_night: f64,
    pub num_of_guests: i32,
    pub area: f64,
    pub category_id: Option<i64>,
    pub location_id: i64,
}

/// Full overwrite of the mutable columns; `category_id` is written even when `None`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = accommodations)]
#[diesel(treat_none_as_null = true)]
pub struct AccommodationChangeset {
    pub host_id: i64,
    pub num_of_beds: i32,
    pub num_of_bathrooms: i32,
    pub num_of_bedrooms: i32,
    pub price_per_night: f64,
    pub num_of_guests: i32,
    pub area: f64,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accommodation_locations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LocationRow {
    pub location_id: i64,
    pub city: String,
    pub country: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<LocationRow> for AccommodationLocation {
    fn from(row: LocationRow) -> Self {
        AccommodationLocation {
            id: LocationId(row.location_id),
            city: row.city,
            country: row.country,
            address: row.address,
            latitude: row.latitude,
            longitude: row.longitude,
        }
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = accommodation_locations)]
pub struct NewLocationRow {
    pub city: String,
    pub country: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accommodation_categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryRow {
    pub category_id: i64,
    pub description: String,
}

impl From<CategoryRow> for AccommodationCategory {
    fn from(row: CategoryRow) -> Self {
        AccommodationCategory {
            id: CategoryId(row.category_id),
            description: row.description,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accommodation_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ImageRow {
    pub image_id: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl From<ImageRow> for AccommodationImage {
    fn from(row: ImageRow) -> Self {
        AccommodationImage {
            id: ImageId(row.image_id),
            url: row.url,
            created_at: row.created_at,
        }
    }
}

// ==================== Reviews ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accommodation_reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AccommodationReviewRow {
    pub review_id: i64,
    pub register_number: String,
    pub user_id: i64,
    pub content: String,
    pub stars: i32,
    pub created_at: DateTime<Utc>,
}

impl From<AccommodationReviewRow> for AccommodationReview {
    fn from(row: AccommodationReviewRow) -> Self {
        AccommodationReview {
            id: ReviewId(row.review_id),
            register_number: row.register_number,
            user_id: UserId(row.user_id),
            content: row.content,
            stars: row.stars,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accommodation_reviews)]
pub struct NewAccommodationReviewRow {
    pub register_number: String,
    pub user_id: i64,
    pub content: String,
    pub stars: i32,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = accommodation_reviews)]
pub struct ReviewChangeset {
    pub content: Option<String>,
    pub stars: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = host_reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HostReviewRow {
    pub host_review_id: i64,
    pub host_id: i64,
    pub reviewer_id: i64,
    pub content: String,
    pub stars: i32,
    pub created_at: DateTime<Utc>,
}

impl From<HostReviewRow> for HostReview {
    fn from(row: HostReviewRow) -> Self {
        HostReview {
            id: HostReviewId(row.host_review_id),
            host_id: UserId(row.host_id),
            reviewer_id: UserId(row.reviewer_id),
            content: row.content,
            stars: row.stars,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = host_reviews)]
pub struct NewHostReviewRow {
    pub host_id: i64,
    pub reviewer_id: i64,
    pub content: String,
    pub stars: i32,
}

// ==================== Bookings ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BookingRow {
    pub booking_id: i64,
    pub register_number: String,
    pub user_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_of_guests: i32,
    pub amount: f64,
    pub payment_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: BookingId(row.booking_id),
            register_number: row.register_number,
            user_id: UserId(row.user_id),
            check_in: row.check_in,
            check_out: row.check_out,
            num_of_guests: row.num_of_guests,
            amount: row.amount,
            payment_id: row.payment_id.map(PaymentId),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct NewBookingRow {
    pub register_number: String,
    pub user_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_of_guests: i32,
    pub amount: f64,
    pub payment_id: Option<i64>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = bookings)]
#[diesel(treat_none_as_null = true)]
pub struct BookingChangeset {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_of_guests: i32,
    pub amount: f64,
    pub payment_id: Option<i64>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentRow {
    pub payment_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Payment {
            id: PaymentId(row.payment_id),
            title: row.title,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub struct NewPaymentRow {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = payments)]
#[diesel(treat_none_as_null = true)]
pub struct PaymentChangeset {
    pub title: String,
    pub description: Option<String>,
}
