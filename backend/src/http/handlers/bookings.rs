//! `/bookings` endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{created, parse_id, CreatedResult, HandlerResult};
use crate::api::{Booking, BookingId, BookingUpdate, NewBooking, Payment, UserId};
use crate::db::services as db_services;
use crate::http::auth::{AdminUser, CurrentUser};
use crate::http::dto::{CountResponse, DateRangeQuery};
use crate::http::error::AppError;
use crate::http::extract::{ApiJson, ApiQuery};
use crate::http::state::AppState;

/// Load a booking made by the caller (any booking for admins).
async fn owned_booking(
    state: &AppState,
    caller: &CurrentUser,
    raw_id: &str,
) -> Result<Booking, AppError> {
    let id: BookingId = parse_id("bookingId", raw_id)?;
    let booking = state.repository.get_booking(id).await?;
    caller.ensure_self_or_admin(booking.user_id)?;
    Ok(booking)
}

/// POST /bookings/new
pub async fn create_booking(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiJson(booking): ApiJson<NewBooking>,
) -> CreatedResult<Booking> {
    caller.ensure_self_or_admin(booking.user_id)?;
    let booking = db_services::create_booking(state.repository.as_ref(), booking).await?;
    tracing::info!(
        "Booking {} on {} for {} night(s)",
        booking.id,
        booking.register_number,
        booking.nights()
    );
    created(booking)
}

/// GET /bookings/{booking_id}
pub async fn get_booking(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(booking_id): Path<String>,
) -> HandlerResult<Booking> {
    Ok(Json(owned_booking(&state, &caller, &booking_id).await?))
}

/// PUT /bookings/{booking_id}
///
/// The amount is recomputed from the stored nightly price.
pub async fn update_booking(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(booking_id): Path<String>,
    ApiJson(update): ApiJson<BookingUpdate>,
) -> HandlerResult<Booking> {
    let current = owned_booking(&state, &caller, &booking_id).await?;
    let booking = db_services::update_booking(state.repository.as_ref(), current.id, update).await?;
    Ok(Json(booking))
}

/// DELETE /bookings/{booking_id}
pub async fn delete_booking(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(booking_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let current = owned_booking(&state, &caller, &booking_id).await?;
    state.repository.delete_booking(current.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /bookings/between?from=YYYY-MM-DD&to=YYYY-MM-DD
pub async fn list_bookings_between(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(range): ApiQuery<DateRangeQuery>,
) -> HandlerResult<Vec<Booking>> {
    if range.from > range.to {
        return Err(AppError::BadRequest(format!(
            "'from' ({}) must not be after 'to' ({})",
            range.from, range.to
        )));
    }
    Ok(Json(
        state
            .repository
            .list_bookings_between(range.from, range.to)
            .await?,
    ))
}

/// GET /bookings/year/{year}
///
/// Bookings created during the given calendar year (UTC).
pub async fn list_bookings_by_year(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(year): Path<String>,
) -> HandlerResult<Vec<Booking>> {
    let year: i32 = parse_id("year", &year)?;
    Ok(Json(state.repository.list_bookings_by_year(year).await?))
}

/// GET /bookings/user/{user_id}
pub async fn list_bookings_by_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(user_id): Path<String>,
) -> HandlerResult<Vec<Booking>> {
    let id: UserId = parse_id("userId", &user_id)?;
    caller.ensure_self_or_admin(id)?;
    Ok(Json(state.repository.list_bookings_by_user(id).await?))
}

/// GET /bookings/user/{user_id}/count
pub async fn count_bookings_by_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(user_id): Path<String>,
) -> HandlerResult<CountResponse> {
    let id: UserId = parse_id("userId", &user_id)?;
    caller.ensure_self_or_admin(id)?;
    let count = state.repository.count_bookings_by_user(id).await?;
    Ok(Json(CountResponse { count }))
}

/// GET /bookings/{booking_id}/payment
pub async fn get_booking_payment(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(booking_id): Path<String>,
) -> HandlerResult<Payment> {
    let booking = owned_booking(&state, &caller, &booking_id).await?;
    Ok(Json(state.repository.get_booking_payment(booking.id).await?))
}
