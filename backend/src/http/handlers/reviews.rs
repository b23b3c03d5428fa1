//! Accommodation reviews (`/accomodations/reviews`) and host reviews
//! (`/users/reviews`).
//!
//! On both prefixes `GET /{id}` lists by the reviewed subject (register number
//! or host id) while `PUT`/`DELETE /{id}` address a single review.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{created, parse_id, CreatedResult, HandlerResult};
use crate::api::{
    AccommodationReview, HostReview, HostReviewId, NewAccommodationReview, NewHostReview,
    ReviewId, ReviewUpdate, UserId,
};
use crate::db::services as db_services;
use crate::http::auth::CurrentUser;
use crate::http::error::AppError;
use crate::http::extract::ApiJson;
use crate::http::state::AppState;

// =============================================================================
// Accommodation reviews
// =============================================================================

/// POST /accomodations/reviews/new
pub async fn add_accommodation_review(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiJson(review): ApiJson<NewAccommodationReview>,
) -> CreatedResult<AccommodationReview> {
    caller.ensure_self_or_admin(review.user_id)?;
    let review = db_services::add_accommodation_review(state.repository.as_ref(), review).await?;
    created(review)
}

/// GET /accomodations/reviews/{register_number}
pub async fn list_accommodation_reviews(
    State(state): State<AppState>,
    Path(register_number): Path<String>,
) -> HandlerResult<Vec<AccommodationReview>> {
    Ok(Json(
        state
            .repository
            .list_accommodation_reviews(&register_number)
            .await?,
    ))
}

/// PUT /accomodations/reviews/{review_id}
pub async fn update_accommodation_review(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(review_id): Path<String>,
    ApiJson(update): ApiJson<ReviewUpdate>,
) -> HandlerResult<AccommodationReview> {
    let id: ReviewId = parse_id("reviewId", &review_id)?;
    let current = state.repository.get_accommodation_review(id).await?;
    caller.ensure_self_or_admin(current.user_id)?;
    let review =
        db_services::update_accommodation_review(state.repository.as_ref(), id, update).await?;
    Ok(Json(review))
}

/// DELETE /accomodations/reviews/{review_id}
pub async fn delete_accommodation_review(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(review_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: ReviewId = parse_id("reviewId", &review_id)?;
    let current = state.repository.get_accommodation_review(id).await?;
    caller.ensure_self_or_admin(current.user_id)?;
    state.repository.delete_accommodation_review(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Host reviews
// =============================================================================

/// POST /users/reviews/new
pub async fn add_host_review(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiJson(review): ApiJson<NewHostReview>,
) -> CreatedResult<HostReview> {
    caller.ensure_self_or_admin(review.reviewer_id)?;
    let review = db_services::add_host_review(state.repository.as_ref(), review).await?;
    created(review)
}

/// GET /users/reviews/{host_id}
pub async fn list_host_reviews(
    State(state): State<AppState>,
    Path(host_id): Path<String>,
) -> HandlerResult<Vec<HostReview>> {
    let host_id: UserId = parse_id("hostId", &host_id)?;
    Ok(Json(state.repository.list_host_reviews(host_id).await?))
}

/// DELETE /users/reviews/{review_id}
pub async fn delete_host_review(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(review_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: HostReviewId = parse_id("hostReviewId", &review_id)?;
    let current = state.repository.get_host_review(id).await?;
    caller.ensure_self_or_admin(current.reviewer_id)?;
    state.repository.delete_host_review(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
