//! `/accomodations` endpoints: listings, search, images and categories.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{created, parse_id, CreatedResult, HandlerResult};
use crate::api::{
    Accommodation, AccommodationCategory, AccommodationDetails, AccommodationImage, ImageId,
    NewAccommodation, NewCategory, NewImage, Page, SearchCriteria, SearchHit,
};
use crate::db::services as db_services;
use crate::http::auth::{AdminUser, CurrentUser, MaybeUser};
use crate::http::dto::SearchQuery;
use crate::http::error::AppError;
use crate::http::extract::{ApiJson, ApiQuery};
use crate::http::state::AppState;
use crate::services::validation;

/// Load a listing and check that the caller hosts it (or is an admin).
async fn owned_accommodation(
    state: &AppState,
    caller: &CurrentUser,
    register_number: &str,
) -> Result<Accommodation, AppError> {
    let accommodation = state.repository.get_accommodation(register_number).await?;
    caller.ensure_self_or_admin(accommodation.host_id)?;
    Ok(accommodation)
}

/// GET /accomodations/all
pub async fn list_accommodations(
    State(state): State<AppState>,
) -> HandlerResult<Vec<Accommodation>> {
    Ok(Json(state.repository.list_accommodations().await?))
}

/// POST /accomodations/new
pub async fn create_accommodation(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiJson(accommodation): ApiJson<NewAccommodation>,
) -> CreatedResult<Accommodation> {
    caller.ensure_self_or_admin(accommodation.details.host_id)?;
    let accommodation =
        db_services::create_accommodation(state.repository.as_ref(), accommodation).await?;
    tracing::info!(
        "Accommodation {} listed by host {}",
        accommodation.register_number,
        accommodation.host_id
    );
    created(accommodation)
}

/// GET /accomodations/search
///
/// Identified callers get the criteria recorded in their search history.
pub async fn search_accommodations(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> HandlerResult<Page<SearchHit>> {
    let criteria = SearchCriteria::try_from(query)?;
    let page = db_services::search_accommodations(
        state.repository.as_ref(),
        criteria,
        caller.map(|user| user.id),
    )
    .await?;
    Ok(Json(page))
}

/// GET /accomodations/city/{city}
pub async fn list_by_city(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> HandlerResult<Vec<Accommodation>> {
    Ok(Json(state.repository.list_accommodations_by_city(&city).await?))
}

/// GET /accomodations/{register_number}
pub async fn get_accommodation(
    State(state): State<AppState>,
    Path(register_number): Path<String>,
) -> HandlerResult<Accommodation> {
    Ok(Json(state.repository.get_accommodation(&register_number).await?))
}

/// PUT /accomodations/{register_number}
pub async fn update_accommodation(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(register_number): Path<String>,
    ApiJson(details): ApiJson<AccommodationDetails>,
) -> HandlerResult<Accommodation> {
    owned_accommodation(&state, &caller, &register_number).await?;
    // Handing a listing to another host is an admin operation.
    caller.ensure_self_or_admin(details.host_id)?;
    let accommodation =
        db_services::update_accommodation(state.repository.as_ref(), &register_number, details)
            .await?;
    Ok(Json(accommodation))
}

/// DELETE /accomodations/{register_number}
pub async fn delete_accommodation(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(register_number): Path<String>,
) -> Result<StatusCode, AppError> {
    owned_accommodation(&state, &caller, &register_number).await?;
    state.repository.delete_accommodation(&register_number).await?;
    tracing::info!("Accommodation {} deleted by {}", register_number, caller.0.id);
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Images
// =============================================================================

/// GET /accomodations/{register_number}/images
pub async fn list_images(
    State(state): State<AppState>,
    Path(register_number): Path<String>,
) -> HandlerResult<Vec<AccommodationImage>> {
    Ok(Json(state.repository.list_images(&register_number).await?))
}

/// POST /accomodations/{register_number}/images
pub async fn attach_image(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(register_number): Path<String>,
    ApiJson(image): ApiJson<NewImage>,
) -> CreatedResult<AccommodationImage> {
    validation::validate_image(&image)?;
    owned_accommodation(&state, &caller, &register_number).await?;
    let image = state.repository.attach_image(&register_number, image).await?;
    created(image)
}

/// DELETE /accomodations/{register_number}/images/{image_id}
pub async fn remove_image(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path((register_number, image_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let image_id: ImageId = parse_id("imageId", &image_id)?;
    owned_accommodation(&state, &caller, &register_number).await?;
    state.repository.remove_image(&register_number, image_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Categories
// =============================================================================

/// GET /accomodations/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> HandlerResult<Vec<AccommodationCategory>> {
    Ok(Json(state.repository.list_categories().await?))
}

/// POST /accomodations/categories/new
pub async fn create_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(category): ApiJson<NewCategory>,
) -> CreatedResult<AccommodationCategory> {
    validation::validate_category(&category)?;
    let category = state.repository.create_category(category).await?;
    created(category)
}
