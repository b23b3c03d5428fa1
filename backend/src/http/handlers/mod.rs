//! HTTP handlers for the REST API.
//!
//! Handlers parse the request, check the caller and delegate to
//! [`crate::db::services`] or straight to the repository for plain reads.

use std::str::FromStr;

use axum::{extract::State, http::StatusCode, Json};

use super::dto::HealthResponse;
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;

pub mod accommodations;
pub mod bookings;
pub mod catalog;
pub mod payments;
pub mod reviews;
pub mod users;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create a resource.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

/// Parse a path segment into an id, rejecting malformed values with 400.
pub(crate) fn parse_id<T: FromStr>(name: &str, raw: &str) -> Result<T, AppError> {
    raw.parse::<T>().map_err(|_| {
        tracing::debug!("Rejected {} path value '{}'", name, raw);
        AppError::BadRequest(format!("{} '{}' is not a valid numeric id", name, raw))
    })
}

pub(crate) fn created<T>(value: T) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(value)))
}

/// GET /health
///
/// Reports whether the repository answers.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UserId;

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert_eq!(parse_id::<UserId>("userId", "12").unwrap(), UserId(12));
        let err = parse_id::<UserId>("userId", "twelve").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
