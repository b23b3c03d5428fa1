//! `/users` and `/config` endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{created, parse_id, CreatedResult, HandlerResult};
use crate::api::{
    NewUser, NewUserConfiguration, SearchRecord, User, UserConfiguration, UserConfigurationId,
    UserConfigurationUpdate, UserId, UserUpdate,
};
use crate::db::services as db_services;
use crate::http::auth::{AdminUser, CurrentUser, MaybeUser};
use crate::http::dto::LoginRequest;
use crate::http::error::AppError;
use crate::http::extract::ApiJson;
use crate::http::state::AppState;
use crate::services::validation;

// =============================================================================
// Accounts
// =============================================================================

/// POST /users/new
///
/// Open to anonymous callers; only admins may create admin accounts.
pub async fn register_user(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    ApiJson(user): ApiJson<NewUser>,
) -> CreatedResult<User> {
    let caller_is_admin = caller.as_ref().is_some_and(|c| c.role.is_admin());
    if user.role.is_admin() && !caller_is_admin {
        return Err(AppError::Forbidden(
            "Only administrators can create administrator accounts".to_string(),
        ));
    }
    let user = db_services::register_user(state.repository.as_ref(), user).await?;
    created(user)
}

/// POST /users/login
///
/// 401 on unknown email or wrong password, without saying which.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> HandlerResult<User> {
    db_services::login(state.repository.as_ref(), &request.email, &request.password)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))
}

/// GET /users/all
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> HandlerResult<Vec<User>> {
    Ok(Json(state.repository.list_users().await?))
}

/// GET /users/all/started
///
/// Users that have stored a configuration.
pub async fn list_started_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> HandlerResult<Vec<User>> {
    Ok(Json(state.repository.list_started_users().await?))
}

/// GET /users/{user_id}
pub async fn get_user(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(user_id): Path<String>,
) -> HandlerResult<User> {
    let id: UserId = parse_id("userId", &user_id)?;
    Ok(Json(state.repository.get_user(id).await?))
}

/// GET /users/load/{email}
pub async fn get_user_by_email(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(email): Path<String>,
) -> HandlerResult<User> {
    Ok(Json(state.repository.get_user_by_email(&email).await?))
}

/// PUT /users/{user_id}
pub async fn update_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(user_id): Path<String>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> HandlerResult<User> {
    let id: UserId = parse_id("userId", &user_id)?;
    caller.ensure_self_or_admin(id)?;
    if update.role.is_some() && !caller.0.role.is_admin() {
        return Err(AppError::Forbidden(
            "Only administrators can change roles".to_string(),
        ));
    }
    let user = db_services::update_user(state.repository.as_ref(), id, update).await?;
    Ok(Json(user))
}

/// DELETE /users/{user_id}
pub async fn delete_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: UserId = parse_id("userId", &user_id)?;
    caller.ensure_self_or_admin(id)?;
    state.repository.delete_user(id).await?;
    tracing::info!("User {} deleted by {}", id, caller.0.id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/{user_id}/searches
///
/// Recorded searches, newest first.
pub async fn list_searches(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(user_id): Path<String>,
) -> HandlerResult<Vec<SearchRecord>> {
    let id: UserId = parse_id("userId", &user_id)?;
    caller.ensure_self_or_admin(id)?;
    Ok(Json(state.repository.list_searches(id).await?))
}

// =============================================================================
// Configuration
// =============================================================================

/// POST /config/new
pub async fn create_configuration(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiJson(config): ApiJson<NewUserConfiguration>,
) -> CreatedResult<UserConfiguration> {
    caller.ensure_self_or_admin(config.user_id)?;
    validation::validate_language(Some(&config.language))?;
    let config = state.repository.create_user_configuration(config).await?;
    created(config)
}

/// GET /config/u/{user_id}
pub async fn get_configuration(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(user_id): Path<String>,
) -> HandlerResult<UserConfiguration> {
    let id: UserId = parse_id("userId", &user_id)?;
    caller.ensure_self_or_admin(id)?;
    Ok(Json(state.repository.get_user_configuration(id).await?))
}

/// PUT /config/u/{user_id}
pub async fn update_configuration(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(user_id): Path<String>,
    ApiJson(update): ApiJson<UserConfigurationUpdate>,
) -> HandlerResult<UserConfiguration> {
    let id: UserId = parse_id("userId", &user_id)?;
    caller.ensure_self_or_admin(id)?;
    validation::validate_language(update.language.as_deref())?;
    Ok(Json(
        state.repository.update_user_configuration(id, update).await?,
    ))
}

/// DELETE /config/{config_id}
pub async fn delete_configuration(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(config_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: UserConfigurationId = parse_id("userConfigId", &config_id)?;
    state.repository.delete_user_configuration(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /config/u/{user_id}
pub async fn delete_configuration_by_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: UserId = parse_id("userId", &user_id)?;
    caller.ensure_self_or_admin(id)?;
    state.repository.delete_user_configuration_by_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
