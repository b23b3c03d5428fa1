//! Caller identity.
//!
//! The caller is named by the `X-User-Id` header and resolved against the
//! repository on every request. Sessions and tokens are out of scope; the
//! header is trusted as sent.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::AppError;
use super::state::AppState;
use crate::api::{User, UserId};

pub const USER_ID_HEADER: &str = "x-user-id";

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(raw) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let id: UserId = raw
        .to_str()
        .ok()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| AppError::BadRequest("X-User-Id must be a numeric user id".to_string()))?;

    match state.repository.get_user(id).await {
        Ok(user) => Ok(Some(user)),
        Err(e) if e.is_not_found() => Err(AppError::Unauthorized(format!(
            "Unknown user {} in X-User-Id",
            id
        ))),
        Err(e) => Err(e.into()),
    }
}

/// The caller when the header is present; anonymous otherwise.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await.map(MaybeUser)
    }
}

/// An identified caller; rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Callers may act on their own records; admins on anyone's.
    pub fn ensure_self_or_admin(&self, owner: UserId) -> Result<(), AppError> {
        if self.0.id == owner || self.0.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "User {} may not act on behalf of user {}",
                self.0.id, owner
            )))
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("X-User-Id header is required".to_string()))
    }
}

/// A caller with the admin role; 401 when anonymous, 403 otherwise.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err(AppError::Forbidden(format!(
                "User {} is not an administrator",
                user.id
            )));
        }
        Ok(AdminUser(user))
    }
}
