//! `/payments` endpoints. Payment methods are shared records; writes need an
//! identified caller.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{created, parse_id, CreatedResult, HandlerResult};
use crate::api::{NewPayment, Payment, PaymentId};
use crate::http::auth::CurrentUser;
use crate::http::error::AppError;
use crate::http::extract::ApiJson;
use crate::http::state::AppState;
use crate::services::validation;

/// POST /payments/new
pub async fn create_payment(
    State(state): State<AppState>,
    _caller: CurrentUser,
    ApiJson(payment): ApiJson<NewPayment>,
) -> CreatedResult<Payment> {
    validation::validate_payment(&payment)?;
    let payment = state.repository.create_payment(payment).await?;
    created(payment)
}

/// GET /payments/all
pub async fn list_payments(State(state): State<AppState>) -> HandlerResult<Vec<Payment>> {
    Ok(Json(state.repository.list_payments().await?))
}

/// GET /payments/{payment_id}
pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> HandlerResult<Payment> {
    let id: PaymentId = parse_id("paymentId", &payment_id)?;
    Ok(Json(state.repository.get_payment(id).await?))
}

/// PUT /payments/{payment_id}
pub async fn update_payment(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(payment_id): Path<String>,
    ApiJson(payment): ApiJson<NewPayment>,
) -> HandlerResult<Payment> {
    let id: PaymentId = parse_id("paymentId", &payment_id)?;
    validation::validate_payment(&payment)?;
    Ok(Json(state.repository.update_payment(id, payment).await?))
}

/// DELETE /payments/{payment_id}
///
/// 409 while a booking still references the payment.
pub async fn delete_payment(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(payment_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: PaymentId = parse_id("paymentId", &payment_id)?;
    state.repository.delete_payment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
