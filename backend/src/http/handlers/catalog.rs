//! `/currencies` and `/plans` endpoints. Reads are public, writes are admin-only.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{created, parse_id, CreatedResult, HandlerResult};
use crate::api::{
    AppPlan, Currency, CurrencyId, FeatureId, NewCurrency, NewPlan, NewPlanFeature, PlanFeature,
    PlanId,
};
use crate::db::services as db_services;
use crate::http::auth::AdminUser;
use crate::http::extract::ApiJson;
use crate::http::state::AppState;
use crate::services::validation;

// =============================================================================
// Currencies
// =============================================================================

/// GET /currencies/all
pub async fn list_currencies(State(state): State<AppState>) -> HandlerResult<Vec<Currency>> {
    Ok(Json(state.repository.list_currencies().await?))
}

/// POST /currencies/new
pub async fn create_currency(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(currency): ApiJson<NewCurrency>,
) -> CreatedResult<Currency> {
    let currency = db_services::create_currency(state.repository.as_ref(), currency).await?;
    created(currency)
}

/// GET /currencies/{currency_id}
pub async fn get_currency(
    State(state): State<AppState>,
    Path(currency_id): Path<String>,
) -> HandlerResult<Currency> {
    let id: CurrencyId = parse_id("currencyId", &currency_id)?;
    Ok(Json(state.repository.get_currency(id).await?))
}

// =============================================================================
// Plans and features
// =============================================================================

/// GET /plans/all
pub async fn list_plans(State(state): State<AppState>) -> HandlerResult<Vec<AppPlan>> {
    Ok(Json(state.repository.list_plans().await?))
}

/// POST /plans/new
pub async fn create_plan(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(plan): ApiJson<NewPlan>,
) -> CreatedResult<AppPlan> {
    let plan = db_services::create_plan(state.repository.as_ref(), plan).await?;
    created(plan)
}

/// GET /plans/{plan_id}
pub async fn get_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> HandlerResult<AppPlan> {
    let id: PlanId = parse_id("planId", &plan_id)?;
    Ok(Json(state.repository.get_plan(id).await?))
}

/// GET /plans/features
pub async fn list_features(State(state): State<AppState>) -> HandlerResult<Vec<PlanFeature>> {
    Ok(Json(state.repository.list_features().await?))
}

/// POST /plans/features/new
pub async fn create_feature(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(feature): ApiJson<NewPlanFeature>,
) -> CreatedResult<PlanFeature> {
    validation::validate_feature(&feature)?;
    let feature = state.repository.create_feature(feature).await?;
    created(feature)
}

/// PUT /plans/{plan_id}/features/{feature_id}
pub async fn add_feature_to_plan(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((plan_id, feature_id)): Path<(String, String)>,
) -> HandlerResult<AppPlan> {
    let plan_id: PlanId = parse_id("planId", &plan_id)?;
    let feature_id: FeatureId = parse_id("featureId", &feature_id)?;
    Ok(Json(
        state
            .repository
            .add_feature_to_plan(plan_id, feature_id)
            .await?,
    ))
}

/// DELETE /plans/{plan_id}/features/{feature_id}
pub async fn remove_feature_from_plan(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((plan_id, feature_id)): Path<(String, String)>,
) -> HandlerResult<AppPlan> {
    let plan_id: PlanId = parse_id("planId", &plan_id)?;
    let feature_id: FeatureId = parse_id("featureId", &feature_id)?;
    Ok(Json(
        state
            .repository
            .remove_feature_from_plan(plan_id, feature_id)
            .await?,
    ))
}
