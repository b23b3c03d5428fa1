//! Catalog repository trait: currencies, subscription plans and plan features.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{
    AppPlan, Currency, CurrencyId, FeatureId, NewCurrency, NewPlan, NewPlanFeature, PlanFeature,
    PlanId,
};

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_currencies(&self) -> RepositoryResult<Vec<Currency>>;

    async fn get_currency(&self, id: CurrencyId) -> RepositoryResult<Currency>;

    /// # Returns
    /// * `Err(RepositoryError::Conflict)` - If the alphanumeric code already exists
    async fn create_currency(&self, currency: NewCurrency) -> RepositoryResult<Currency>;

    /// Plans with their features.
    async fn list_plans(&self) -> RepositoryResult<Vec<AppPlan>>;

    async fn get_plan(&self, id: PlanId) -> RepositoryResult<AppPlan>;

    async fn create_plan(&self, plan: NewPlan) -> RepositoryResult<AppPlan>;

    async fn list_features(&self) -> RepositoryResult<Vec<PlanFeature>>;

    async fn create_feature(&self, feature: NewPlanFeature) -> RepositoryResult<PlanFeature>;

    /// Link a feature to a plan. Linking twice is a no-op.
    async fn add_feature_to_plan(&self, plan_id: PlanId, feature_id: FeatureId)
        -> RepositoryResult<AppPlan>;

    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the feature is not linked to the plan
    async fn remove_feature_from_plan(
        &self,
        plan_id: PlanId,
        feature_id: FeatureId,
    ) -> RepositoryResult<AppPlan>;
}
