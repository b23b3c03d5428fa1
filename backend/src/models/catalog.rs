use serde::{Deserialize, Serialize};

use crate::api::{CurrencyId, FeatureId, PlanId};

/// ISO 4217 style currency entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: CurrencyId,
    /// Alphabetic code, e.g. `EUR`
    pub alphanumeric_code: String,
    pub name: String,
    /// Issuing entity, e.g. `European Union`
    pub entity: String,
    /// Numeric code, e.g. `978`
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCurrency {
    pub alphanumeric_code: String,
    pub name: String,
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFeature {
    pub id: FeatureId,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlanFeature {
    pub detail: String,
}

/// Subscription plan offered to hosts, with the features it bundles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPlan {
    pub id: PlanId,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub features: Vec<PlanFeature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlan {
    pub name: String,
    pub price: f64,
}
