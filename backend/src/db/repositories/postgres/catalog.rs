use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;

use super::models::*;
use super::schema::*;
use super::{map_diesel_error, or_missing, PostgresRepository};
use crate::api::{
    AppPlan, Currency, CurrencyId, FeatureId, NewCurrency, NewPlan, NewPlanFeature, PlanFeature,
    PlanId,
};
use crate::db::repository::{CatalogRepository, RepositoryError, RepositoryResult};

/// Attach linked features to each plan, keeping the plan order.
fn load_plans(conn: &mut PgConnection, rows: Vec<PlanRow>) -> RepositoryResult<Vec<AppPlan>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let plan_ids: Vec<i64> = rows.iter().map(|r| r.plan_id).collect();
    let links: Vec<(i64, FeatureRow)> = plan_feature_app_plans::table
        .inner_join(plan_features::table)
        .filter(plan_feature_app_plans::plan_id.eq_any(plan_ids))
        .order(plan_features::feature_id.asc())
        .select((plan_feature_app_plans::plan_id, FeatureRow::as_select()))
        .load(conn)
        .map_err(map_diesel_error)?;

    let mut features: HashMap<i64, Vec<PlanFeature>> = HashMap::new();
    for (plan_id, feature) in links {
        features.entry(plan_id).or_default().push(feature.into());
    }

    Ok(rows
        .into_iter()
        .map(|row| AppPlan {
            id: PlanId(row.plan_id),
            features: features.remove(&row.plan_id).unwrap_or_default(),
            name: row.name,
            price: row.price,
        })
        .collect())
}

fn load_plan(conn: &mut PgConnection, op: &'static str, id: PlanId) -> RepositoryResult<AppPlan> {
    let row = app_plans::table
        .find(id.0)
        .select(PlanRow::as_select())
        .first::<PlanRow>(conn)
        .map_err(or_missing(op, "plan", id))?;
    load_plans(conn, vec![row])?
        .pop()
        .ok_or_else(|| RepositoryError::missing(op, "plan", id))
}

#[async_trait]
impl CatalogRepository for PostgresRepository {
    async fn list_currencies(&self) -> RepositoryResult<Vec<Currency>> {
        self.with_conn(|conn| {
            app_currencies::table
                .order(app_currencies::currency_id.asc())
                .select(CurrencyRow::as_select())
                .load::<CurrencyRow>(conn)
                .map(|rows| rows.into_iter().map(Into::into).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_currency(&self, id: CurrencyId) -> RepositoryResult<Currency> {
        self.with_conn(move |conn| {
            app_currencies::table
                .find(id.0)
                .select(CurrencyRow::as_select())
                .first::<CurrencyRow>(conn)
                .map(Into::into)
                .map_err(or_missing("get_currency", "currency", id))
        })
        .await
    }

    async fn create_currency(&self, currency: NewCurrency) -> RepositoryResult<Currency> {
        const OP: &str = "create_currency";
        let code = currency.alphanumeric_code.trim().to_uppercase();
        self.with_conn(move |conn| {
            diesel::insert_into(app_currencies::table)
                .values(&NewCurrencyRow {
                    alphanumeric_code: code.clone(),
                    name: currency.name,
                    entity: currency.entity,
                    code: currency.code,
                })
                .returning(CurrencyRow::as_returning())
                .get_result::<CurrencyRow>(conn)
                .map(Into::into)
                .map_err(|e| match map_diesel_error(e) {
                    RepositoryError::Conflict { .. } => RepositoryError::conflict_on(
                        OP,
                        "currency",
                        &code,
                        format!("Currency {} already exists", code),
                    ),
                    other => other.with_operation(OP),
                })
        })
        .await
    }

    async fn list_plans(&self) -> RepositoryResult<Vec<AppPlan>> {
        self.with_conn(|conn| {
            let rows = app_plans::table
                .order(app_plans::plan_id.asc())
                .select(PlanRow::as_select())
                .load::<PlanRow>(conn)
                .map_err(map_diesel_error)?;
            load_plans(conn, rows)
        })
        .await
    }

    async fn get_plan(&self, id: PlanId) -> RepositoryResult<AppPlan> {
        self.with_conn(move |conn| load_plan(conn, "get_plan", id))
            .await
    }

    async fn create_plan(&self, plan: NewPlan) -> RepositoryResult<AppPlan> {
        self.with_conn(move |conn| {
            let row: PlanRow = diesel::insert_into(app_plans::table)
                .values((app_plans::name.eq(&plan.name), app_plans::price.eq(plan.price)))
                .returning(PlanRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(AppPlan {
                id: PlanId(row.plan_id),
                name: row.name,
                price: row.price,
                features: Vec::new(),
            })
        })
        .await
    }

    async fn list_features(&self) -> RepositoryResult<Vec<PlanFeature>> {
        self.with_conn(|conn| {
            plan_features::table
                .order(plan_features::feature_id.asc())
                .select(FeatureRow::as_select())
                .load::<FeatureRow>(conn)
                .map(|rows| rows.into_iter().map(Into::into).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn create_feature(&self, feature: NewPlanFeature) -> RepositoryResult<PlanFeature> {
        self.with_conn(move |conn| {
            diesel::insert_into(plan_features::table)
                .values(plan_features::detail.eq(&feature.detail))
                .returning(FeatureRow::as_returning())
                .get_result::<FeatureRow>(conn)
                .map(Into::into)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn add_feature_to_plan(
        &self,
        plan_id: PlanId,
        feature_id: FeatureId,
    ) -> RepositoryResult<AppPlan> {
        const OP: &str = "add_feature_to_plan";
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let plan_found: bool = diesel::select(exists(app_plans::table.find(plan_id.0)))
                    .get_result(tx)
                    .map_err(map_diesel_error)?;
                if !plan_found {
                    return Err(RepositoryError::missing(OP, "plan", plan_id));
                }
                let feature_found: bool =
                    diesel::select(exists(plan_features::table.find(feature_id.0)))
                        .get_result(tx)
                        .map_err(map_diesel_error)?;
                if !feature_found {
                    return Err(RepositoryError::missing(OP, "feature", feature_id));
                }
                diesel::insert_into(plan_feature_app_plans::table)
                    .values((
                        plan_feature_app_plans::plan_id.eq(plan_id.0),
                        plan_feature_app_plans::feature_id.eq(feature_id.0),
                    ))
                    .on_conflict_do_nothing()
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                load_plan(tx, OP, plan_id)
            })
        })
        .await
    }

    async fn remove_feature_from_plan(
        &self,
        plan_id: PlanId,
        feature_id: FeatureId,
    ) -> RepositoryResult<AppPlan> {
        const OP: &str = "remove_feature_from_plan";
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let plan_found: bool = diesel::select(exists(app_plans::table.find(plan_id.0)))
                    .get_result(tx)
                    .map_err(map_diesel_error)?;
                if !plan_found {
                    return Err(RepositoryError::missing(OP, "plan", plan_id));
                }
                let removed = diesel::delete(
                    plan_feature_app_plans::table.find((plan_id.0, feature_id.0)),
                )
                .execute(tx)
                .map_err(map_diesel_error)?;
                if removed == 0 {
                    return Err(RepositoryError::missing(OP, "feature", feature_id));
                }
                load_plan(tx, OP, plan_id)
            })
        })
        .await
    }
}
