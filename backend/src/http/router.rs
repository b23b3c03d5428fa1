//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, accommodations, bookings, catalog, payments, reviews, users};
use super::state::AppState;

/// Origin allowed by CORS; any origin when unset.
pub const CORS_ORIGIN_ENV: &str = "CORS_ALLOWED_ORIGIN";

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

fn cors_layer() -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match std::env::var(CORS_ORIGIN_ENV) {
        Ok(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => layer.allow_origin(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid {}='{}'", CORS_ORIGIN_ENV, origin);
                layer.allow_origin(Any)
            }
        },
        Err(_) => layer.allow_origin(Any),
    }
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/new", post(users::register_user))
        .route("/login", post(users::login))
        .route("/all", get(users::list_users))
        .route("/all/started", get(users::list_started_users))
        .route("/load/{email}", get(users::get_user_by_email))
        .route("/reviews/new", post(reviews::add_host_review))
        .route(
            "/reviews/{id}",
            get(reviews::list_host_reviews).delete(reviews::delete_host_review),
        )
        .route(
            "/{user_id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/{user_id}/searches", get(users::list_searches))
}

fn config_routes() -> Router<AppState> {
    Router::new()
        .route("/new", post(users::create_configuration))
        .route(
            "/u/{user_id}",
            get(users::get_configuration)
                .put(users::update_configuration)
                .delete(users::delete_configuration_by_user),
        )
        .route("/{config_id}", delete(users::delete_configuration))
}

fn accommodation_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(accommodations::list_accommodations))
        .route("/new", post(accommodations::create_accommodation))
        .route("/search", get(accommodations::search_accommodations))
        .route("/city/{city}", get(accommodations::list_by_city))
        .route("/categories", get(accommodations::list_categories))
        .route("/categories/new", post(accommodations::create_category))
        .route("/reviews/new", post(reviews::add_accommodation_review))
        .route(
            "/reviews/{id}",
            get(reviews::list_accommodation_reviews)
                .put(reviews::update_accommodation_review)
                .delete(reviews::delete_accommodation_review),
        )
        .route(
            "/{register_number}",
            get(accommodations::get_accommodation)
                .put(accommodations::update_accommodation)
                .delete(accommodations::delete_accommodation),
        )
        .route(
            "/{register_number}/images",
            get(accommodations::list_images).post(accommodations::attach_image),
        )
        .route(
            "/{register_number}/images/{image_id}",
            delete(accommodations::remove_image),
        )
}

fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/new", post(bookings::create_booking))
        .route("/between", get(bookings::list_bookings_between))
        .route("/year/{year}", get(bookings::list_bookings_by_year))
        .route("/user/{user_id}", get(bookings::list_bookings_by_user))
        .route("/user/{user_id}/count", get(bookings::count_bookings_by_user))
        .route(
            "/{booking_id}",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        .route("/{booking_id}/payment", get(bookings::get_booking_payment))
}

fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/new", post(payments::create_payment))
        .route("/all", get(payments::list_payments))
        .route(
            "/{payment_id}",
            get(payments::get_payment)
                .put(payments::update_payment)
                .delete(payments::delete_payment),
        )
}

fn catalog_routes() -> Router<AppState> {
    let currencies = Router::new()
        .route("/all", get(catalog::list_currencies))
        .route("/new", post(catalog::create_currency))
        .route("/{currency_id}", get(catalog::get_currency));

    let plans = Router::new()
        .route("/all", get(catalog::list_plans))
        .route("/new", post(catalog::create_plan))
        .route("/features", get(catalog::list_features))
        .route("/features/new", post(catalog::create_feature))
        .route("/{plan_id}", get(catalog::get_plan))
        .route(
            "/{plan_id}/features/{feature_id}",
            put(catalog::add_feature_to_plan).delete(catalog::remove_feature_from_plan),
        );

    Router::new()
        .nest("/currencies", currencies)
        .nest("/plans", plans)
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/users", user_routes())
        .nest("/config", config_routes())
        .nest("/accomodations", accommodation_routes())
        .nest("/bookings", booking_routes())
        .nest("/payments", payment_routes())
        .merge(catalog_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::FullRepository;
    use axum::{body::Body, http::Request, http::StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router() -> Router {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
        create_router(AppState::new(repo))
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_segments_win_over_params() {
        let response = router()
            .oneshot(
                Request::get("/accomodations/categories")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router()
            .oneshot(Request::get("/plans/features").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = router()
            .oneshot(Request::get("/listings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
