//! HTTP API server with observability for the errand service.
//!
//! Provides REST endpoints for users, orders, reviews and notifications,
//! with structured logging (tracing) and Prometheus metrics. The router is
//! generic over the backing [`store::Store`], so tests run against the
//! in-memory store and production against PostgreSQL.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use domain::{Notifier, OrderService, ReviewService, UserService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/users", post(routes::users::create::<S>))
        .route("/users", get(routes::users::list::<S>))
        .route("/users/{id}", get(routes::users::profile::<S>))
        .route("/users/{id}/profile", patch(routes::users::update_profile::<S>))
        .route(
            "/users/{id}/preferences",
            patch(routes::users::update_preferences::<S>),
        )
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", patch(routes::orders::set_status::<S>))
        .route(
            "/orders/{id}/cancel-acceptance",
            patch(routes::orders::cancel_acceptance::<S>),
        )
        .route(
            "/orders/{id}/review-status",
            get(routes::reviews::status::<S>),
        )
        .route("/reviews", post(routes::reviews::create::<S>))
        .route("/notifications", get(routes::notifications::list::<S>))
        .route(
            "/notifications/mark-read",
            post(routes::notifications::mark_read::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the shared application state over the given store.
pub fn build_state<S: Store>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        users: UserService::new(store.clone()),
        orders: OrderService::new(store.clone()),
        reviews: ReviewService::new(store.clone()),
        notifier: Notifier::new(store),
    })
}
