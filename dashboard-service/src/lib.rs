//! Country dashboard backend: registrations, webhook subscriptions and
//! composed dashboard views over external country, currency and weather APIs.

pub mod config;
pub mod dashboard;
pub mod db;
pub mod handlers;
pub mod notifier;
pub mod openapi;
pub mod providers;
pub mod store;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use handlers::AppState;

pub const API_PREFIX: &str = "/dashboard/v1";

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/registrations",
            post(handlers::create_registration).get(handlers::list_registrations),
        )
        .route(
            "/registrations/{id}",
            get(handlers::get_registration)
                .put(handlers::update_registration)
                .delete(handlers::delete_registration),
        )
        .route("/dashboards/{id}", get(handlers::get_dashboard))
        .route(
            "/notifications",
            post(handlers::create_webhook).get(handlers::list_webhooks),
        )
        .route(
            "/notifications/{id}",
            get(handlers::get_webhook).delete(handlers::delete_webhook),
        )
        .route("/status", get(handlers::status));

    Router::new()
        .route("/health", get(handlers::health))
        .nest(API_PREFIX, api)
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
