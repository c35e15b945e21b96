use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use common::errors::AppError;
use common::http_client::HttpClient;
use common::models::{
    DashboardConfig, DashboardConfigUpdate, DashboardView, StatusResponse, Webhook,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::Config;
use crate::dashboard::DashboardComposer;
use crate::db::WebhookMirror;
use crate::notifier::Notifier;
use crate::providers::Providers;
use crate::store::snapshot::SnapshotStore;
use crate::store::{Cache, DashboardStore, SharedCache};

pub const API_VERSION: &str = "v1";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DashboardStore>,
    pub composer: Arc<DashboardComposer>,
    pub providers: Arc<Providers>,
    pub started_at: Instant,
}

impl AppState {
    /// Wires the store, notifier, providers and composer around one shared cache
    pub fn new(config: &Config, mirror: Option<WebhookMirror>) -> Self {
        let http_client = Arc::new(HttpClient::new(
            config.http_timeout_seconds,
            config.http_max_retries,
        ));
        let cache: SharedCache = Arc::new(RwLock::new(Cache::default()));
        let providers = Arc::new(Providers::new(config, http_client.clone()));
        let notifier = Notifier::new(
            cache.clone(),
            http_client,
            config.max_concurrent_deliveries,
        );
        let store = Arc::new(DashboardStore::new(
            cache,
            SnapshotStore::new(&config.snapshot_path),
            providers.clone(),
            notifier,
            mirror,
        ));
        let composer = Arc::new(DashboardComposer::new(store.clone(), providers.clone()));

        Self {
            store,
            composer,
            providers,
            started_at: Instant::now(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health check")
    )
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "dashboard-service" }))
}

#[utoipa::path(
    post,
    path = "/dashboard/v1/registrations",
    request_body = DashboardConfig,
    responses(
        (status = 201, description = "Configuration registered", body = DashboardConfig),
        (status = 400, description = "Malformed JSON body")
    ),
    tag = "registrations"
)]
pub async fn create_registration(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<DashboardConfig>), AppError> {
    let draft: DashboardConfig = serde_json::from_slice(&body)?;
    info!(country = %draft.country, iso_code = %draft.iso_code, "Registration request received");

    let created = state.store.create_registration(draft).await;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/dashboard/v1/registrations",
    responses(
        (status = 200, description = "All registered configurations", body = Vec<DashboardConfig>)
    ),
    tag = "registrations"
)]
pub async fn list_registrations(State(state): State<AppState>) -> Json<Vec<DashboardConfig>> {
    Json(state.store.list_registrations().await)
}

#[utoipa::path(
    get,
    path = "/dashboard/v1/registrations/{id}",
    params(
        ("id" = String, Path, description = "Configuration ID")
    ),
    responses(
        (status = 200, description = "Stored configuration", body = DashboardConfig),
        (status = 404, description = "Configuration not found")
    ),
    tag = "registrations"
)]
pub async fn get_registration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DashboardConfig>, AppError> {
    Ok(Json(state.store.get_registration(&id).await?))
}

#[utoipa::path(
    put,
    path = "/dashboard/v1/registrations/{id}",
    params(
        ("id" = String, Path, description = "Configuration ID")
    ),
    request_body = DashboardConfigUpdate,
    responses(
        (status = 204, description = "Configuration updated"),
        (status = 400, description = "Malformed JSON body"),
        (status = 404, description = "Configuration not found")
    ),
    tag = "registrations"
)]
pub async fn update_registration(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let update: DashboardConfigUpdate = serde_json::from_slice(&body)?;
    info!(id = %id, "Update request received");

    state.store.update_registration(&id, update).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/dashboard/v1/registrations/{id}",
    params(
        ("id" = String, Path, description = "Configuration ID")
    ),
    responses(
        (status = 204, description = "Configuration deleted"),
        (status = 404, description = "Configuration not found")
    ),
    tag = "registrations"
)]
pub async fn delete_registration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete_registration(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/dashboard/v1/dashboards/{id}",
    params(
        ("id" = String, Path, description = "Configuration ID")
    ),
    responses(
        (status = 200, description = "Populated dashboard view", body = DashboardView),
        (status = 404, description = "Configuration not found")
    ),
    tag = "dashboards"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DashboardView>, AppError> {
    info!(id = %id, "Dashboard request received");

    let view = state.composer.compose(&id).await?;

    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/dashboard/v1/notifications",
    request_body = Webhook,
    responses(
        (status = 201, description = "Webhook registered", body = Webhook),
        (status = 400, description = "Malformed body, missing url or unknown event")
    ),
    tag = "notifications"
)]
pub async fn create_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Webhook>), AppError> {
    let draft: Webhook = serde_json::from_slice(&body)?;

    let created = state.store.create_webhook(draft).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/dashboard/v1/notifications",
    responses(
        (status = 200, description = "All registered webhooks", body = Vec<Webhook>)
    ),
    tag = "notifications"
)]
pub async fn list_webhooks(State(state): State<AppState>) -> Json<Vec<Webhook>> {
    Json(state.store.list_webhooks().await)
}

#[utoipa::path(
    get,
    path = "/dashboard/v1/notifications/{id}",
    params(
        ("id" = String, Path, description = "Webhook ID")
    ),
    responses(
        (status = 200, description = "Webhook subscription", body = Webhook),
        (status = 404, description = "Webhook not found")
    ),
    tag = "notifications"
)]
pub async fn get_webhook(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Webhook>, AppError> {
    Ok(Json(state.store.get_webhook(&id).await?))
}

#[utoipa::path(
    delete,
    path = "/dashboard/v1/notifications/{id}",
    params(
        ("id" = String, Path, description = "Webhook ID")
    ),
    responses(
        (status = 204, description = "Webhook deleted"),
        (status = 404, description = "Webhook not found")
    ),
    tag = "notifications"
)]
pub async fn delete_webhook(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete_webhook(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/dashboard/v1/status",
    responses(
        (status = 200, description = "Provider reachability and service summary", body = StatusResponse)
    ),
    tag = "status"
)]
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let ((countries_api, meteo_api, currency_api), notification_db, webhooks) = tokio::join!(
        state.providers.probe(),
        state.store.mirror_status(),
        state.store.webhook_count(),
    );

    Json(StatusResponse {
        countries_api,
        meteo_api,
        currency_api,
        notification_db,
        webhooks,
        version: API_VERSION.to_string(),
        uptime: state.started_at.elapsed().as_secs(),
    })
}
