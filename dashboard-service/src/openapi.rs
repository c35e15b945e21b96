use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use common::models::{
    Coordinates, DashboardConfig, DashboardConfigUpdate, DashboardFeatures, DashboardView,
    Features, FeaturesUpdate, LifecycleEvent, StatusResponse, Webhook, WebhookPayload,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::create_registration,
        handlers::list_registrations,
        handlers::get_registration,
        handlers::update_registration,
        handlers::delete_registration,
        handlers::get_dashboard,
        handlers::create_webhook,
        handlers::list_webhooks,
        handlers::get_webhook,
        handlers::delete_webhook,
        handlers::status,
    ),
    components(schemas(
        DashboardConfig,
        Features,
        DashboardConfigUpdate,
        FeaturesUpdate,
        DashboardView,
        DashboardFeatures,
        Coordinates,
        Webhook,
        WebhookPayload,
        LifecycleEvent,
        StatusResponse,
    )),
    tags(
        (name = "registrations", description = "Dashboard configuration management"),
        (name = "dashboards", description = "Populated dashboard views"),
        (name = "notifications", description = "Webhook subscriptions"),
        (name = "status", description = "Service and provider status"),
    ),
)]
struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
