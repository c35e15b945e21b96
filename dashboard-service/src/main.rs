use dashboard_service::config::Config;
use dashboard_service::db::WebhookMirror;
use dashboard_service::store::snapshot::SnapshotError;
use dashboard_service::{AppState, create_router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

/// How long in-flight webhook deliveries may run after shutdown starts
const DELIVERY_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    common::tracing::init(config.log_format);

    let mirror = match &config.database_url {
        Some(url) => match WebhookMirror::connect(url).await {
            Ok(mirror) => {
                info!("Webhook mirror connected");
                Some(mirror)
            }
            Err(e) => {
                warn!(error = %e, "Webhook mirror unavailable, continuing without it");
                None
            }
        },
        None => None,
    };

    let state = AppState::new(&config, mirror);

    match state.store.restore().await {
        Ok(()) => {}
        Err(SnapshotError::NotFound(path)) => {
            info!(path = %path.display(), "No snapshot found, starting with an empty store");
        }
        Err(e) => {
            warn!(error = %e, "Failed to restore snapshot, starting with an empty store");
        }
    }

    let notifier = state.store.notifier().clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Dashboard service starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if !notifier.drain(DELIVERY_GRACE).await {
        warn!(
            in_flight = notifier.in_flight(),
            "Abandoning webhook deliveries still in flight"
        );
    }

    info!("Dashboard service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }

    warn!("Draining requests, pending webhook deliveries get {}s", DELIVERY_GRACE.as_secs());
}
