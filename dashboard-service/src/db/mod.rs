//! Optional PostgreSQL mirror of webhook subscriptions.

pub mod migrations;
pub mod queries;

use common::models::Webhook;
use sqlx::PgPool;
use tracing::warn;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPool::connect(database_url).await?;

    // Run migrations
    migrations::run_migrations(&pool).await?;

    Ok(pool)
}

#[derive(Clone)]
pub struct WebhookMirror {
    pool: PgPool,
}

impl WebhookMirror {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            pool: create_pool(database_url).await?,
        })
    }

    pub async fn upsert(&self, webhook: &Webhook) -> Result<(), sqlx::Error> {
        queries::upsert_webhook(&self.pool, webhook).await
    }

    pub async fn remove(&self, id: &str) -> Result<bool, sqlx::Error> {
        queries::delete_webhook(&self.pool, id).await
    }

    pub async fn ping(&self) -> bool {
        match queries::ping(&self.pool).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Webhook mirror unreachable");
                false
            }
        }
    }
}
