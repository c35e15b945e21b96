use sqlx::PgPool;
use tracing::info;

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Running webhook mirror migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS webhooks (
            id VARCHAR(64) PRIMARY KEY,
            url TEXT NOT NULL,
            country VARCHAR(255) NOT NULL DEFAULT '',
            event VARCHAR(16) NOT NULL,
            mirrored_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Webhook mirror migrations completed successfully");
    Ok(())
}
