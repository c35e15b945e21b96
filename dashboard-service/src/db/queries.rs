use common::models::Webhook;
use sqlx::PgPool;

pub async fn upsert_webhook(pool: &PgPool, webhook: &Webhook) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO webhooks (id, url, country, event)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE
        SET url = EXCLUDED.url, country = EXCLUDED.country, event = EXCLUDED.event, mirrored_at = NOW()
        "#,
    )
    .bind(&webhook.id)
    .bind(&webhook.url)
    .bind(&webhook.country)
    .bind(&webhook.event)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_webhook(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM webhooks WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;
    Ok(())
}
