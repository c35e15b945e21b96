use common::errors::AppError;
use common::models::{LifecycleEvent, Webhook};
use tracing::{info, instrument, warn};

use super::DashboardStore;

impl DashboardStore {
    #[instrument(skip(self, draft), fields(event = %draft.event, country = %draft.country))]
    pub async fn create_webhook(&self, draft: Webhook) -> Result<Webhook, AppError> {
        if draft.url.trim().is_empty() {
            return Err(AppError::validation("Webhook url is required"));
        }
        let event: LifecycleEvent = draft.event.parse().map_err(AppError::validation)?;

        let webhook = Webhook {
            id: self.ids.next(),
            url: draft.url.trim().to_string(),
            country: draft.country.trim().to_string(),
            event: event.as_str().to_string(),
        };

        {
            let mut cache = self.cache.write().await;
            cache.webhooks.insert(webhook.id.clone(), webhook.clone());
        }
        info!(id = %webhook.id, url = %webhook.url, "Webhook registered");

        self.persist().await;
        if let Some(mirror) = &self.mirror
            && let Err(e) = mirror.upsert(&webhook).await
        {
            warn!(id = %webhook.id, error = %e, "Failed to mirror webhook");
        }

        Ok(webhook)
    }

    pub async fn get_webhook(&self, id: &str) -> Result<Webhook, AppError> {
        let cache = self.cache.read().await;
        cache
            .webhooks
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Webhook {} not found", id)))
    }

    pub async fn list_webhooks(&self) -> Vec<Webhook> {
        let cache = self.cache.read().await;
        cache.webhooks.values().cloned().collect()
    }

    pub async fn webhook_count(&self) -> usize {
        self.cache.read().await.webhooks.len()
    }

    #[instrument(skip(self))]
    pub async fn delete_webhook(&self, id: &str) -> Result<Webhook, AppError> {
        let removed = {
            let mut cache = self.cache.write().await;
            cache.webhooks.remove(id)
        }
        .ok_or_else(|| AppError::not_found(format!("Webhook {} not found", id)))?;
        info!(id = %id, "Webhook deleted");

        self.persist().await;
        if let Some(mirror) = &self.mirror
            && let Err(e) = mirror.remove(id).await
        {
            warn!(id = %id, error = %e, "Failed to remove mirrored webhook");
        }

        Ok(removed)
    }
}
