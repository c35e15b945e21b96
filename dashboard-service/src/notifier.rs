//! Best-effort webhook fan-out.
//!
//! Every matching subscription gets one POST per event on its own tracked task.
//! Nothing awaits a delivery on behalf of the caller: failures are logged and
//! dropped, and there is no retry or acknowledgement tracking.

use common::http_client::HttpClient;
use common::models::{LifecycleEvent, Webhook, WebhookPayload, timestamp_now};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::store::SharedCache;

#[derive(Clone)]
pub struct Notifier {
    cache: SharedCache,
    http_client: Arc<HttpClient>,
    tracker: TaskTracker,
    semaphore: Arc<Semaphore>,
}

impl Notifier {
    pub fn new(cache: SharedCache, http_client: Arc<HttpClient>, max_concurrent: usize) -> Self {
        Self {
            cache,
            http_client,
            tracker: TaskTracker::new(),
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Selects matching subscriptions and schedules one delivery each.
    ///
    /// Returns once deliveries are scheduled, not when they complete.
    pub async fn notify(&self, event: LifecycleEvent, country: &str) -> usize {
        let targets: Vec<Webhook> = {
            let cache = self.cache.read().await;
            cache
                .webhooks
                .values()
                .filter(|webhook| webhook.matches(event, country))
                .cloned()
                .collect()
        };

        if targets.is_empty() {
            debug!(event = %event, country = %country, "No webhooks subscribed");
            return 0;
        }

        info!(
            event = %event,
            country = %country,
            targets = targets.len(),
            "Dispatching webhook notifications"
        );

        let count = targets.len();
        for webhook in targets {
            let payload = WebhookPayload {
                id: webhook.id.clone(),
                country: country.to_string(),
                event: event.as_str().to_string(),
                time: timestamp_now(),
            };
            self.spawn_delivery(webhook.url, payload);
        }
        count
    }

    /// Runs `notify` on a tracked task so the caller does not wait for webhook selection either
    pub fn notify_in_background(&self, event: LifecycleEvent, country: String) {
        let notifier = self.clone();
        self.tracker.spawn(async move {
            notifier.notify(event, &country).await;
        });
    }

    fn spawn_delivery(&self, url: String, payload: WebhookPayload) {
        let http_client = self.http_client.clone();
        let semaphore = self.semaphore.clone();
        let span = info_span!("webhook_delivery", webhook_id = %payload.id, url = %url);

        self.tracker.spawn(
            async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        warn!("Delivery semaphore closed, dropping notification");
                        return;
                    }
                };

                match http_client.post_json(&url, &payload).await {
                    Ok(()) => debug!(event = %payload.event, "Webhook delivered"),
                    Err(e) => warn!(event = %payload.event, error = %e, "Webhook delivery failed"),
                }
            }
            .instrument(span),
        );
    }

    /// Number of notification tasks still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until every task spawned so far has finished, or `grace` elapses.
    ///
    /// Returns `true` when all tasks drained in time. New notifications may
    /// still be spawned afterwards.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tracker.close();
        let drained = tokio::time::timeout(grace, self.tracker.wait())
            .await
            .is_ok();
        self.tracker.reopen();
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Cache;
    use serde_json::json;
    use tokio::sync::RwLock;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method, path},
    };

    fn webhook(id: &str, url: String, country: &str, event: &str) -> Webhook {
        Webhook {
            id: id.into(),
            url,
            country: country.into(),
            event: event.into(),
        }
    }

    async fn notifier_with(webhooks: Vec<Webhook>) -> Notifier {
        let mut cache = Cache::default();
        for webhook in webhooks {
            cache.webhooks.insert(webhook.id.clone(), webhook);
        }
        Notifier::new(
            Arc::new(RwLock::new(cache)),
            Arc::new(HttpClient::new(2, 0)),
            4,
        )
    }

    #[tokio::test]
    async fn delivers_to_matching_subscriptions_only() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/global"))
            .and(body_partial_json(json!({ "id": "g", "country": "NO", "event": "DELETE" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/norway"))
            .and(body_partial_json(json!({ "id": "n", "country": "NO" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/sweden"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let notifier = notifier_with(vec![
            webhook("g", format!("{}/global", server.uri()), "", "delete"),
            webhook("n", format!("{}/norway", server.uri()), "no", "DELETE"),
            webhook("s", format!("{}/sweden", server.uri()), "SE", "DELETE"),
            webhook("r", format!("{}/register", server.uri()), "", "REGISTER"),
        ])
        .await;

        let scheduled = notifier.notify(LifecycleEvent::Delete, "NO").await;

        assert_eq!(scheduled, 2);
        assert!(notifier.drain(Duration::from_secs(5)).await);
        assert_eq!(notifier.in_flight(), 0);
    }

    #[tokio::test]
    async fn failed_delivery_does_not_affect_others() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = notifier_with(vec![
            webhook("dead", "http://127.0.0.1:9/unreachable".into(), "", "CHANGE"),
            webhook("bad", format!("{}/missing", server.uri()), "", "CHANGE"),
            webhook("ok", format!("{}/ok", server.uri()), "", "CHANGE"),
        ])
        .await;

        assert_eq!(notifier.notify(LifecycleEvent::Change, "SE").await, 3);
        assert!(notifier.drain(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn background_notification_is_tracked() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/invoke"))
            .and(body_partial_json(json!({ "event": "INVOKE", "country": "SE" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = notifier_with(vec![webhook(
            "i",
            format!("{}/invoke", server.uri()),
            "se",
            "invoke",
        )])
        .await;

        notifier.notify_in_background(LifecycleEvent::Invoke, "SE".into());

        assert!(notifier.drain(Duration::from_secs(5)).await);
    }
}
