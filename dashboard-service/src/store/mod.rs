//! In-memory registration and webhook state with snapshot persistence.
//!
//! Both maps live behind one `tokio::sync::RwLock`. Mutations hold the write
//! lock only for the map change; the snapshot is written afterwards under a
//! read lock, and notifications are scheduled outside any lock.

mod registrations;
pub mod snapshot;
mod webhooks;

use chrono::Utc;
use common::models::{DashboardConfig, Webhook};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::db::WebhookMirror;
use crate::notifier::Notifier;
use crate::providers::Providers;
use snapshot::{SnapshotError, SnapshotStore};

/// Process-wide state, persisted as a whole on every mutation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cache {
    #[serde(default)]
    pub configs: HashMap<String, DashboardConfig>,
    #[serde(default)]
    pub webhooks: HashMap<String, Webhook>,
}

pub type SharedCache = Arc<RwLock<Cache>>;

/// Time-derived ids, strictly increasing for the life of the process
#[derive(Debug, Default)]
struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    fn next(&self) -> String {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1).to_string()
    }
}

pub struct DashboardStore {
    cache: SharedCache,
    snapshot: SnapshotStore,
    providers: Arc<Providers>,
    notifier: Notifier,
    mirror: Option<WebhookMirror>,
    ids: IdGenerator,
}

impl DashboardStore {
    pub fn new(
        cache: SharedCache,
        snapshot: SnapshotStore,
        providers: Arc<Providers>,
        notifier: Notifier,
        mirror: Option<WebhookMirror>,
    ) -> Self {
        Self {
            cache,
            snapshot,
            providers,
            notifier,
            mirror,
            ids: IdGenerator::default(),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Replaces the in-memory state with the last snapshot.
    ///
    /// `SnapshotError::NotFound` means there is nothing to restore yet and the
    /// store stays empty.
    pub async fn restore(&self) -> Result<(), SnapshotError> {
        let loaded = self.snapshot.load().await?;

        let mut cache = self.cache.write().await;
        *cache = loaded;
        info!(
            path = %self.snapshot.path().display(),
            configs = cache.configs.len(),
            webhooks = cache.webhooks.len(),
            "Restored snapshot"
        );
        Ok(())
    }

    /// Writes the current state to disk. Failures are logged, never returned.
    async fn persist(&self) {
        let cache = self.cache.read().await;
        if let Err(e) = self.snapshot.save(&cache).await {
            error!(
                path = %self.snapshot.path().display(),
                error = %e,
                "Failed to save snapshot"
            );
        }
    }

    /// 200 when the webhook mirror answers (or none is configured), otherwise 500
    pub async fn mirror_status(&self) -> u16 {
        match &self.mirror {
            Some(mirror) if !mirror.ping().await => 500,
            _ => 200,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let ids = IdGenerator::default();
        let generated: Vec<i64> = (0..1000).map(|_| ids.next().parse().unwrap()).collect();

        assert!(generated.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn restore_loads_saved_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut saved = Cache::default();
        saved.webhooks.insert(
            "7".into(),
            Webhook {
                id: "7".into(),
                url: "http://localhost/hook".into(),
                country: "".into(),
                event: "INVOKE".into(),
            },
        );
        SnapshotStore::new(&path).save(&saved).await.unwrap();

        let store = test_support::store_at(&path, "http://127.0.0.1:9");
        store.restore().await.unwrap();

        assert_eq!(store.list_webhooks().await, vec![saved.webhooks["7"].clone()]);
    }

    #[tokio::test]
    async fn restore_without_snapshot_keeps_store_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_support::store_at(&dir.path().join("cache.json"), "http://127.0.0.1:9");

        assert!(matches!(store.restore().await, Err(SnapshotError::NotFound(_))));
        assert!(store.list_registrations().await.is_empty());
        assert_eq!(store.mirror_status().await, 200);
    }
}
