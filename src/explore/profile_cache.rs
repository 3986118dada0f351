use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::models::OwnerSummary;
use crate::store::{ProfileDirectory, StoreResult};

struct Entry {
    fetched_at: Instant,
    summary: Option<OwnerSummary>,
}

/// Time-boxed cache in front of a profile directory.
///
/// Owned by whoever constructs it and passed in explicitly. Callers that
/// change or sign out a profile call [`ProfileCache::invalidate`]. Failed
/// lookups are never cached.
pub struct ProfileCache<D> {
    inner: D,
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl<D: ProfileDirectory> ProfileCache<D> {
    pub fn new(inner: D, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn invalidate(&self, owner_id: &str) {
        self.entries.lock().await.remove(owner_id);
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl<D: ProfileDirectory> ProfileDirectory for ProfileCache<D> {
    async fn summary(&self, owner_id: &str) -> StoreResult<Option<OwnerSummary>> {
        {
            let entries = self.entries.lock().await;
            if let Some(entry) = entries.get(owner_id) {
                if entry.fetched_at.elapsed() < self.ttl {
                    return Ok(entry.summary.clone());
                }
            }
        }

        debug!("Profile cache miss for {}", owner_id);
        let summary = self.inner.summary(owner_id).await?;
        self.entries.lock().await.insert(
            owner_id.to_string(),
            Entry {
                fetched_at: Instant::now(),
                summary: summary.clone(),
            },
        );
        Ok(summary)
    }
}
