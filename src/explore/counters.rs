use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::models::page::ListingStats;
use crate::models::Listing;
use crate::store::StoreResult;

/// Source of view/like counters shown on enriched listings
#[async_trait]
pub trait CounterService: Send + Sync {
    async fn counts(&self, listing: &Listing) -> StoreResult<ListingStats>;

    async fn record_view(&self, listing_id: &str) -> StoreResult<()>;

    async fn record_like(&self, listing_id: &str) -> StoreResult<()>;

    async fn remove_like(&self, listing_id: &str) -> StoreResult<()>;
}

/// Stand-in until an authoritative counter source exists: the row's own view
/// counter and zero likes. Recording is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderCounters;

#[async_trait]
impl CounterService for PlaceholderCounters {
    async fn counts(&self, listing: &Listing) -> StoreResult<ListingStats> {
        Ok(ListingStats {
            views: listing.view_count,
            likes: 0,
        })
    }

    async fn record_view(&self, _listing_id: &str) -> StoreResult<()> {
        Ok(())
    }

    async fn record_like(&self, _listing_id: &str) -> StoreResult<()> {
        Ok(())
    }

    async fn remove_like(&self, _listing_id: &str) -> StoreResult<()> {
        Ok(())
    }
}

/// Process-local counters layered on top of the row's stored view count
#[derive(Debug, Default)]
pub struct InMemoryCounters {
    recorded: Mutex<HashMap<String, ListingStats>>,
}

impl InMemoryCounters {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterService for InMemoryCounters {
    async fn counts(&self, listing: &Listing) -> StoreResult<ListingStats> {
        let recorded = self
            .recorded
            .lock()
            .await
            .get(&listing.id)
            .copied()
            .unwrap_or_default();
        Ok(ListingStats {
            views: listing.view_count + recorded.views,
            likes: recorded.likes,
        })
    }

    async fn record_view(&self, listing_id: &str) -> StoreResult<()> {
        let mut recorded = self.recorded.lock().await;
        recorded.entry(listing_id.to_string()).or_default().views += 1;
        Ok(())
    }

    async fn record_like(&self, listing_id: &str) -> StoreResult<()> {
        let mut recorded = self.recorded.lock().await;
        recorded.entry(listing_id.to_string()).or_default().likes += 1;
        Ok(())
    }

    async fn remove_like(&self, listing_id: &str) -> StoreResult<()> {
        let mut recorded = self.recorded.lock().await;
        if let Some(stats) = recorded.get_mut(listing_id) {
            stats.likes = stats.likes.saturating_sub(1);
        }
        Ok(())
    }
}
