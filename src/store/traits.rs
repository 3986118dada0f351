use async_trait::async_trait;
use std::sync::Arc;

use crate::error::StoreError;
use crate::models::{Listing, ListingDetail, MediaItem, OwnerSummary};
use crate::query::{FilterChain, GeoCandidate, GeoRadius, OrderBy, Window};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Relational query capability over the listing collection
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Number of rows matching `filters`, independent of any window
    async fn count(&self, filters: &FilterChain) -> StoreResult<u64>;

    /// Matching rows in `order`, restricted to `window` when given
    async fn fetch(
        &self,
        filters: &FilterChain,
        order: &[OrderBy],
        window: Option<Window>,
    ) -> StoreResult<Vec<Listing>>;
}

/// Radius-containment lookup, restricted to live listings
#[async_trait]
pub trait GeoIndex: Send + Sync {
    async fn within_radius(&self, radius: &GeoRadius) -> StoreResult<Vec<GeoCandidate>>;
}

/// Related records joined onto each matched listing
#[async_trait]
pub trait ListingRelations: Send + Sync {
    async fn detail(&self, listing_id: &str) -> StoreResult<Option<ListingDetail>>;

    async fn media(&self, listing_id: &str) -> StoreResult<Vec<MediaItem>>;
}

/// Read-only owner projection
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn summary(&self, owner_id: &str) -> StoreResult<Option<OwnerSummary>>;
}

#[async_trait]
impl<T: ProfileDirectory + ?Sized> ProfileDirectory for Arc<T> {
    async fn summary(&self, owner_id: &str) -> StoreResult<Option<OwnerSummary>> {
        (**self).summary(owner_id).await
    }
}
