use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::StoreError;
use crate::models::{Listing, ListingDetail, ListingStatus, MediaItem, OwnerSummary};
use crate::query::compiler::compare_rows;
use crate::query::{FilterChain, GeoCandidate, GeoPoint, GeoRadius, OrderBy, Window};
use crate::store::traits::{GeoIndex, ListingRelations, ListingStore, ProfileDirectory, StoreResult};

/// Serialized form of a whole in-memory dataset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    pub listings: Vec<Listing>,
    #[serde(default)]
    pub details: Vec<ListingDetail>,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub profiles: Vec<OwnerSummary>,
}

/// Process-local store used by the binary when no hosted store is configured, and by tests
#[derive(Default)]
pub struct MemoryStore {
    listings: RwLock<Vec<Listing>>,
    details: RwLock<HashMap<String, ListingDetail>>,
    media: RwLock<HashMap<String, Vec<MediaItem>>>,
    profiles: RwLock<HashMap<String, OwnerSummary>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        let mut media: HashMap<String, Vec<MediaItem>> = HashMap::new();
        for item in seed.media {
            media.entry(item.listing_id.clone()).or_default().push(item);
        }
        for items in media.values_mut() {
            items.sort_by_key(|m| m.position);
        }

        Self {
            listings: RwLock::new(seed.listings),
            details: RwLock::new(
                seed.details
                    .into_iter()
                    .map(|d| (d.listing_id.clone(), d))
                    .collect(),
            ),
            media: RwLock::new(media),
            profiles: RwLock::new(
                seed.profiles
                    .into_iter()
                    .map(|p| (p.id.clone(), p))
                    .collect(),
            ),
            offline: AtomicBool::new(false),
        }
    }

    /// Load a JSON seed file
    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let seed: SeedData = serde_json::from_str(&raw).context("Failed to parse seed data")?;
        info!(
            "Loaded {} listings, {} profiles from {}",
            seed.listings.len(),
            seed.profiles.len(),
            path.display()
        );
        Ok(Self::from_seed(seed))
    }

    /// Insert or replace a listing by id
    pub async fn upsert_listing(&self, listing: Listing) {
        let mut listings = self.listings.write().await;
        match listings.iter_mut().find(|l| l.id == listing.id) {
            Some(existing) => *existing = listing,
            None => listings.push(listing),
        }
    }

    pub async fn set_status(&self, listing_id: &str, status: ListingStatus) -> bool {
        let mut listings = self.listings.write().await;
        match listings.iter_mut().find(|l| l.id == listing_id) {
            Some(listing) => {
                listing.status = status;
                true
            }
            None => false,
        }
    }

    pub async fn insert_detail(&self, detail: ListingDetail) {
        self.details
            .write()
            .await
            .insert(detail.listing_id.clone(), detail);
    }

    pub async fn insert_media(&self, item: MediaItem) {
        let mut media = self.media.write().await;
        let items = media.entry(item.listing_id.clone()).or_default();
        items.push(item);
        items.sort_by_key(|m| m.position);
    }

    pub async fn insert_profile(&self, profile: OwnerSummary) {
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile);
    }

    pub async fn listing_count(&self) -> usize {
        self.listings.read().await.len()
    }

    /// Make every call fail as unavailable, for exercising outage paths
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn count(&self, filters: &FilterChain) -> StoreResult<u64> {
        self.check_online()?;
        let listings = self.listings.read().await;
        Ok(listings.iter().filter(|l| filters.matches(l)).count() as u64)
    }

    async fn fetch(
        &self,
        filters: &FilterChain,
        order: &[OrderBy],
        window: Option<Window>,
    ) -> StoreResult<Vec<Listing>> {
        self.check_online()?;
        let listings = self.listings.read().await;
        let mut rows: Vec<Listing> = listings
            .iter()
            .filter(|l| filters.matches(l))
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare_rows(order, a, b));

        if let Some(window) = window {
            let (start, end) = window.bounds(rows.len());
            rows.truncate(end);
            rows.drain(..start);
        }
        Ok(rows)
    }
}

#[async_trait]
impl GeoIndex for MemoryStore {
    async fn within_radius(&self, radius: &GeoRadius) -> StoreResult<Vec<GeoCandidate>> {
        self.check_online()?;
        let listings = self.listings.read().await;
        Ok(listings
            .iter()
            .filter(|l| l.is_live())
            .filter_map(|l| {
                let (lat, lon) = l.coordinates()?;
                let point = GeoPoint::new(lat, lon);
                radius.contains(&point).then(|| GeoCandidate {
                    id: l.id.clone(),
                    distance_km: radius.center.distance_km(&point),
                })
            })
            .collect())
    }
}

#[async_trait]
impl ListingRelations for MemoryStore {
    async fn detail(&self, listing_id: &str) -> StoreResult<Option<ListingDetail>> {
        self.check_online()?;
        Ok(self.details.read().await.get(listing_id).cloned())
    }

    async fn media(&self, listing_id: &str) -> StoreResult<Vec<MediaItem>> {
        self.check_online()?;
        Ok(self
            .media
            .read()
            .await
            .get(listing_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ProfileDirectory for MemoryStore {
    async fn summary(&self, owner_id: &str) -> StoreResult<Option<OwnerSummary>> {
        self.check_online()?;
        Ok(self.profiles.read().await.get(owner_id).cloned())
    }
}
