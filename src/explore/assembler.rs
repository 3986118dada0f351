use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::explore::counters::CounterService;
use crate::models::{EnrichedListing, Listing};
use crate::store::{ListingRelations, ProfileDirectory};

/// Joins each matched row with its detail record, media and owner summary.
///
/// A failed join degrades that row only: the failure is logged and the row
/// carries empty/default values for the failed part.
pub struct Assembler {
    relations: Arc<dyn ListingRelations>,
    profiles: Arc<dyn ProfileDirectory>,
    counters: Arc<dyn CounterService>,
}

impl Assembler {
    pub fn new(
        relations: Arc<dyn ListingRelations>,
        profiles: Arc<dyn ProfileDirectory>,
        counters: Arc<dyn CounterService>,
    ) -> Self {
        Self {
            relations,
            profiles,
            counters,
        }
    }

    pub fn counters(&self) -> &Arc<dyn CounterService> {
        &self.counters
    }

    /// Enrich rows concurrently, keeping their order
    pub async fn assemble(
        &self,
        rows: Vec<Listing>,
        distances: &HashMap<String, f64>,
        now: DateTime<Utc>,
    ) -> Vec<EnrichedListing> {
        join_all(rows.into_iter().map(|row| {
            let distance_km = distances.get(&row.id).copied();
            self.enrich(row, distance_km, now)
        }))
        .await
    }

    async fn enrich(
        &self,
        listing: Listing,
        distance_km: Option<f64>,
        now: DateTime<Utc>,
    ) -> EnrichedListing {
        let (detail, media, owner, stats) = tokio::join!(
            self.relations.detail(&listing.id),
            self.relations.media(&listing.id),
            self.profiles.summary(&listing.owner_id),
            self.counters.counts(&listing),
        );

        let detail = detail.unwrap_or_else(|e| {
            warn!(listing_id = %listing.id, join = "detail", "Enrichment failed: {}", e);
            None
        });
        let media = media.unwrap_or_else(|e| {
            warn!(listing_id = %listing.id, join = "media", "Enrichment failed: {}", e);
            Vec::new()
        });
        let owner = owner.unwrap_or_else(|e| {
            warn!(listing_id = %listing.id, join = "owner", "Enrichment failed: {}", e);
            None
        });
        let stats = stats.unwrap_or_else(|e| {
            warn!(listing_id = %listing.id, join = "counters", "Enrichment failed: {}", e);
            Default::default()
        });

        EnrichedListing {
            days_listed: days_listed(listing.created_at, now),
            listing,
            detail,
            media,
            owner,
            stats,
            distance_km,
        }
    }
}

/// Whole days between creation and `now`, never negative
pub fn days_listed(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_days().max(0)
}
