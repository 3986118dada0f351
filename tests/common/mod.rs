#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;

use housing_explore::explore::{Explorer, PlaceholderCounters};
use housing_explore::models::{
    Listing, ListingStatus, Location, PriceFrequency, PropertyType, SecurityFeature,
};
use housing_explore::store::MemoryStore;
use housing_explore::RawQuery;

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

/// Live Lagos listing created at [`epoch`], no coordinates
pub fn listing(id: &str, property_type: PropertyType, price: f64) -> Listing {
    Listing {
        id: id.to_string(),
        owner_id: format!("owner-{id}"),
        title: format!("{property_type} {id}"),
        description: String::new(),
        property_type,
        price,
        price_frequency: PriceFrequency::Outright,
        location: Location {
            address: format!("{id} Awolowo Road"),
            state: "Lagos".to_string(),
            lga: Some("Ikoyi-Obalende".to_string()),
            latitude: None,
            longitude: None,
        },
        bedrooms: Some(3),
        bathrooms: Some(3),
        size_sqm: Some(150.0),
        has_bq: false,
        nepa_status: None,
        water_source: None,
        internet_type: None,
        security_type: BTreeSet::new(),
        status: ListingStatus::Live,
        verified_at: None,
        is_featured: false,
        created_at: epoch(),
        updated_at: epoch(),
        view_count: 0,
    }
}

pub fn created(mut listing: Listing, minutes_after_epoch: i64) -> Listing {
    listing.created_at = epoch() + Duration::minutes(minutes_after_epoch);
    listing.updated_at = listing.created_at;
    listing
}

pub fn at(mut listing: Listing, latitude: f64, longitude: f64) -> Listing {
    listing.location.latitude = Some(latitude);
    listing.location.longitude = Some(longitude);
    listing
}

pub fn secured(mut listing: Listing, features: &[SecurityFeature]) -> Listing {
    listing.security_type = features.iter().copied().collect();
    listing
}

pub async fn store_with(listings: Vec<Listing>) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for listing in listings {
        store.upsert_listing(listing).await;
    }
    store
}

pub fn explorer(store: Arc<MemoryStore>) -> Explorer {
    Explorer::over(store.clone(), store, Arc::new(PlaceholderCounters))
}

pub fn raw(pairs: &[(&str, &str)]) -> RawQuery {
    RawQuery::from_pairs(pairs.iter().copied())
}
