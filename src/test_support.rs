//! Fixtures shared by unit tests.

use chrono::{TimeZone, Utc};
use std::collections::BTreeSet;

use crate::models::{Listing, ListingStatus, Location, PriceFrequency, PropertyType};

/// A live Lagos apartment with no coordinates
pub fn listing(id: &str) -> Listing {
    let created = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
    Listing {
        id: id.to_string(),
        owner_id: format!("owner-{id}"),
        title: format!("Listing {id}"),
        description: String::new(),
        property_type: PropertyType::Apartment,
        price: 1_000_000.0,
        price_frequency: PriceFrequency::Yearly,
        location: Location {
            address: "1 Admiralty Way".to_string(),
            state: "Lagos".to_string(),
            lga: Some("Eti-Osa".to_string()),
            latitude: None,
            longitude: None,
        },
        bedrooms: Some(2),
        bathrooms: Some(2),
        size_sqm: None,
        has_bq: false,
        nepa_status: None,
        water_source: None,
        internet_type: None,
        security_type: BTreeSet::new(),
        status: ListingStatus::Live,
        verified_at: None,
        is_featured: false,
        created_at: created,
        updated_at: created,
        view_count: 0,
    }
}

pub fn located(id: &str, latitude: f64, longitude: f64) -> Listing {
    let mut l = listing(id);
    l.location.latitude = Some(latitude);
    l.location.longitude = Some(longitude);
    l
}
