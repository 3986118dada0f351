pub mod facets;
pub mod page;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub use facets::{
    Catalog, Facet, InternetType, ListingStatus, PowerSupply, PriceFrequency, PropertyType,
    SecurityFeature, SortKey, ViewMode, WaterSource,
};
pub use page::{AppliedFilters, EnrichedListing, Pagination, ResultPage};

pub type ListingId = String;

/// Location information for a listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    /// Administrative region
    pub state: String,
    /// Sub-region within the state
    pub lga: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Core listing data model, one row of the listing collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub property_type: PropertyType,
    pub price: f64,
    #[serde(default)]
    pub price_frequency: PriceFrequency,
    #[serde(flatten)]
    pub location: Location,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub size_sqm: Option<f64>,
    /// Has a secondary dwelling (boys' quarters)
    #[serde(default)]
    pub has_bq: bool,
    pub nepa_status: Option<PowerSupply>,
    pub water_source: Option<WaterSource>,
    pub internet_type: Option<InternetType>,
    #[serde(default)]
    pub security_type: BTreeSet<SecurityFeature>,
    pub status: ListingStatus,
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub view_count: u64,
}

impl Listing {
    pub fn is_live(&self) -> bool {
        self.status == ListingStatus::Live
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// One-to-one detail record; a listing may not have one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingDetail {
    pub listing_id: ListingId,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub year_built: Option<u16>,
    pub parking_spaces: Option<u32>,
    pub furnishing: Option<String>,
    pub service_charge: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub listing_id: ListingId,
    pub url: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub position: u32,
}

/// Read-only projection of the owning profile. Never the full profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub id: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}
