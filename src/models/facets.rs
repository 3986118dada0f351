//! Facet catalog: every filter dimension with a closed set of legal values.
//!
//! Values outside these sets are a validation failure, never a silent drop.

use serde::{Deserialize, Serialize};

/// A closed enumeration addressable by a wire key
pub trait Facet: Sized + Copy + 'static {
    const KEY: &'static str;

    fn parse(value: &str) -> Option<Self>;

    fn as_str(self) -> &'static str;

    fn values() -> Vec<&'static str>;
}

macro_rules! facet {
    (
        $(#[$meta:meta])*
        $name:ident : $key:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant, )+
        }

        impl $name {
            /// Wire key this facet is addressed by.
            pub const KEY: &'static str = $key;

            /// Every legal value, in catalog order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $wire, )+
                }
            }

            /// Case-insensitive lookup of a wire value.
            pub fn parse(value: &str) -> Option<Self> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $( $wire => Some($name::$variant), )+
                    _ => None,
                }
            }

            pub fn values() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl Facet for $name {
            const KEY: &'static str = $key;

            fn parse(value: &str) -> Option<Self> {
                $name::parse(value)
            }

            fn as_str(self) -> &'static str {
                $name::as_str(self)
            }

            fn values() -> Vec<&'static str> {
                $name::values()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

facet! {
    /// Property category
    PropertyType: "property_type" {
        House => "house",
        Apartment => "apartment",
        Duplex => "duplex",
        Bungalow => "bungalow",
        Terrace => "terrace",
        Land => "land",
        Commercial => "commercial",
        EventCenter => "event_center",
        Hotel => "hotel",
        Shop => "shop",
        Office => "office",
    }
}

facet! {
    /// Grid power reliability at the property
    PowerSupply: "nepa_status" {
        Stable => "stable",
        MostlyAvailable => "mostly_available",
        Intermittent => "intermittent",
        Unavailable => "unavailable",
    }
}

facet! {
    WaterSource: "water_source" {
        Borehole => "borehole",
        PublicMains => "public_mains",
        Well => "well",
        WaterVendor => "water_vendor",
        NoSupply => "none",
    }
}

facet! {
    InternetType: "internet_type" {
        Fiber => "fiber",
        Broadband => "broadband",
        Mobile4g => "mobile_4g",
        Mobile5g => "mobile_5g",
        Satellite => "satellite",
        NoConnection => "none",
    }
}

facet! {
    /// Security features; a listing carries a set of these
    SecurityFeature: "security_type" {
        Cctv => "cctv",
        GatedCommunity => "gated_community",
        SecurityGuard => "security_guard",
        ElectricFence => "electric_fence",
        PerimeterWall => "perimeter_wall",
        AlarmSystem => "alarm_system",
    }
}

facet! {
    SortKey: "sort_by" {
        Newest => "newest",
        Oldest => "oldest",
        PriceAsc => "price_asc",
        PriceDesc => "price_desc",
        /// Only meaningful with a geospatial center; otherwise behaves as `Newest`
        Distance => "distance",
    }
}

facet! {
    /// Lifecycle status. Only `Live` listings are discoverable.
    ListingStatus: "status" {
        Draft => "draft",
        PendingReview => "pending_review",
        Live => "live",
        Rejected => "rejected",
        Archived => "archived",
    }
}

facet! {
    PriceFrequency: "price_frequency" {
        Outright => "outright",
        Yearly => "yearly",
        Monthly => "monthly",
        Daily => "daily",
    }
}

facet! {
    /// Presentation mode of a search session; never affects filtering
    ViewMode: "view" {
        Grid => "grid",
        List => "list",
        Map => "map",
    }
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::Newest
    }
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::Grid
    }
}

impl Default for PriceFrequency {
    fn default() -> Self {
        PriceFrequency::Outright
    }
}

/// Serializable snapshot of the whole catalog, served to clients building filter panels.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub property_type: Vec<&'static str>,
    pub nepa_status: Vec<&'static str>,
    pub water_source: Vec<&'static str>,
    pub internet_type: Vec<&'static str>,
    pub security_type: Vec<&'static str>,
    pub sort_by: Vec<&'static str>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            property_type: PropertyType::values(),
            nepa_status: PowerSupply::values(),
            water_source: WaterSource::values(),
            internet_type: InternetType::values(),
            security_type: SecurityFeature::values(),
            sort_by: SortKey::values(),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
