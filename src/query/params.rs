use serde::{Deserialize, Serialize};

/// Keys that control paging and ordering rather than filtering
pub const CONTROL_KEYS: &[&str] = &["page", "per_page", "sort_by"];

/// Every request key the search recognizes. Anything else is ignored.
pub const RECOGNIZED_KEYS: &[&str] = &[
    "q",
    "state",
    "lga",
    "property_type",
    "min_price",
    "max_price",
    "bedrooms",
    "bathrooms",
    "has_bq",
    "featured",
    "verified",
    "nepa_status",
    "water_source",
    "internet_type",
    "security_type",
    "latitude",
    "longitude",
    "radius_km",
    "page",
    "per_page",
    "sort_by",
];

/// Search request exactly as received on the wire: every value still text.
///
/// Parsing and validation happen in [`crate::query::normalize`], so a bad value
/// is reported against its field instead of failing the whole request decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuery {
    pub q: Option<String>,
    pub state: Option<String>,
    pub lga: Option<String>,
    pub property_type: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub has_bq: Option<String>,
    pub featured: Option<String>,
    pub verified: Option<String>,
    pub nepa_status: Option<String>,
    pub water_source: Option<String>,
    pub internet_type: Option<String>,
    /// Repeatable; each entry may also hold comma-separated values
    #[serde(default)]
    pub security_type: Vec<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub radius_km: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub sort_by: Option<String>,
}

impl RawQuery {
    /// Build from decoded query-string pairs. Unknown keys are dropped,
    /// `security_type` accumulates and other repeated keys keep the last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut raw = Self::default();
        for (key, value) in pairs {
            raw.set(key.as_ref(), value);
        }
        raw
    }

    /// Set a recognized key. Returns false for unknown keys.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        let key = canonical_key(key);
        if key == "security_type" {
            self.security_type.push(value.into());
            return true;
        }
        match self.slot_mut(key) {
            Some(slot) => {
                *slot = Some(value.into());
                true
            }
            None => false,
        }
    }

    /// Clear a recognized key. Returns true if it held a value.
    pub fn remove(&mut self, key: &str) -> bool {
        let key = canonical_key(key);
        if key == "security_type" {
            let had = !self.security_type.is_empty();
            self.security_type.clear();
            return had;
        }
        self.slot_mut(key).and_then(Option::take).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match canonical_key(key) {
            "q" => &self.q,
            "state" => &self.state,
            "lga" => &self.lga,
            "property_type" => &self.property_type,
            "min_price" => &self.min_price,
            "max_price" => &self.max_price,
            "bedrooms" => &self.bedrooms,
            "bathrooms" => &self.bathrooms,
            "has_bq" => &self.has_bq,
            "featured" => &self.featured,
            "verified" => &self.verified,
            "nepa_status" => &self.nepa_status,
            "water_source" => &self.water_source,
            "internet_type" => &self.internet_type,
            "latitude" => &self.latitude,
            "longitude" => &self.longitude,
            "radius_km" => &self.radius_km,
            "page" => &self.page,
            "per_page" => &self.per_page,
            "sort_by" => &self.sort_by,
            _ => return None,
        };
        value.as_deref()
    }

    /// Drop every filter, keeping paging and sort controls
    pub fn clear_filters(&mut self) {
        *self = Self {
            page: self.page.take(),
            per_page: self.per_page.take(),
            sort_by: self.sort_by.take(),
            ..Self::default()
        };
    }

    /// Non-empty filter values in [`RECOGNIZED_KEYS`] order; control keys excluded
    pub fn filter_entries(&self) -> Vec<(&'static str, String)> {
        RECOGNIZED_KEYS
            .iter()
            .filter(|key| !CONTROL_KEYS.contains(*key))
            .flat_map(|&key| {
                if key == "security_type" {
                    self.security_type
                        .iter()
                        .flat_map(|v| v.split(','))
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(|v| (key, v.to_string()))
                        .collect::<Vec<_>>()
                } else {
                    self.get(key)
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(|v| vec![(key, v.to_string())])
                        .unwrap_or_default()
                }
            })
            .collect()
    }

    /// Query-string pairs for every set key, `security_type` repeated
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for &key in RECOGNIZED_KEYS {
            if key == "security_type" {
                for value in &self.security_type {
                    pairs.push((key.to_string(), value.clone()));
                }
            } else if let Some(value) = self.get(key) {
                pairs.push((key.to_string(), value.to_string()));
            }
        }
        pairs
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        let slot = match key {
            "q" => &mut self.q,
            "state" => &mut self.state,
            "lga" => &mut self.lga,
            "property_type" => &mut self.property_type,
            "min_price" => &mut self.min_price,
            "max_price" => &mut self.max_price,
            "bedrooms" => &mut self.bedrooms,
            "bathrooms" => &mut self.bathrooms,
            "has_bq" => &mut self.has_bq,
            "featured" => &mut self.featured,
            "verified" => &mut self.verified,
            "nepa_status" => &mut self.nepa_status,
            "water_source" => &mut self.water_source,
            "internet_type" => &mut self.internet_type,
            "latitude" => &mut self.latitude,
            "longitude" => &mut self.longitude,
            "radius_km" => &mut self.radius_km,
            "page" => &mut self.page,
            "per_page" => &mut self.per_page,
            "sort_by" => &mut self.sort_by,
            _ => return None,
        };
        Some(slot)
    }
}

fn canonical_key(key: &str) -> &str {
    match key {
        "sub_region" => "lga",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_are_ignored() {
        let raw = RawQuery::from_pairs([("state", "Lagos"), ("utm_source", "newsletter")]);
        assert_eq!(raw.state.as_deref(), Some("Lagos"));
        assert_eq!(raw.to_pairs(), vec![("state".to_string(), "Lagos".to_string())]);
    }

    #[test]
    fn security_type_accumulates() {
        let raw = RawQuery::from_pairs([
            ("security_type", "cctv"),
            ("security_type", "gated_community,electric_fence"),
        ]);
        assert_eq!(raw.security_type.len(), 2);
        let entries = raw.filter_entries();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|(k, _)| *k == "security_type"));
    }

    #[test]
    fn sub_region_is_an_alias_for_lga() {
        let raw = RawQuery::from_pairs([("sub_region", "Ikeja")]);
        assert_eq!(raw.lga.as_deref(), Some("Ikeja"));
    }

    #[test]
    fn clear_filters_keeps_controls() {
        let mut raw = RawQuery::from_pairs([
            ("state", "Lagos"),
            ("security_type", "cctv"),
            ("sort_by", "price_asc"),
            ("per_page", "10"),
        ]);
        raw.clear_filters();
        assert!(raw.filter_entries().is_empty());
        assert_eq!(raw.sort_by.as_deref(), Some("price_asc"));
        assert_eq!(raw.per_page.as_deref(), Some("10"));
    }

    #[test]
    fn blank_values_are_not_filter_entries() {
        let raw = RawQuery::from_pairs([("q", "   "), ("state", "")]);
        assert!(raw.filter_entries().is_empty());
    }
}
