use serde::Serialize;

use crate::query::RawQuery;

/// One removable "active filter" tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterChip {
    pub key: &'static str,
    pub value: String,
    pub label: String,
}

impl FilterChip {
    pub fn new(key: &'static str, value: String) -> Self {
        let label = format!("{}: {}", key_label(key), value_label(&value));
        Self { key, value, label }
    }
}

/// Chips for every non-empty filter of `raw`, one per security feature
pub fn chips(raw: &RawQuery) -> Vec<FilterChip> {
    raw.filter_entries()
        .into_iter()
        .map(|(key, value)| FilterChip::new(key, value))
        .collect()
}

/// Center and radius only make sense together
const GEO_KEYS: [&str; 3] = ["latitude", "longitude", "radius_km"];

/// Drop what `chip` stands for. For `security_type` only that one value goes;
/// any part of the radius search removes the whole radius.
pub fn remove_chip(raw: &mut RawQuery, chip: &FilterChip) {
    if GEO_KEYS.contains(&chip.key) {
        for key in GEO_KEYS {
            raw.remove(key);
        }
        return;
    }
    if chip.key != "security_type" {
        raw.remove(chip.key);
        return;
    }
    let remaining: Vec<String> = raw
        .security_type
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(&chip.value))
        .map(str::to_string)
        .collect();
    raw.security_type = remaining;
}

fn key_label(key: &str) -> &str {
    match key {
        "q" => "Search",
        "state" => "State",
        "lga" => "LGA",
        "property_type" => "Type",
        "min_price" => "Min price",
        "max_price" => "Max price",
        "bedrooms" => "Bedrooms",
        "bathrooms" => "Bathrooms",
        "has_bq" => "BQ",
        "featured" => "Featured",
        "verified" => "Verified",
        "nepa_status" => "Power",
        "water_source" => "Water",
        "internet_type" => "Internet",
        "security_type" => "Security",
        "latitude" => "Latitude",
        "longitude" => "Longitude",
        "radius_km" => "Radius (km)",
        other => other,
    }
}

fn value_label(value: &str) -> String {
    value.replace('_', " ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageLink {
    Page(u32),
    Gap,
}

/// Page links around `current`: always the first and last page, `spread`
/// pages either side of the current one, and a gap marker where pages are skipped.
pub fn page_window(current: u32, total_pages: u64, spread: u32) -> Vec<PageLink> {
    let last = u32::try_from(total_pages).unwrap_or(u32::MAX);
    if last == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, last);
    let low = current.saturating_sub(spread).max(1);
    let high = current.saturating_add(spread).min(last);

    let mut links = Vec::new();
    if low > 1 {
        links.push(PageLink::Page(1));
        if low > 2 {
            links.push(PageLink::Gap);
        }
    }
    links.extend((low..=high).map(PageLink::Page));
    if high < last {
        if high < last - 1 {
            links.push(PageLink::Gap);
        }
        links.push(PageLink::Page(last));
    }
    links
}
