use serde_json::json;
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::{FieldError, ValidationError};
use crate::models::{
    AppliedFilters, Facet, InternetType, PowerSupply, PropertyType, SecurityFeature, SortKey,
    WaterSource,
};
use crate::query::geo::{GeoPoint, GeoRadius, MAX_RADIUS_KM, MIN_RADIUS_KM};
use crate::query::params::RawQuery;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// A normalized, validated search request.
///
/// Built only by [`normalize`]; the session controller builds a fresh one per
/// dispatch instead of editing one in place.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub text: Option<String>,
    pub state: Option<String>,
    pub lga: Option<String>,
    pub geo: Option<GeoRadius>,
    pub property_type: Option<PropertyType>,
    pub price: PriceRange,
    pub min_bedrooms: Option<u32>,
    pub min_bathrooms: Option<u32>,
    pub has_bq: Option<bool>,
    pub featured: Option<bool>,
    pub verified: Option<bool>,
    pub nepa_status: Option<PowerSupply>,
    pub water_source: Option<WaterSource>,
    pub internet_type: Option<InternetType>,
    pub security: BTreeSet<SecurityFeature>,
    pub page: u32,
    pub per_page: u32,
    pub sort: SortKey,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            text: None,
            state: None,
            lga: None,
            geo: None,
            property_type: None,
            price: PriceRange::default(),
            min_bedrooms: None,
            min_bathrooms: None,
            has_bq: None,
            featured: None,
            verified: None,
            nepa_status: None,
            water_source: None,
            internet_type: None,
            security: BTreeSet::new(),
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            sort: SortKey::Newest,
        }
    }
}

impl QuerySpec {
    /// Same filters, another page
    pub fn with_page(&self, page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
            ..self.clone()
        }
    }

    /// Canonical wire form; `normalize(&spec.to_raw())` yields an equal spec
    pub fn to_raw(&self) -> RawQuery {
        RawQuery {
            q: self.text.clone(),
            state: self.state.clone(),
            lga: self.lga.clone(),
            property_type: self.property_type.map(|v| v.as_str().to_string()),
            min_price: self.price.min.map(|v| v.to_string()),
            max_price: self.price.max.map(|v| v.to_string()),
            bedrooms: self.min_bedrooms.map(|v| v.to_string()),
            bathrooms: self.min_bathrooms.map(|v| v.to_string()),
            has_bq: self.has_bq.map(|v| v.to_string()),
            featured: self.featured.map(|v| v.to_string()),
            verified: self.verified.map(|v| v.to_string()),
            nepa_status: self.nepa_status.map(|v| v.as_str().to_string()),
            water_source: self.water_source.map(|v| v.as_str().to_string()),
            internet_type: self.internet_type.map(|v| v.as_str().to_string()),
            security_type: self
                .security
                .iter()
                .map(|v| v.as_str().to_string())
                .collect(),
            latitude: self.geo.map(|g| g.center.latitude.to_string()),
            longitude: self.geo.map(|g| g.center.longitude.to_string()),
            radius_km: self.geo.map(|g| g.radius_km.to_string()),
            page: Some(self.page.to_string()),
            per_page: Some(self.per_page.to_string()),
            sort_by: Some(self.sort.as_str().to_string()),
        }
    }

    /// Recognized, non-empty filters with their normalized values
    pub fn applied(&self) -> AppliedFilters {
        let mut applied = AppliedFilters::default();
        let mut put = |key: &str, value: serde_json::Value| {
            applied.applied.insert(key.to_string(), value);
        };

        if let Some(text) = &self.text {
            put("q", json!(text));
        }
        if let Some(state) = &self.state {
            put("state", json!(state));
        }
        if let Some(lga) = &self.lga {
            put("lga", json!(lga));
        }
        if let Some(property_type) = self.property_type {
            put(PropertyType::KEY, json!(property_type));
        }
        if let Some(min) = self.price.min {
            put("min_price", json!(min));
        }
        if let Some(max) = self.price.max {
            put("max_price", json!(max));
        }
        if let Some(bedrooms) = self.min_bedrooms {
            put("bedrooms", json!(bedrooms));
        }
        if let Some(bathrooms) = self.min_bathrooms {
            put("bathrooms", json!(bathrooms));
        }
        if let Some(has_bq) = self.has_bq {
            put("has_bq", json!(has_bq));
        }
        if let Some(featured) = self.featured {
            put("featured", json!(featured));
        }
        if let Some(verified) = self.verified {
            put("verified", json!(verified));
        }
        if let Some(power) = self.nepa_status {
            put(PowerSupply::KEY, json!(power));
        }
        if let Some(water) = self.water_source {
            put(WaterSource::KEY, json!(water));
        }
        if let Some(internet) = self.internet_type {
            put(InternetType::KEY, json!(internet));
        }
        if !self.security.is_empty() {
            put(SecurityFeature::KEY, json!(self.security));
        }
        if let Some(geo) = &self.geo {
            put("latitude", json!(geo.center.latitude));
            put("longitude", json!(geo.center.longitude));
            put("radius_km", json!(geo.radius_km));
        }
        applied
    }
}

/// Validate a raw request into a [`QuerySpec`].
///
/// Every offending field is reported, not only the first. Unknown keys never
/// reach this point; recognized keys with unparseable or out-of-catalog values fail.
pub fn normalize(raw: &RawQuery) -> Result<QuerySpec, ValidationError> {
    let mut errors = Vec::new();

    let property_type = parse_facet::<PropertyType>(&raw.property_type, &mut errors);
    let nepa_status = parse_facet::<PowerSupply>(&raw.nepa_status, &mut errors);
    let water_source = parse_facet::<WaterSource>(&raw.water_source, &mut errors);
    let internet_type = parse_facet::<InternetType>(&raw.internet_type, &mut errors);
    let security = parse_security(&raw.security_type, &mut errors);

    let min_price = parse_price("min_price", &raw.min_price, &mut errors);
    let max_price = parse_price("max_price", &raw.max_price, &mut errors);
    if let (Some(min), Some(max)) = (min_price, max_price) {
        if min > max {
            errors.push(FieldError::new(
                "min_price",
                "must not be greater than max_price",
            ));
        }
    }

    let min_bedrooms = parse_minimum("bedrooms", &raw.bedrooms, &mut errors);
    let min_bathrooms = parse_minimum("bathrooms", &raw.bathrooms, &mut errors);

    let has_bq = parse_bool("has_bq", &raw.has_bq, &mut errors);
    let featured = parse_bool("featured", &raw.featured, &mut errors);
    let verified = parse_bool("verified", &raw.verified, &mut errors);

    let geo = parse_geo(raw, &mut errors);

    let page = match parse_number::<u32>("page", &raw.page, &mut errors) {
        Some(0) => {
            errors.push(FieldError::new("page", "must be at least 1"));
            DEFAULT_PAGE
        }
        Some(page) => page,
        None => DEFAULT_PAGE,
    };

    let per_page = match parse_number::<u32>("per_page", &raw.per_page, &mut errors) {
        Some(0) => {
            errors.push(FieldError::new("per_page", "must be at least 1"));
            DEFAULT_PER_PAGE
        }
        Some(per_page) => per_page.min(MAX_PER_PAGE),
        None => DEFAULT_PER_PAGE,
    };

    let sort = match present(&raw.sort_by) {
        None => SortKey::Newest,
        // relevance ranking does not exist; it is an alias for recency
        Some(value) if value.eq_ignore_ascii_case("relevance") => SortKey::Newest,
        Some(value) => SortKey::parse(value).unwrap_or_else(|| {
            errors.push(catalog_error::<SortKey>());
            SortKey::Newest
        }),
    };

    if !errors.is_empty() {
        return Err(ValidationError { fields: errors });
    }

    Ok(QuerySpec {
        text: present(&raw.q).map(str::to_string),
        state: present(&raw.state).map(str::to_string),
        lga: present(&raw.lga).map(str::to_string),
        geo,
        property_type,
        price: PriceRange {
            min: min_price,
            max: max_price,
        },
        min_bedrooms,
        min_bathrooms,
        has_bq,
        featured,
        verified,
        nepa_status,
        water_source,
        internet_type,
        security,
        page,
        per_page,
        sort,
    })
}

/// Trimmed, non-empty value
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn catalog_error<F: Facet>() -> FieldError {
    FieldError::new(
        F::KEY,
        format!("must be one of: {}", F::values().join(", ")),
    )
}

fn parse_facet<F: Facet>(value: &Option<String>, errors: &mut Vec<FieldError>) -> Option<F> {
    let value = present(value)?;
    let parsed = F::parse(value);
    if parsed.is_none() {
        errors.push(catalog_error::<F>());
    }
    parsed
}

fn parse_security(
    values: &[String],
    errors: &mut Vec<FieldError>,
) -> BTreeSet<SecurityFeature> {
    let mut set = BTreeSet::new();
    let mut invalid = false;
    for value in values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        match SecurityFeature::parse(value) {
            Some(feature) => {
                set.insert(feature);
            }
            None => invalid = true,
        }
    }
    if invalid {
        errors.push(catalog_error::<SecurityFeature>());
    }
    set
}

fn parse_number<T: FromStr>(
    field: &str,
    value: &Option<String>,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    let value = present(value)?;
    match value.parse::<T>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(FieldError::new(field, "must be a number"));
            None
        }
    }
}

fn parse_price(field: &str, value: &Option<String>, errors: &mut Vec<FieldError>) -> Option<f64> {
    let price = parse_number::<f64>(field, value, errors)?;
    if !price.is_finite() || price < 0.0 {
        errors.push(FieldError::new(field, "must be a non-negative number"));
        return None;
    }
    Some(price)
}

/// Whole-number minimum; a trailing `+` ("3+") is accepted
fn parse_minimum(field: &str, value: &Option<String>, errors: &mut Vec<FieldError>) -> Option<u32> {
    let value = present(value)?;
    match value.trim_end_matches('+').trim().parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(FieldError::new(field, "must be a whole number"));
            None
        }
    }
}

fn parse_bool(field: &str, value: &Option<String>, errors: &mut Vec<FieldError>) -> Option<bool> {
    let value = present(value)?;
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => {
            errors.push(FieldError::new(field, "must be true or false"));
            None
        }
    }
}

fn parse_bounded(
    field: &str,
    value: &Option<String>,
    min: f64,
    max: f64,
    message: &str,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    let n = parse_number::<f64>(field, value, errors)?;
    if !(min..=max).contains(&n) {
        errors.push(FieldError::new(field, message));
        return None;
    }
    Some(n)
}

/// Center and radius are all-or-nothing
fn parse_geo(raw: &RawQuery, errors: &mut Vec<FieldError>) -> Option<GeoRadius> {
    let has_lat = present(&raw.latitude).is_some();
    let has_lon = present(&raw.longitude).is_some();
    let has_radius = present(&raw.radius_km).is_some();

    let latitude = parse_bounded(
        "latitude",
        &raw.latitude,
        -90.0,
        90.0,
        "must be between -90 and 90",
        errors,
    );
    let longitude = parse_bounded(
        "longitude",
        &raw.longitude,
        -180.0,
        180.0,
        "must be between -180 and 180",
        errors,
    );
    let radius_km = parse_bounded(
        "radius_km",
        &raw.radius_km,
        MIN_RADIUS_KM,
        MAX_RADIUS_KM,
        "must be between 1 and 100 km",
        errors,
    );

    match (has_lat, has_lon) {
        (true, false) => errors.push(FieldError::new(
            "longitude",
            "is required together with latitude",
        )),
        (false, true) => errors.push(FieldError::new(
            "latitude",
            "is required together with longitude",
        )),
        (false, false) if has_radius => errors.push(FieldError::new(
            "radius_km",
            "requires latitude and longitude",
        )),
        (true, true) if !has_radius => errors.push(FieldError::new(
            "radius_km",
            "is required together with latitude and longitude",
        )),
        _ => {}
    }

    Some(GeoRadius {
        center: GeoPoint::new(latitude?, longitude?),
        radius_km: radius_km?,
    })
}
