//! Store backed by a hosted PostgREST-compatible endpoint.
//!
//! Tables: `listings`, `listing_details`, `listing_media`, `profiles`.
//! The radius lookup is the `listings_within_radius(lat, lng, radius_km)` RPC,
//! which must itself restrict to live listings.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::models::{Listing, ListingDetail, MediaItem, OwnerSummary};
use crate::query::compiler::{Direction, Predicate};
use crate::query::{FilterChain, GeoCandidate, GeoRadius, OrderBy, Window};
use crate::store::traits::{GeoIndex, ListingRelations, ListingStore, ProfileDirectory, StoreResult};

const OWNER_COLUMNS: &str = "id,full_name,avatar_url,phone,email";

pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestStore {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("housing-explore/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.header("apikey", key).bearer_auth(key);
        }
        builder
    }

    async fn send(&self, what: &str, builder: RequestBuilder) -> StoreResult<Response> {
        let response = builder.send().await?;
        if !response.status().is_success() {
            warn!("Store returned status {} for {}", response.status(), what);
            return Err(StoreError::Unavailable(format!(
                "{} returned {}",
                what,
                response.status()
            )));
        }
        Ok(response)
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(String, String)],
    ) -> StoreResult<Vec<T>> {
        debug!("GET {} with {} params", table, params.len());
        let response = self
            .send(table, self.request(Method::GET, table).query(params))
            .await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// PostgREST query parameters for a filter chain
pub fn filter_params(filters: &FilterChain) -> Vec<(String, String)> {
    filters
        .predicates()
        .iter()
        .map(|predicate| {
            let (column, condition) = match predicate {
                Predicate::Status(s) => ("status", format!("eq.{s}")),
                Predicate::IdIn(ids) => (
                    "id",
                    format!(
                        "in.({})",
                        ids.iter().map(|id| quote(id)).collect::<Vec<_>>().join(",")
                    ),
                ),
                Predicate::TextContains(text) => {
                    let pattern = quote(&format!("*{text}*"));
                    (
                        "or",
                        format!(
                            "(title.ilike.{pattern},address.ilike.{pattern},description.ilike.{pattern})"
                        ),
                    )
                }
                Predicate::State(state) => ("state", format!("eq.{state}")),
                Predicate::Lga(lga) => ("lga", format!("eq.{lga}")),
                Predicate::PropertyType(t) => ("property_type", format!("eq.{t}")),
                Predicate::PriceAtLeast(min) => ("price", format!("gte.{min}")),
                Predicate::PriceAtMost(max) => ("price", format!("lte.{max}")),
                Predicate::BedroomsAtLeast(n) => ("bedrooms", format!("gte.{n}")),
                Predicate::BathroomsAtLeast(n) => ("bathrooms", format!("gte.{n}")),
                Predicate::HasBq(flag) => ("has_bq", format!("is.{flag}")),
                Predicate::Featured(flag) => ("is_featured", format!("is.{flag}")),
                Predicate::Verified(true) => ("verified_at", "not.is.null".to_string()),
                Predicate::Verified(false) => ("verified_at", "is.null".to_string()),
                Predicate::Power(p) => ("nepa_status", format!("eq.{p}")),
                Predicate::Water(w) => ("water_source", format!("eq.{w}")),
                Predicate::Internet(i) => ("internet_type", format!("eq.{i}")),
                Predicate::SecurityOverlaps(set) => (
                    "security_type",
                    format!(
                        "ov.{{{}}}",
                        set.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(",")
                    ),
                ),
            };
            (column.to_string(), condition)
        })
        .collect()
}

/// `order=created_at.desc,id.asc`
pub fn order_param(order: &[OrderBy]) -> Option<(String, String)> {
    if order.is_empty() {
        return None;
    }
    let value = order
        .iter()
        .map(|o| {
            let direction = match o.direction {
                Direction::Asc => "asc",
                Direction::Desc => "desc",
            };
            format!("{}.{}", o.field.column(), direction)
        })
        .collect::<Vec<_>>()
        .join(",");
    Some(("order".to_string(), value))
}

/// Total from a `Content-Range` header such as `0-19/123` or `*/0`
pub fn parse_total(content_range: &str) -> Option<u64> {
    content_range.rsplit_once('/')?.1.trim().parse().ok()
}

/// Double-quote a value for use inside PostgREST `in.()` / `or=()` lists
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[async_trait]
impl ListingStore for RestStore {
    async fn count(&self, filters: &FilterChain) -> StoreResult<u64> {
        let builder = self
            .request(Method::HEAD, "listings")
            .query(&filter_params(filters))
            .header("Prefer", "count=exact");
        let response = self.send("listings count", builder).await?;

        let header = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| StoreError::Decode("missing content-range header".into()))?;
        parse_total(header)
            .ok_or_else(|| StoreError::Decode(format!("unreadable content-range: {header}")))
    }

    async fn fetch(
        &self,
        filters: &FilterChain,
        order: &[OrderBy],
        window: Option<Window>,
    ) -> StoreResult<Vec<Listing>> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(filter_params(filters));
        params.extend(order_param(order));
        if let Some(window) = window {
            params.push(("offset".to_string(), window.offset.to_string()));
            params.push(("limit".to_string(), window.limit.to_string()));
        }
        self.get_rows("listings", &params).await
    }
}

#[async_trait]
impl GeoIndex for RestStore {
    async fn within_radius(&self, radius: &GeoRadius) -> StoreResult<Vec<GeoCandidate>> {
        let builder = self
            .request(Method::POST, "rpc/listings_within_radius")
            .json(&json!({
                "lat": radius.center.latitude,
                "lng": radius.center.longitude,
                "radius_km": radius.radius_km,
            }));
        let response = self.send("radius lookup", builder).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ListingRelations for RestStore {
    async fn detail(&self, listing_id: &str) -> StoreResult<Option<ListingDetail>> {
        let params = [
            ("listing_id".to_string(), format!("eq.{listing_id}")),
            ("limit".to_string(), "1".to_string()),
        ];
        let rows: Vec<ListingDetail> = self.get_rows("listing_details", &params).await?;
        Ok(rows.into_iter().next())
    }

    async fn media(&self, listing_id: &str) -> StoreResult<Vec<MediaItem>> {
        let params = [
            ("listing_id".to_string(), format!("eq.{listing_id}")),
            ("order".to_string(), "position.asc".to_string()),
        ];
        self.get_rows("listing_media", &params).await
    }
}

#[async_trait]
impl ProfileDirectory for RestStore {
    async fn summary(&self, owner_id: &str) -> StoreResult<Option<OwnerSummary>> {
        let params = [
            ("id".to_string(), format!("eq.{owner_id}")),
            ("select".to_string(), OWNER_COLUMNS.to_string()),
            ("limit".to_string(), "1".to_string()),
        ];
        let rows: Vec<OwnerSummary> = self.get_rows("profiles", &params).await?;
        Ok(rows.into_iter().next())
    }
}
