//! Compiles a [`QuerySpec`] into the filter / sort / paginate pipeline run
//! against the listing collection.
//!
//! Compilation is pure. The geospatial pre-filter is described here but executed
//! by [`crate::explore::Explorer`], which folds the resulting candidate ids back in
//! through [`FilterChain::with_ids`].

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::models::{
    AppliedFilters, InternetType, Listing, ListingId, ListingStatus, PowerSupply, PropertyType,
    SecurityFeature, SortKey, WaterSource,
};
use crate::query::geo::{GeoPoint, GeoRadius};
use crate::query::spec::QuerySpec;

/// One conjunctive predicate over a listing row
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Status(ListingStatus),
    IdIn(BTreeSet<ListingId>),
    /// Case-insensitive substring of title, address or description
    TextContains(String),
    State(String),
    Lga(String),
    PropertyType(PropertyType),
    PriceAtLeast(f64),
    PriceAtMost(f64),
    BedroomsAtLeast(u32),
    BathroomsAtLeast(u32),
    HasBq(bool),
    Featured(bool),
    Verified(bool),
    Power(PowerSupply),
    Water(WaterSource),
    Internet(InternetType),
    /// Matches when the listing's set intersects this one
    SecurityOverlaps(BTreeSet<SecurityFeature>),
}

impl Predicate {
    pub fn matches(&self, listing: &Listing) -> bool {
        match self {
            Predicate::Status(status) => listing.status == *status,
            Predicate::IdIn(ids) => ids.contains(&listing.id),
            Predicate::TextContains(needle) => [
                &listing.title,
                &listing.location.address,
                &listing.description,
            ]
            .iter()
            .any(|haystack| haystack.to_lowercase().contains(needle.as_str())),
            Predicate::State(state) => listing.location.state == *state,
            Predicate::Lga(lga) => listing.location.lga.as_deref() == Some(lga.as_str()),
            Predicate::PropertyType(t) => listing.property_type == *t,
            Predicate::PriceAtLeast(min) => listing.price >= *min,
            Predicate::PriceAtMost(max) => listing.price <= *max,
            Predicate::BedroomsAtLeast(n) => listing.bedrooms.is_some_and(|b| b >= *n),
            Predicate::BathroomsAtLeast(n) => listing.bathrooms.is_some_and(|b| b >= *n),
            Predicate::HasBq(flag) => listing.has_bq == *flag,
            Predicate::Featured(flag) => listing.is_featured == *flag,
            Predicate::Verified(flag) => listing.verified_at.is_some() == *flag,
            Predicate::Power(p) => listing.nepa_status == Some(*p),
            Predicate::Water(w) => listing.water_source == Some(*w),
            Predicate::Internet(i) => listing.internet_type == Some(*i),
            Predicate::SecurityOverlaps(wanted) => {
                !listing.security_type.is_disjoint(wanted)
            }
        }
    }
}

/// AND-combined predicates. Order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    predicates: Vec<Predicate>,
}

impl FilterChain {
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        self.predicates.iter().all(|p| p.matches(listing))
    }

    /// Copy of this chain further restricted to the given ids
    pub fn with_ids<I>(&self, ids: I) -> FilterChain
    where
        I: IntoIterator<Item = ListingId>,
    {
        let mut chain = self.clone();
        chain.push(Predicate::IdIn(ids.into_iter().collect()));
        chain
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Price,
    Id,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Price => "price",
            SortField::Id => "id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: SortField,
    pub direction: Direction,
}

impl OrderBy {
    pub const fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub const fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }

    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let ordering = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::Id => a.id.cmp(&b.id),
        };
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// Lexicographic comparison over an order-by list
pub fn compare_rows(order: &[OrderBy], a: &Listing, b: &Listing) -> Ordering {
    order
        .iter()
        .map(|o| o.compare(a, b))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Offset/limit pair for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u32,
}

impl Window {
    pub fn for_page(page: u32, per_page: u32) -> Self {
        Self {
            offset: u64::from(page.saturating_sub(1)) * u64::from(per_page),
            limit: per_page,
        }
    }

    /// Slice bounds into an already-ordered row list of length `len`
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX).min(len);
        let end = start.saturating_add(self.limit as usize).min(len);
        (start, end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// Radius pre-filter to resolve before the relational pass
    pub geo: Option<GeoRadius>,
    pub filters: FilterChain,
    /// Column ordering handed to the store. When `by_distance` is set these are
    /// only the tie-breakers and distance ordering happens after the fetch.
    pub order: Vec<OrderBy>,
    pub by_distance: Option<GeoPoint>,
    /// The sort actually in effect after fallbacks
    pub sort: SortKey,
    pub window: Window,
    pub page: u32,
    pub per_page: u32,
    pub applied: AppliedFilters,
}

/// Ties on the primary key break by creation time, then id, both ascending
const TIE_BREAK: [OrderBy; 2] = [OrderBy::asc(SortField::CreatedAt), OrderBy::asc(SortField::Id)];

pub fn compile(spec: &QuerySpec) -> CompiledQuery {
    let mut filters = FilterChain::default();
    filters.push(Predicate::Status(ListingStatus::Live));

    if let Some(text) = &spec.text {
        filters.push(Predicate::TextContains(text.to_lowercase()));
    }
    if let Some(state) = &spec.state {
        filters.push(Predicate::State(state.clone()));
    }
    if let Some(lga) = &spec.lga {
        filters.push(Predicate::Lga(lga.clone()));
    }
    if let Some(property_type) = spec.property_type {
        filters.push(Predicate::PropertyType(property_type));
    }
    if let Some(min) = spec.price.min {
        filters.push(Predicate::PriceAtLeast(min));
    }
    if let Some(max) = spec.price.max {
        filters.push(Predicate::PriceAtMost(max));
    }
    if let Some(n) = spec.min_bedrooms {
        filters.push(Predicate::BedroomsAtLeast(n));
    }
    if let Some(n) = spec.min_bathrooms {
        filters.push(Predicate::BathroomsAtLeast(n));
    }
    if let Some(flag) = spec.has_bq {
        filters.push(Predicate::HasBq(flag));
    }
    if let Some(flag) = spec.featured {
        filters.push(Predicate::Featured(flag));
    }
    if let Some(flag) = spec.verified {
        filters.push(Predicate::Verified(flag));
    }
    if let Some(power) = spec.nepa_status {
        filters.push(Predicate::Power(power));
    }
    if let Some(water) = spec.water_source {
        filters.push(Predicate::Water(water));
    }
    if let Some(internet) = spec.internet_type {
        filters.push(Predicate::Internet(internet));
    }
    if !spec.security.is_empty() {
        filters.push(Predicate::SecurityOverlaps(spec.security.clone()));
    }

    let sort = match (spec.sort, spec.geo) {
        (SortKey::Distance, None) => SortKey::Newest,
        (sort, _) => sort,
    };

    let mut order = match sort {
        SortKey::Newest => vec![OrderBy::desc(SortField::CreatedAt)],
        SortKey::Oldest => vec![OrderBy::asc(SortField::CreatedAt)],
        SortKey::PriceAsc => vec![OrderBy::asc(SortField::Price)],
        SortKey::PriceDesc => vec![OrderBy::desc(SortField::Price)],
        SortKey::Distance => Vec::new(),
    };
    for tie in TIE_BREAK {
        if !order.iter().any(|o| o.field == tie.field) {
            order.push(tie);
        }
    }

    CompiledQuery {
        geo: spec.geo,
        filters,
        order,
        by_distance: match sort {
            SortKey::Distance => spec.geo.map(|g| g.center),
            _ => None,
        },
        sort,
        window: Window::for_page(spec.page, spec.per_page),
        page: spec.page,
        per_page: spec.per_page,
        applied: spec.applied(),
    }
}
