mod common;

use async_trait::async_trait;
use chrono::Duration;
use std::collections::HashSet;
use std::sync::Arc;

use common::{at, created, epoch, explorer, listing, raw, secured, store_with};
use housing_explore::explore::{Assembler, Explorer, PlaceholderCounters};
use housing_explore::models::{ListingDetail, MediaItem, PropertyType, SecurityFeature};
use housing_explore::store::{ListingRelations, MemoryStore, StoreResult};
use housing_explore::{compile, normalize, StoreError};

#[tokio::test]
async fn lagos_duplex_example_returns_only_the_duplex() {
    let store = store_with(vec![
        listing("duplex", PropertyType::Duplex, 25_000_000.0),
        listing("apartment", PropertyType::Apartment, 20_000_000.0),
    ])
    .await;

    let page = explorer(store)
        .search(&raw(&[
            ("state", "Lagos"),
            ("property_type", "duplex"),
            ("min_price", "10000000"),
            ("max_price", "50000000"),
            ("sort_by", "price_asc"),
            ("page", "1"),
            ("per_page", "20"),
        ]))
        .await
        .unwrap();

    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].listing.id, "duplex");
    assert_eq!(page.filters.applied["property_type"], "duplex");
    assert!(!page.filters.applied.contains_key("page"));
}

#[tokio::test]
async fn radius_with_nothing_inside_is_empty_whatever_else_is_asked() {
    // roughly 8 km north of the center
    let store = store_with(vec![
        at(listing("far", PropertyType::House, 5_000_000.0), 6.5964, 3.3792),
        listing("unlocated", PropertyType::House, 5_000_000.0),
    ])
    .await;

    let page = explorer(store)
        .search(&raw(&[
            ("latitude", "6.5244"),
            ("longitude", "3.3792"),
            ("radius_km", "5"),
            ("state", "Lagos"),
            ("property_type", "house"),
        ]))
        .await
        .unwrap();

    assert_eq!(page.pagination.total, 0);
    assert!(page.data.is_empty());
    assert!(!page.pagination.has_next);
}

#[tokio::test]
async fn radius_includes_listings_inside_it() {
    let store = store_with(vec![
        at(listing("near", PropertyType::House, 5_000_000.0), 6.5424, 3.3792),
        at(listing("far", PropertyType::House, 5_000_000.0), 6.5964, 3.3792),
    ])
    .await;

    let page = explorer(store)
        .search(&raw(&[
            ("latitude", "6.5244"),
            ("longitude", "3.3792"),
            ("radius_km", "10"),
            ("sort_by", "distance"),
        ]))
        .await
        .unwrap();

    let ids: Vec<_> = page.data.iter().map(|e| e.listing.id.as_str()).collect();
    assert_eq!(ids, ["near", "far"]);
    assert!(page.data.iter().all(|e| e.distance_km.is_some()));
}

#[tokio::test]
async fn total_is_invariant_under_paging() {
    let listings = (0..7)
        .map(|i| {
            created(
                listing(&format!("l{i}"), PropertyType::Apartment, 1_000_000.0 * f64::from(i + 1)),
                i64::from(i),
            )
        })
        .collect();
    let explorer = explorer(store_with(listings).await);

    let everything = explorer
        .search(&raw(&[("per_page", "50")]))
        .await
        .unwrap();
    assert_eq!(everything.pagination.total, 7);

    let mut paged = Vec::new();
    for page in 1..=3 {
        let result = explorer
            .search(&raw(&[("per_page", "3"), ("page", &page.to_string())]))
            .await
            .unwrap();
        assert_eq!(result.pagination.total, 7);
        assert_eq!(result.pagination.total_pages, 3);
        paged.extend(result.data.into_iter().map(|e| e.listing.id));
    }

    let all: Vec<_> = everything.data.into_iter().map(|e| e.listing.id).collect();
    assert_eq!(paged, all);

    let beyond = explorer
        .search(&raw(&[("per_page", "3"), ("page", "9")]))
        .await
        .unwrap();
    assert_eq!(beyond.pagination.total, 7);
    assert!(beyond.data.is_empty());
}

#[tokio::test]
async fn every_row_satisfies_every_predicate() {
    let mut cheap_apartment = listing("cheap-apartment", PropertyType::Apartment, 900_000.0);
    cheap_apartment.bedrooms = Some(4);
    let mut small_apartment = listing("small-apartment", PropertyType::Apartment, 2_000_000.0);
    small_apartment.bedrooms = Some(1);
    let store = store_with(vec![
        listing("house", PropertyType::House, 3_000_000.0),
        cheap_apartment,
        small_apartment,
        listing("apartment", PropertyType::Apartment, 1_000_000.0),
        listing("pricey-apartment", PropertyType::Apartment, 9_000_000.0),
    ])
    .await;

    let page = explorer(store)
        .search(&raw(&[
            ("property_type", "apartment"),
            ("min_price", "1000000"),
            ("bedrooms", "2+"),
        ]))
        .await
        .unwrap();

    let ids: HashSet<_> = page.data.iter().map(|e| e.listing.id.as_str()).collect();
    assert_eq!(ids, HashSet::from(["apartment", "pricey-apartment"]));
    for row in &page.data {
        assert_eq!(row.listing.property_type, PropertyType::Apartment);
        assert!(row.listing.price >= 1_000_000.0);
        assert!(row.listing.bedrooms.unwrap_or(0) >= 2);
    }
}

#[tokio::test]
async fn security_filter_matches_on_overlap() {
    let store = store_with(vec![
        secured(
            listing("guarded", PropertyType::House, 1_000_000.0),
            &[SecurityFeature::Cctv, SecurityFeature::GatedCommunity],
        ),
        secured(
            listing("fenced", PropertyType::House, 1_000_000.0),
            &[SecurityFeature::ElectricFence],
        ),
        listing("open", PropertyType::House, 1_000_000.0),
    ])
    .await;
    let explorer = explorer(store);

    let page = explorer
        .search(&raw(&[("security_type", "cctv")]))
        .await
        .unwrap();
    let ids: Vec<_> = page.data.iter().map(|e| e.listing.id.as_str()).collect();
    assert_eq!(ids, ["guarded"]);

    let page = explorer
        .search(&raw(&[("security_type", "cctv,electric_fence")]))
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 2);
}

#[tokio::test]
async fn tied_sort_keys_order_identically_every_time() {
    let listings = ["m", "c", "x", "a", "q"]
        .iter()
        .map(|id| listing(id, PropertyType::Apartment, 2_000_000.0))
        .collect();
    let explorer = explorer(store_with(listings).await);
    let query = raw(&[("sort_by", "price_asc")]);

    let first = explorer.search(&query).await.unwrap();
    let second = explorer.search(&query).await.unwrap();

    let ids = |page: &housing_explore::ResultPage| {
        page.data
            .iter()
            .map(|e| e.listing.id.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(ids(&first), ["a", "c", "m", "q", "x"]);
}

#[tokio::test]
async fn newest_puts_recent_listings_first() {
    let store = store_with(vec![
        created(listing("old", PropertyType::Land, 1.0), 0),
        created(listing("new", PropertyType::Land, 1.0), 60),
    ])
    .await;
    let explorer = explorer(store);

    let newest = explorer.search(&raw(&[])).await.unwrap();
    assert_eq!(newest.data[0].listing.id, "new");

    let oldest = explorer
        .search(&raw(&[("sort_by", "oldest")]))
        .await
        .unwrap();
    assert_eq!(oldest.data[0].listing.id, "old");
}

#[tokio::test]
async fn days_listed_is_derived_from_the_clock() {
    let store = store_with(vec![listing("a", PropertyType::House, 1.0)]).await;
    let explorer = explorer(store);
    let compiled = compile(&normalize(&raw(&[])).unwrap());

    let page = explorer
        .execute_at(&compiled, epoch() + Duration::days(3) + Duration::hours(5))
        .await
        .unwrap();
    assert_eq!(page.data[0].days_listed, 3);
}

/// Relations that fail for one listing id
struct FlakyRelations {
    inner: Arc<MemoryStore>,
    failing: &'static str,
}

#[async_trait]
impl ListingRelations for FlakyRelations {
    async fn detail(&self, listing_id: &str) -> StoreResult<Option<ListingDetail>> {
        if listing_id == self.failing {
            return Err(StoreError::Unavailable("detail lookup timed out".to_string()));
        }
        self.inner.detail(listing_id).await
    }

    async fn media(&self, listing_id: &str) -> StoreResult<Vec<MediaItem>> {
        if listing_id == self.failing {
            return Err(StoreError::Unavailable("media lookup timed out".to_string()));
        }
        self.inner.media(listing_id).await
    }
}

#[tokio::test]
async fn enrichment_failure_degrades_only_that_row() {
    let store = store_with(vec![
        created(listing("a", PropertyType::House, 1.0), 2),
        created(listing("b", PropertyType::House, 1.0), 1),
        created(listing("c", PropertyType::House, 1.0), 0),
    ])
    .await;
    for id in ["a", "b", "c"] {
        store
            .insert_detail(ListingDetail {
                listing_id: id.to_string(),
                parking_spaces: Some(2),
                ..Default::default()
            })
            .await;
    }

    let relations = Arc::new(FlakyRelations {
        inner: store.clone(),
        failing: "b",
    });
    let assembler = Assembler::new(relations, store.clone(), Arc::new(PlaceholderCounters));
    let explorer = Explorer::new(store.clone(), store, assembler);

    let page = explorer.search(&raw(&[])).await.unwrap();
    assert_eq!(page.pagination.total, 3);
    let ids: Vec<_> = page.data.iter().map(|e| e.listing.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);

    assert!(page.data[0].detail.is_some());
    assert!(page.data[1].detail.is_none());
    assert!(page.data[1].media.is_empty());
    assert!(page.data[2].detail.is_some());
}

#[tokio::test]
async fn free_text_matches_title_address_and_description() {
    let mut pool = listing("pool", PropertyType::House, 1.0);
    pool.description = "Detached house with a Swimming Pool".to_string();
    let store = store_with(vec![pool, listing("plain", PropertyType::House, 1.0)]).await;

    let page = explorer(store)
        .search(&raw(&[("q", "swimming pool")]))
        .await
        .unwrap();
    let ids: Vec<_> = page.data.iter().map(|e| e.listing.id.as_str()).collect();
    assert_eq!(ids, ["pool"]);
}

#[tokio::test]
async fn bundled_seed_data_loads_and_hides_unpublished_listings() {
    let store = Arc::new(MemoryStore::load("data/seed.json").await.unwrap());
    let explorer = explorer(store);

    let abuja = explorer.search(&raw(&[("state", "FCT")])).await.unwrap();
    assert_eq!(abuja.pagination.total, 3);

    let lagos = explorer
        .search(&raw(&[("state", "Lagos"), ("per_page", "50")]))
        .await
        .unwrap();
    assert_eq!(lagos.pagination.total, 7);
    assert!(lagos.data.iter().all(|e| e.listing.is_live()));

    let duplex = lagos
        .data
        .iter()
        .find(|e| e.listing.id == "lst-001")
        .unwrap();
    assert_eq!(duplex.owner.as_ref().unwrap().full_name, "Ada Okafor");
    assert_eq!(duplex.media.len(), 2);
}
