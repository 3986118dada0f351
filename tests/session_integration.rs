mod common;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use common::{created, explorer, listing, store_with};
use housing_explore::explore::Explorer;
use housing_explore::models::{PropertyType, SortKey};
use housing_explore::session::{ResultView, SessionPhase};
use housing_explore::{ExploreError, QuerySpec, ResultPage, SearchBackend, SearchSession};

/// Explorer that answers Abuja searches slowly
struct Lagged {
    explorer: Explorer,
}

#[async_trait]
impl SearchBackend for Lagged {
    async fn search(&self, spec: QuerySpec) -> Result<ResultPage, ExploreError> {
        let delay = if spec.state.as_deref() == Some("FCT") { 800 } else { 20 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.explorer.search_spec(&spec).await
    }
}

async fn dataset() -> Explorer {
    let mut listings = Vec::new();
    for i in 0..25 {
        listings.push(created(
            listing(&format!("lagos-{i:02}"), PropertyType::Apartment, 1_000_000.0),
            i,
        ));
    }
    for i in 0..3 {
        let mut abuja = listing(&format!("abuja-{i}"), PropertyType::Duplex, 5_000_000.0);
        abuja.location.state = "FCT".to_string();
        listings.push(abuja);
    }
    explorer(store_with(listings).await)
}

#[tokio::test(start_paused = true)]
async fn late_answer_to_an_older_query_never_lands() {
    let backend = Arc::new(Lagged {
        explorer: dataset().await,
    });
    let mut session = SearchSession::new(backend);

    session.set_filter("state", "FCT");
    session.set_filter("state", "Lagos");
    tokio::time::sleep(Duration::from_secs(2)).await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Settled);
    let results = snapshot.results.unwrap();
    assert_eq!(results.pagination.total, 25);
    assert!(results
        .data
        .iter()
        .all(|e| e.listing.location.state == "Lagos"));
}

#[tokio::test(start_paused = true)]
async fn paging_then_filtering_returns_to_the_first_page() {
    let mut session = SearchSession::new(Arc::new(dataset().await));

    session.set_filter("state", "Lagos");
    session.settled().await;
    session.set_page(2);
    session.settled().await;

    let page_two = session.snapshot().results.unwrap();
    assert_eq!(page_two.pagination.page, 2);
    assert_eq!(page_two.pagination.total, 25);
    assert_eq!(page_two.data.len(), 5);
    assert_eq!(page_two.filters.applied["state"], "Lagos");

    session.set_filter("property_type", "apartment");
    session.settled().await;
    let filtered = session.snapshot().results.unwrap();
    assert_eq!(filtered.pagination.page, 1);
    assert_eq!(filtered.filters.applied["state"], "Lagos");
}

#[tokio::test(start_paused = true)]
async fn typing_settles_on_the_final_text() {
    let mut session = SearchSession::with_debounce(
        Arc::new(dataset().await),
        Duration::from_millis(200),
    );
    session.set_sort(SortKey::Oldest);
    session.settled().await;

    for text in ["a", "ab", "abu", "abuja"] {
        session.type_search_text(text);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(session.snapshot().is_loading());
    session.settled().await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.result_view(), ResultView::Matches);
    assert_eq!(snapshot.results.unwrap().pagination.total, 3);
}

#[tokio::test(start_paused = true)]
async fn nothing_matched_is_distinct_from_a_failure() {
    let mut session = SearchSession::new(Arc::new(dataset().await));
    session.set_filter("state", "Kano");
    assert_eq!(session.settled().await, SessionPhase::Settled);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.result_view(), ResultView::NoMatches);
    assert!(snapshot.error.is_none());
}
