pub mod assembler;
pub mod counters;
pub mod profile_cache;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub use assembler::Assembler;
pub use counters::{CounterService, InMemoryCounters, PlaceholderCounters};
pub use profile_cache::ProfileCache;

use crate::error::ExploreError;
use crate::models::{Pagination, ResultPage};
use crate::query::{compile, normalize, CompiledQuery, QuerySpec, RawQuery};
use crate::store::{GeoIndex, ListingRelations, ListingStore, ProfileDirectory, StoreResult};

/// Runs compiled queries against the store collaborators and assembles result pages
pub struct Explorer {
    listings: Arc<dyn ListingStore>,
    geo: Arc<dyn GeoIndex>,
    assembler: Assembler,
}

impl Explorer {
    pub fn new(listings: Arc<dyn ListingStore>, geo: Arc<dyn GeoIndex>, assembler: Assembler) -> Self {
        Self {
            listings,
            geo,
            assembler,
        }
    }

    /// Wire every collaborator to one store, with the given profile directory and counters
    pub fn over<S>(
        store: Arc<S>,
        profiles: Arc<dyn ProfileDirectory>,
        counters: Arc<dyn CounterService>,
    ) -> Self
    where
        S: ListingStore + GeoIndex + ListingRelations + 'static,
    {
        let assembler = Assembler::new(store.clone(), profiles, counters);
        Self::new(store.clone(), store, assembler)
    }

    pub fn counters(&self) -> &Arc<dyn CounterService> {
        self.assembler.counters()
    }

    /// Validate, compile and execute a raw request
    pub async fn search(&self, raw: &RawQuery) -> Result<ResultPage, ExploreError> {
        let spec = normalize(raw)?;
        self.search_spec(&spec).await
    }

    pub async fn search_spec(&self, spec: &QuerySpec) -> Result<ResultPage, ExploreError> {
        let compiled = compile(spec);
        Ok(self.execute(&compiled).await?)
    }

    pub async fn execute(&self, compiled: &CompiledQuery) -> StoreResult<ResultPage> {
        self.execute_at(compiled, Utc::now()).await
    }

    /// Execute with an explicit clock for the derived age fields
    pub async fn execute_at(
        &self,
        compiled: &CompiledQuery,
        now: DateTime<Utc>,
    ) -> StoreResult<ResultPage> {
        let mut distances = HashMap::new();

        let filters = match &compiled.geo {
            Some(radius) => {
                let candidates = self.geo.within_radius(radius).await?;
                if candidates.is_empty() {
                    debug!(
                        "No live listings within {} km; returning empty page",
                        radius.radius_km
                    );
                    return Ok(ResultPage::empty(
                        compiled.page,
                        compiled.per_page,
                        compiled.applied.clone(),
                    ));
                }
                distances.extend(candidates.iter().map(|c| (c.id.clone(), c.distance_km)));
                compiled
                    .filters
                    .with_ids(candidates.into_iter().map(|c| c.id))
            }
            None => compiled.filters.clone(),
        };

        let (total, rows) = if compiled.by_distance.is_some() {
            // the candidate set is bounded by the radius, so order it here
            let mut rows = self.listings.fetch(&filters, &compiled.order, None).await?;
            let distance = |id: &str| distances.get(id).copied().unwrap_or(f64::MAX);
            rows.sort_by(|a, b| distance(&a.id).total_cmp(&distance(&b.id)));

            let total = rows.len() as u64;
            let (start, end) = compiled.window.bounds(rows.len());
            rows.truncate(end);
            rows.drain(..start);
            (total, rows)
        } else {
            tokio::try_join!(
                self.listings.count(&filters),
                self.listings
                    .fetch(&filters, &compiled.order, Some(compiled.window)),
            )?
        };

        debug!(
            "Matched {} listings, returning {} for page {}",
            total,
            rows.len(),
            compiled.page
        );

        let data = self.assembler.assemble(rows, &distances, now).await;
        Ok(ResultPage {
            data,
            pagination: Pagination::new(compiled.page, compiled.per_page, total),
            filters: compiled.applied.clone(),
        })
    }
}
