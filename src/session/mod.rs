//! Client-side search session: debounced query dispatch over a [`SearchBackend`].

pub mod chips;
pub mod controller;
pub mod remote;

use async_trait::async_trait;
use std::sync::Arc;

pub use chips::{page_window, FilterChip, PageLink};
pub use controller::{
    ResultView, SearchFailure, SearchSession, SessionPhase, SessionSnapshot, DEFAULT_DEBOUNCE,
};
pub use remote::HttpExploreClient;

use crate::error::ExploreError;
use crate::explore::Explorer;
use crate::models::ResultPage;
use crate::query::QuerySpec;

/// Anything that can answer a normalized search
#[async_trait]
pub trait SearchBackend: Send + Sync + 'static {
    async fn search(&self, spec: QuerySpec) -> Result<ResultPage, ExploreError>;
}

#[async_trait]
impl SearchBackend for Explorer {
    async fn search(&self, spec: QuerySpec) -> Result<ResultPage, ExploreError> {
        self.search_spec(&spec).await
    }
}

#[async_trait]
impl<T: SearchBackend + ?Sized> SearchBackend for Arc<T> {
    async fn search(&self, spec: QuerySpec) -> Result<ResultPage, ExploreError> {
        (**self).search(spec).await
    }
}
