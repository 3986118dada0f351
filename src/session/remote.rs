use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{ExploreError, FieldError, StoreError, ValidationError};
use crate::models::ResultPage;
use crate::query::QuerySpec;
use crate::session::SearchBackend;

#[derive(Debug, Deserialize)]
struct ValidationBody {
    #[serde(default)]
    fields: Vec<FieldError>,
}

/// [`SearchBackend`] that calls a running explore service over HTTP
pub struct HttpExploreClient {
    client: Client,
    base_url: String,
}

impl HttpExploreClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("housing-explore/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SearchBackend for HttpExploreClient {
    async fn search(&self, spec: QuerySpec) -> Result<ResultPage, ExploreError> {
        let url = format!("{}/api/explore", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&spec.to_raw().to_pairs())
            .send()
            .await
            .map_err(StoreError::from)?;

        let status = response.status();
        debug!("GET {} -> {}", url, status);
        match status {
            s if s.is_success() => {
                let page = response.json::<ResultPage>().await.map_err(StoreError::from)?;
                Ok(page)
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                let body = response
                    .json::<ValidationBody>()
                    .await
                    .map_err(StoreError::from)?;
                Err(ValidationError { fields: body.fields }.into())
            }
            other => Err(StoreError::Unavailable(format!("explore service returned {}", other)).into()),
        }
    }
}
