//! Expert listings: search, featured carousel, profile detail.

use std::sync::Arc;

use tokio::time::Duration;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey};
use crate::endpoints;
use crate::error::ApiError;
use crate::filters::ExpertFilters;
use crate::http::HttpClient;
use crate::types::{ApiResponse, Expert, PaginatedResponse};

use super::{fetch_cached, to_cache_value};

const RESOURCE: &str = "experts";
const LIST_TTL: Duration = Duration::from_secs(60);
const FEATURED_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct ExpertsApi {
    client: Arc<HttpClient>,
    cache: Arc<QueryCache>,
}

impl ExpertsApi {
    pub(crate) fn new(client: Arc<HttpClient>, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub async fn list(&self, filters: &ExpertFilters) -> Result<PaginatedResponse<Expert>, ApiError> {
        let params = filters.params();
        let key = QueryKey::new(RESOURCE, "list").with_params(&params);
        let client = self.client.clone();
        fetch_cached(&self.cache, key, LIST_TTL, move || async move {
            let page: PaginatedResponse<Expert> =
                client.get(endpoints::experts::LIST, &params).await?;
            to_cache_value(page)
        })
        .await
    }

    pub async fn featured(&self) -> Result<Vec<Expert>, ApiError> {
        let key = QueryKey::new(RESOURCE, "featured");
        let client = self.client.clone();
        fetch_cached(&self.cache, key, FEATURED_TTL, move || async move {
            let resp: ApiResponse<Vec<Expert>> =
                client.get(endpoints::experts::FEATURED, &[]).await?;
            to_cache_value(resp.into_result()?)
        })
        .await
    }

    pub async fn detail(&self, id: Uuid) -> Result<Expert, ApiError> {
        let key = QueryKey::new(RESOURCE, "detail").with_segment(&id.to_string());
        let client = self.client.clone();
        fetch_cached(&self.cache, key, LIST_TTL, move || async move {
            let resp: ApiResponse<Expert> =
                client.get(&endpoints::experts::detail(id), &[]).await?;
            to_cache_value(resp.into_result()?)
        })
        .await
    }
}
