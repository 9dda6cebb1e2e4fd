//! Cross-resource search (experts + services in one response).

use std::sync::Arc;

use tokio::time::Duration;

use crate::cache::{QueryCache, QueryKey};
use crate::endpoints;
use crate::error::ApiError;
use crate::filters::SearchFilters;
use crate::http::HttpClient;
use crate::types::{ApiResponse, SearchResults};

use super::{fetch_cached, to_cache_value};

const RESOURCE: &str = "search";
const TTL: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct SearchApi {
    client: Arc<HttpClient>,
    cache: Arc<QueryCache>,
}

impl SearchApi {
    pub(crate) fn new(client: Arc<HttpClient>, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub async fn search(&self, filters: &SearchFilters) -> Result<SearchResults, ApiError> {
        let params = filters.params();
        let key = QueryKey::new(RESOURCE, "search").with_params(&params);
        let client = self.client.clone();
        fetch_cached(&self.cache, key, TTL, move || async move {
            let resp: ApiResponse<SearchResults> =
                client.get(endpoints::search::SEARCH, &params).await?;
            to_cache_value(resp.into_result()?)
        })
        .await
    }
}
