//! Category taxonomy. The most static resource in the marketplace, so it
//! gets the longest freshness window.

use std::sync::Arc;

use tokio::time::Duration;

use crate::cache::{QueryCache, QueryKey};
use crate::endpoints;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::types::{ApiResponse, Category};

use super::{fetch_cached, to_cache_value};

const RESOURCE: &str = "categories";
const TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct CategoriesApi {
    client: Arc<HttpClient>,
    cache: Arc<QueryCache>,
}

impl CategoriesApi {
    pub(crate) fn new(client: Arc<HttpClient>, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub async fn list(&self) -> Result<Vec<Category>, ApiError> {
        let key = QueryKey::new(RESOURCE, "list");
        let client = self.client.clone();
        fetch_cached(&self.cache, key, TTL, move || async move {
            let resp: ApiResponse<Vec<Category>> =
                client.get(endpoints::categories::LIST, &[]).await?;
            to_cache_value(resp.into_result()?)
        })
        .await
    }

    pub async fn detail(&self, slug: &str) -> Result<Category, ApiError> {
        let key = QueryKey::new(RESOURCE, "detail").with_segment(slug);
        let client = self.client.clone();
        let path = endpoints::categories::detail(slug);
        fetch_cached(&self.cache, key, TTL, move || async move {
            let resp: ApiResponse<Category> = client.get(&path, &[]).await?;
            to_cache_value(resp.into_result()?)
        })
        .await
    }
}
