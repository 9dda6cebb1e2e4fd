//! Service listings: catalogue browsing, featured row, detail pages.

use std::sync::Arc;

use tokio::time::Duration;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey};
use crate::endpoints;
use crate::error::ApiError;
use crate::filters::ServiceFilters;
use crate::http::HttpClient;
use crate::types::{ApiResponse, PaginatedResponse, Service};

use super::{fetch_cached, to_cache_value};

const RESOURCE: &str = "services";
const LIST_TTL: Duration = Duration::from_secs(60);
const FEATURED_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct ServicesApi {
    client: Arc<HttpClient>,
    cache: Arc<QueryCache>,
}

impl ServicesApi {
    pub(crate) fn new(client: Arc<HttpClient>, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub async fn list(
        &self,
        filters: &ServiceFilters,
    ) -> Result<PaginatedResponse<Service>, ApiError> {
        let params = filters.params();
        let key = QueryKey::new(RESOURCE, "list").with_params(&params);
        let client = self.client.clone();
        fetch_cached(&self.cache, key, LIST_TTL, move || async move {
            let page: PaginatedResponse<Service> =
                client.get(endpoints::services::LIST, &params).await?;
            to_cache_value(page)
        })
        .await
    }

    pub async fn featured(&self) -> Result<Vec<Service>, ApiError> {
        let key = QueryKey::new(RESOURCE, "featured");
        let client = self.client.clone();
        fetch_cached(&self.cache, key, FEATURED_TTL, move || async move {
            let resp: ApiResponse<Vec<Service>> =
                client.get(endpoints::services::FEATURED, &[]).await?;
            to_cache_value(resp.into_result()?)
        })
        .await
    }

    pub async fn detail(&self, id: Uuid) -> Result<Service, ApiError> {
        let key = QueryKey::new(RESOURCE, "detail").with_segment(&id.to_string());
        let client = self.client.clone();
        fetch_cached(&self.cache, key, LIST_TTL, move || async move {
            let resp: ApiResponse<Service> =
                client.get(&endpoints::services::detail(id), &[]).await?;
            to_cache_value(resp.into_result()?)
        })
        .await
    }
}
