//! Project postings: clients describe work, experts respond.

use std::sync::Arc;

use tokio::time::Duration;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey};
use crate::endpoints;
use crate::error::ApiError;
use crate::filters::PostingFilters;
use crate::http::HttpClient;
use crate::types::{
    ApiResponse, NewPosting, PaginatedResponse, Posting, PostingStatus, PostingStatusUpdate,
};

use super::{fetch_cached, to_cache_value};

const RESOURCE: &str = "postings";
const TTL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct PostingsApi {
    client: Arc<HttpClient>,
    cache: Arc<QueryCache>,
}

impl PostingsApi {
    pub(crate) fn new(client: Arc<HttpClient>, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub async fn list(
        &self,
        filters: &PostingFilters,
    ) -> Result<PaginatedResponse<Posting>, ApiError> {
        let params = filters.params();
        let key = QueryKey::new(RESOURCE, "list").with_params(&params);
        let client = self.client.clone();
        fetch_cached(&self.cache, key, TTL, move || async move {
            let page: PaginatedResponse<Posting> =
                client.get(endpoints::postings::LIST, &params).await?;
            to_cache_value(page)
        })
        .await
    }

    pub async fn detail(&self, id: Uuid) -> Result<Posting, ApiError> {
        let key = QueryKey::new(RESOURCE, "detail").with_segment(&id.to_string());
        let client = self.client.clone();
        fetch_cached(&self.cache, key, TTL, move || async move {
            let resp: ApiResponse<Posting> =
                client.get(&endpoints::postings::detail(id), &[]).await?;
            to_cache_value(resp.into_result()?)
        })
        .await
    }

    pub async fn create(&self, posting: &NewPosting) -> Result<Posting, ApiError> {
        let resp: ApiResponse<Posting> =
            self.client.post(endpoints::postings::LIST, posting).await?;
        let created = resp.into_result()?;
        self.cache.invalidate_resource(RESOURCE);
        Ok(created)
    }

    /// Withdraw a posting. Only the author may delete; the backend
    /// enforces that.
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let resp: ApiResponse<serde_json::Value> =
            self.client.delete(&endpoints::postings::detail(id)).await?;
        resp.into_result()?;
        self.cache.invalidate_resource(RESOURCE);
        Ok(())
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: PostingStatus,
    ) -> Result<Posting, ApiError> {
        let resp: ApiResponse<Posting> = self
            .client
            .patch(
                &endpoints::postings::status(id),
                &PostingStatusUpdate { status },
            )
            .await?;
        let updated = resp.into_result()?;
        self.cache.invalidate_resource(RESOURCE);
        Ok(updated)
    }
}
