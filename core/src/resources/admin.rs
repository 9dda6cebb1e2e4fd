//! Admin dashboard data. All routes require an admin token; the backend
//! rejects everything else with 403, which surfaces as a normal HTTP error.

use std::sync::Arc;

use tokio::time::Duration;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey};
use crate::endpoints;
use crate::error::ApiError;
use crate::filters::AdminUserFilters;
use crate::http::HttpClient;
use crate::types::{AdminStats, ApiResponse, PaginatedResponse, User};

use super::{fetch_cached, to_cache_value};

const RESOURCE: &str = "admin";
const TTL: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AdminApi {
    client: Arc<HttpClient>,
    cache: Arc<QueryCache>,
}

impl AdminApi {
    pub(crate) fn new(client: Arc<HttpClient>, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub async fn stats(&self) -> Result<AdminStats, ApiError> {
        let key = QueryKey::new(RESOURCE, "stats");
        let client = self.client.clone();
        fetch_cached(&self.cache, key, TTL, move || async move {
            let resp: ApiResponse<AdminStats> =
                client.get(endpoints::admin::STATS, &[]).await?;
            to_cache_value(resp.into_result()?)
        })
        .await
    }

    pub async fn users(
        &self,
        filters: &AdminUserFilters,
    ) -> Result<PaginatedResponse<User>, ApiError> {
        let params = filters.params();
        let key = QueryKey::new(RESOURCE, "users").with_params(&params);
        let client = self.client.clone();
        fetch_cached(&self.cache, key, TTL, move || async move {
            let page: PaginatedResponse<User> =
                client.get(endpoints::admin::USERS, &params).await?;
            to_cache_value(page)
        })
        .await
    }

    pub async fn suspend_user(&self, id: Uuid) -> Result<User, ApiError> {
        let resp: ApiResponse<User> = self
            .client
            .post(&endpoints::admin::suspend_user(id), &serde_json::json!({}))
            .await?;
        let user = resp.into_result()?;
        self.cache.invalidate_resource(RESOURCE);
        Ok(user)
    }
}
