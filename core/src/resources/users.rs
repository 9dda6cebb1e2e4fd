//! Public profiles and own-profile updates.

use std::sync::Arc;

use tokio::time::Duration;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey};
use crate::endpoints;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::types::{ApiResponse, ProfileUpdate, User};

use super::{fetch_cached, to_cache_value};

const RESOURCE: &str = "users";
const TTL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct UsersApi {
    client: Arc<HttpClient>,
    cache: Arc<QueryCache>,
}

impl UsersApi {
    pub(crate) fn new(client: Arc<HttpClient>, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub async fn profile(&self, id: Uuid) -> Result<User, ApiError> {
        let key = QueryKey::new(RESOURCE, "profile").with_segment(&id.to_string());
        let client = self.client.clone();
        fetch_cached(&self.cache, key, TTL, move || async move {
            let resp: ApiResponse<User> =
                client.get(&endpoints::users::profile(id), &[]).await?;
            to_cache_value(resp.into_result()?)
        })
        .await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let resp: ApiResponse<User> = self.client.put(endpoints::users::ME, update).await?;
        let user = resp.into_result()?;
        self.cache.invalidate_resource(RESOURCE);
        Ok(user)
    }
}
