//! Payment history and checkout.

use std::sync::Arc;

use tokio::time::Duration;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey};
use crate::endpoints;
use crate::error::ApiError;
use crate::filters::Pagination;
use crate::http::HttpClient;
use crate::types::{ApiResponse, CheckoutRequest, PaginatedResponse, Payment};

use super::{fetch_cached, to_cache_value};

const RESOURCE: &str = "payments";
const TTL: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct PaymentsApi {
    client: Arc<HttpClient>,
    cache: Arc<QueryCache>,
}

impl PaymentsApi {
    pub(crate) fn new(client: Arc<HttpClient>, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub async fn history(
        &self,
        pagination: &Pagination,
    ) -> Result<PaginatedResponse<Payment>, ApiError> {
        let mut params = Vec::new();
        if let Some(page) = pagination.page {
            params.push(("page", page.to_string()));
        }
        if let Some(per_page) = pagination.per_page {
            params.push(("perPage", per_page.to_string()));
        }
        let key = QueryKey::new(RESOURCE, "history").with_params(&params);
        let client = self.client.clone();
        fetch_cached(&self.cache, key, TTL, move || async move {
            let page: PaginatedResponse<Payment> =
                client.get(endpoints::payments::HISTORY, &params).await?;
            to_cache_value(page)
        })
        .await
    }

    pub async fn detail(&self, id: Uuid) -> Result<Payment, ApiError> {
        let key = QueryKey::new(RESOURCE, "detail").with_segment(&id.to_string());
        let client = self.client.clone();
        fetch_cached(&self.cache, key, TTL, move || async move {
            let resp: ApiResponse<Payment> =
                client.get(&endpoints::payments::detail(id), &[]).await?;
            to_cache_value(resp.into_result()?)
        })
        .await
    }

    /// Pay for a service. Hard failure — checkout errors are always shown
    /// to the user, never swallowed.
    pub async fn checkout(&self, request: &CheckoutRequest) -> Result<Payment, ApiError> {
        let resp: ApiResponse<Payment> = self
            .client
            .post(endpoints::payments::CHECKOUT, request)
            .await?;
        let payment = resp.into_result()?;
        self.cache.invalidate_resource(RESOURCE);
        Ok(payment)
    }
}
