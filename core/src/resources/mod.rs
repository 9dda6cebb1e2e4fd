//! Per-resource API surfaces: cache-aware reads, cache-invalidating writes.
//!
//! # Design
//! Each module wraps one backend resource in a small struct over the shared
//! [`HttpClient`](crate::HttpClient) and [`QueryCache`](crate::QueryCache).
//! Reads derive a [`QueryKey`] from their filters, go through
//! `QueryCache::get_or_fetch` with a TTL graded by the resource's
//! volatility, and decode on the way out. Writes issue exactly one request
//! and invalidate their resource namespace only after that request's own
//! response has landed. Errors propagate, except where a read documents a
//! soft-fail policy (messaging history).

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Duration;

use crate::cache::{QueryCache, QueryKey};
use crate::error::ApiError;

pub mod admin;
pub mod categories;
pub mod experts;
pub mod messages;
pub mod payments;
pub mod postings;
pub mod search;
pub mod services;
pub mod users;

/// Run a read through the cache and decode the stored value.
pub(crate) async fn fetch_cached<T, F, Fut>(
    cache: &QueryCache,
    key: QueryKey,
    ttl: Duration,
    fetch: F,
) -> Result<T, ApiError>
where
    T: DeserializeOwned,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
{
    let value = cache.get_or_fetch(key, ttl, fetch).await?;
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Convert a decoded payload into the cache's value representation.
pub(crate) fn to_cache_value<T: Serialize>(payload: T) -> Result<Value, ApiError> {
    serde_json::to_value(payload).map_err(|e| ApiError::Decode(e.to_string()))
}
