//! Keyed read cache with TTLs, request coalescing, and namespace
//! invalidation.
//!
//! # Design
//! Values are stored as `serde_json::Value` so the cache stays non-generic
//! and results can be cloned into every coalesced waiter; the resource
//! APIs decode on the way out. Each slot carries a generation counter:
//! invalidation bumps it, and an in-flight fetch only writes back if the
//! generation it was issued under is still current — a response superseded
//! mid-flight is handed to its caller but never overwrites newer state.
//!
//! The write-back runs inside the shared future itself, so it is performed
//! by whichever waiter drives the fetch to completion. A caller that is
//! cancelled mid-flight leaves the fetch joinable, not a wedged slot.
//!
//! Errors are not cached; a failed fetch leaves the slot empty so the next
//! read retries.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::{Duration, Instant};

use crate::error::ApiError;

/// Identity of a cached read: resource namespace, operation, and the
/// serialized filter pairs. Equal filter values give equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: &'static str,
    op: &'static str,
    params: Vec<(String, String)>,
}

impl QueryKey {
    pub fn new(resource: &'static str, op: &'static str) -> Self {
        Self {
            resource,
            op,
            params: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: &[(&'static str, String)]) -> Self {
        self.params = params
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        self
    }

    /// Extra path segment (detail ids and the like) folded into the key.
    pub fn with_segment(mut self, segment: &str) -> Self {
        self.params.push(("_seg".to_string(), segment.to_string()));
        self
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }
}

type FetchFuture = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

type Slots = Mutex<HashMap<QueryKey, Slot>>;

enum SlotState {
    Empty,
    Ready { value: Value, stored_at: Instant },
    InFlight(FetchFuture),
}

struct Slot {
    generation: u64,
    state: SlotState,
}

/// Process-wide cache shared by all resource APIs.
#[derive(Default)]
pub struct QueryCache {
    slots: Arc<Slots>,
}

enum Plan {
    Hit(Value),
    Join(FetchFuture),
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value if fresh, join the in-flight request if one
    /// exists, otherwise run `make_fetch` exactly once and store its result.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: QueryKey,
        ttl: Duration,
        make_fetch: F,
    ) -> Result<Value, ApiError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
    {
        let plan = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(key.clone()).or_insert(Slot {
                generation: 0,
                state: SlotState::Empty,
            });
            match &slot.state {
                SlotState::Ready { value, stored_at } if stored_at.elapsed() < ttl => {
                    Plan::Hit(value.clone())
                }
                SlotState::InFlight(fut) => Plan::Join(fut.clone()),
                _ => {
                    let store = Arc::clone(&self.slots);
                    let generation = slot.generation;
                    let fetch_key = key.clone();
                    let fut = async move {
                        let result = make_fetch().await;
                        commit(&store, &fetch_key, generation, &result);
                        result
                    }
                    .boxed()
                    .shared();
                    slot.state = SlotState::InFlight(fut.clone());
                    Plan::Join(fut)
                }
            }
        };

        match plan {
            Plan::Hit(value) => Ok(value),
            Plan::Join(fut) => fut.await,
        }
    }

    /// Drop one entry and refuse any write-back from its in-flight fetch.
    pub fn invalidate(&self, key: &QueryKey) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(key) {
            slot.generation += 1;
            slot.state = SlotState::Empty;
        }
    }

    /// Drop every entry under a resource namespace. Mutations call this
    /// after their own response has been received.
    pub fn invalidate_resource(&self, resource: &str) {
        let mut slots = self.slots.lock();
        for (key, slot) in slots.iter_mut() {
            if key.resource == resource {
                slot.generation += 1;
                slot.state = SlotState::Empty;
            }
        }
    }

    pub fn clear(&self) {
        let mut slots = self.slots.lock();
        for slot in slots.values_mut() {
            slot.generation += 1;
            slot.state = SlotState::Empty;
        }
    }
}

/// Write back a finished fetch, unless the slot moved on without us.
fn commit(slots: &Slots, key: &QueryKey, generation: u64, result: &Result<Value, ApiError>) {
    let mut slots = slots.lock();
    let Some(slot) = slots.get_mut(key) else {
        return;
    };
    if slot.generation != generation {
        return;
    }
    slot.state = match result {
        Ok(value) => SlotState::Ready {
            value: value.clone(),
            stored_at: Instant::now(),
        },
        Err(_) => SlotState::Empty,
    };
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    fn key(op: &'static str) -> QueryKey {
        QueryKey::new("services", op)
    }

    fn counted_fetch(
        count: Arc<AtomicUsize>,
        value: Value,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Value, ApiError>> {
        move || {
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_identical_reads_coalesce_into_one_fetch() {
        let cache = QueryCache::new();
        let count = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.get_or_fetch(
                key("list"),
                Duration::from_secs(60),
                counted_fetch(count.clone(), json!([1, 2]))
            ),
            cache.get_or_fetch(
                key("list"),
                Duration::from_secs(60),
                counted_fetch(count.clone(), json!([3, 4]))
            ),
        );

        assert_eq!(a.unwrap(), json!([1, 2]));
        assert_eq!(b.unwrap(), json!([1, 2]));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_entry_is_served_without_a_fetch() {
        let cache = QueryCache::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            cache
                .get_or_fetch(
                    key("list"),
                    Duration::from_secs(60),
                    counted_fetch(count.clone(), json!("v")),
                )
                .await
                .unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_refetched() {
        let cache = QueryCache::new();
        let count = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(30);

        cache
            .get_or_fetch(key("list"), ttl, counted_fetch(count.clone(), json!(1)))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;
        cache
            .get_or_fetch(key("list"), ttl, counted_fetch(count.clone(), json!(2)))
            .await
            .unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_are_not_cached() {
        let cache = QueryCache::new();
        let count = Arc::new(AtomicUsize::new(0));

        let failing = {
            let count = count.clone();
            move || {
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err::<Value, _>(ApiError::Network("down".to_string()))
                }
                .boxed()
            }
        };
        let err = cache
            .get_or_fetch(key("list"), Duration::from_secs(60), failing)
            .await
            .unwrap_err();
        assert!(err.is_network());

        cache
            .get_or_fetch(
                key("list"),
                Duration::from_secs(60),
                counted_fetch(count.clone(), json!("ok")),
            )
            .await
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_discards_a_superseded_in_flight_response() {
        let cache = Arc::new(QueryCache::new());
        let count = Arc::new(AtomicUsize::new(0));

        let slow = tokio::spawn({
            let cache = cache.clone();
            let count = count.clone();
            async move {
                cache
                    .get_or_fetch(
                        key("list"),
                        Duration::from_secs(60),
                        counted_fetch(count, json!("stale")),
                    )
                    .await
            }
        });
        // Let the slow fetch get in flight, then invalidate underneath it.
        tokio::task::yield_now().await;
        cache.invalidate_resource("services");
        let result = slow.await.unwrap().unwrap();
        assert_eq!(result, json!("stale"));

        // The superseded response must not have been written back.
        let fresh = cache
            .get_or_fetch(
                key("list"),
                Duration::from_secs(60),
                counted_fetch(count.clone(), json!("fresh")),
            )
            .await
            .unwrap();
        assert_eq!(fresh, json!("fresh"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn a_cancelled_fetch_owner_does_not_wedge_the_slot() {
        let cache = Arc::new(QueryCache::new());
        let count = Arc::new(AtomicUsize::new(0));

        let owner = tokio::spawn({
            let cache = cache.clone();
            let count = count.clone();
            async move {
                cache
                    .get_or_fetch(
                        key("list"),
                        Duration::from_secs(60),
                        counted_fetch(count, json!("v1")),
                    )
                    .await
            }
        });
        // The owner gets the fetch in flight, then is cancelled.
        tokio::task::yield_now().await;
        owner.abort();

        // The next reader joins the orphaned fetch and drives it home;
        // no second request is issued.
        let joined = cache
            .get_or_fetch(
                key("list"),
                Duration::from_secs(60),
                counted_fetch(count.clone(), json!("unused")),
            )
            .await
            .unwrap();
        assert_eq!(joined, json!("v1"));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // The write-back happened too: the freshness window applies and
        // an expired entry is refetched as usual.
        tokio::time::advance(Duration::from_secs(61)).await;
        let refreshed = cache
            .get_or_fetch(
                key("list"),
                Duration::from_secs(60),
                counted_fetch(count.clone(), json!("v2")),
            )
            .await
            .unwrap();
        assert_eq!(refreshed, json!("v2"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn an_abandoned_failed_fetch_is_not_served_twice() {
        let cache = Arc::new(QueryCache::new());
        let count = Arc::new(AtomicUsize::new(0));

        let owner = tokio::spawn({
            let cache = cache.clone();
            let count = count.clone();
            async move {
                let failing = move || {
                    async move {
                        count.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        Err::<Value, _>(ApiError::Network("down".to_string()))
                    }
                    .boxed()
                };
                cache
                    .get_or_fetch(key("list"), Duration::from_secs(60), failing)
                    .await
            }
        });
        tokio::task::yield_now().await;
        owner.abort();

        // The joiner sees the orphaned fetch's failure once...
        let err = cache
            .get_or_fetch(
                key("list"),
                Duration::from_secs(60),
                counted_fetch(count.clone(), json!("unused")),
            )
            .await
            .unwrap_err();
        assert!(err.is_network());

        // ...and the slot is empty again rather than stuck on the error.
        let value = cache
            .get_or_fetch(
                key("list"),
                Duration::from_secs(60),
                counted_fetch(count.clone(), json!("v2")),
            )
            .await
            .unwrap();
        assert_eq!(value, json!("v2"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_is_scoped_to_the_resource_namespace() {
        let cache = QueryCache::new();
        let services = Arc::new(AtomicUsize::new(0));
        let categories = Arc::new(AtomicUsize::new(0));
        let other = QueryKey::new("categories", "list");

        cache
            .get_or_fetch(
                key("list"),
                Duration::from_secs(60),
                counted_fetch(services.clone(), json!("s")),
            )
            .await
            .unwrap();
        cache
            .get_or_fetch(
                other.clone(),
                Duration::from_secs(300),
                counted_fetch(categories.clone(), json!("c")),
            )
            .await
            .unwrap();

        cache.invalidate_resource("services");

        cache
            .get_or_fetch(
                key("list"),
                Duration::from_secs(60),
                counted_fetch(services.clone(), json!("s2")),
            )
            .await
            .unwrap();
        cache
            .get_or_fetch(
                other,
                Duration::from_secs(300),
                counted_fetch(categories.clone(), json!("c2")),
            )
            .await
            .unwrap();

        assert_eq!(services.load(Ordering::SeqCst), 2);
        assert_eq!(categories.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn keys_with_equal_params_are_equal() {
        let a = QueryKey::new("experts", "list").with_params(&[
            ("q", "knx".to_string()),
            ("page", "1".to_string()),
        ]);
        let b = QueryKey::new("experts", "list").with_params(&[
            ("q", "knx".to_string()),
            ("page", "1".to_string()),
        ]);
        assert_eq!(a, b);

        let c = QueryKey::new("experts", "list").with_params(&[("q", "plc".to_string())]);
        assert_ne!(a, c);
    }
}
