//! Typed API client core for the Werkmarkt marketplace.
//!
//! # Overview
//! Werkmarkt is a DACH-region marketplace for automation services; its two
//! front ends are thin view layers over one HTTP API. This crate is the
//! layer they share: a token-carrying [`HttpClient`], the endpoint
//! registry, per-resource read/write APIs over a keyed TTL cache with
//! request coalescing, and the [`AuthSessionStore`] that owns the
//! credential and session state.
//!
//! # Design
//! - One `HttpClient` and one `QueryCache` per process, wired together by
//!   [`Werkmarkt`]; resource APIs and the session store are cheap handles
//!   over them.
//! - Only the session store writes the token slot; everything else
//!   observes it by issuing requests.
//! - Reads coalesce per cache key and respect per-resource freshness
//!   windows; mutations invalidate their namespace after their own
//!   response lands.
//! - DTOs mirror the backend schema but are defined independently; the
//!   mock-server integration tests catch schema drift.

pub mod cache;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod filters;
pub mod http;
pub mod resources;
pub mod session;
pub mod types;

use std::sync::Arc;

pub use cache::{QueryCache, QueryKey};
pub use config::ApiConfig;
pub use error::{ApiError, FALLBACK_MESSAGE};
pub use filters::{
    AdminUserFilters, ExpertFilters, Pagination, PostingFilters, SearchFilters, ServiceFilters,
};
pub use http::HttpClient;
pub use session::{
    auth_cookie, AuthSessionStore, FileStorage, MemoryStorage, PersistedSession, SessionState,
    SessionStorage,
};
pub use types::{
    AdminStats, ApiResponse, AuthPayload, Category, CheckoutRequest, Conversation, Credentials,
    Expert, Message, NewMessage, NewPosting, PageMeta, PaginatedResponse, Payment, PaymentStatus,
    Posting, PostingStatus, ProfileUpdate, Registration, SearchResults, Service, User, UserRole,
};

use resources::admin::AdminApi;
use resources::categories::CategoriesApi;
use resources::experts::ExpertsApi;
use resources::messages::MessagesApi;
use resources::payments::PaymentsApi;
use resources::postings::PostingsApi;
use resources::search::SearchApi;
use resources::services::ServicesApi;
use resources::users::UsersApi;

/// Root handle: one client, one cache, one session store, and a typed API
/// per backend resource. The presentation layer talks to this and nothing
/// below it.
pub struct Werkmarkt {
    pub client: Arc<HttpClient>,
    pub cache: Arc<QueryCache>,
    pub session: AuthSessionStore,
    pub experts: ExpertsApi,
    pub services: ServicesApi,
    pub categories: CategoriesApi,
    pub search: SearchApi,
    pub messages: MessagesApi,
    pub payments: PaymentsApi,
    pub postings: PostingsApi,
    pub users: UsersApi,
    pub admin: AdminApi,
}

impl Werkmarkt {
    pub fn new(config: ApiConfig, storage: Arc<dyn SessionStorage>) -> Self {
        let client = Arc::new(HttpClient::new(config));
        let cache = Arc::new(QueryCache::new());
        Self {
            session: AuthSessionStore::new(client.clone(), storage),
            experts: ExpertsApi::new(client.clone(), cache.clone()),
            services: ServicesApi::new(client.clone(), cache.clone()),
            categories: CategoriesApi::new(client.clone(), cache.clone()),
            search: SearchApi::new(client.clone(), cache.clone()),
            messages: MessagesApi::new(client.clone(), cache.clone()),
            payments: PaymentsApi::new(client.clone(), cache.clone()),
            postings: PostingsApi::new(client.clone(), cache.clone()),
            users: UsersApi::new(client.clone(), cache.clone()),
            admin: AdminApi::new(client.clone(), cache.clone()),
            client,
            cache,
        }
    }

    /// Base URL from `API_URL`, in-memory session storage.
    pub fn from_env() -> Self {
        Self::new(ApiConfig::from_env(), Arc::new(MemoryStorage::new()))
    }
}
