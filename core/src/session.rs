//! Auth session store — the single source of truth for "who is logged in".
//!
//! # Design
//! The store is the only writer of the HTTP client's token slot. Durable
//! storage holds a convenience slice (`user`, `is_authenticated`) plus the
//! refresh token in a separate slot; the access token lives in memory only
//! and is re-derived through [`AuthSessionStore::fetch_user`] on startup —
//! the persisted slice is an optimistic-UI hint, not a security boundary.
//!
//! Invariant: `is_authenticated == true` implies a user is present and the
//! client holds a token. Every operation converges to it on completion,
//! success or failure.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::endpoints;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::types::{
    ApiResponse, AuthPayload, Credentials, RefreshPayload, RefreshRequest, Registration, User,
};

/// Lifetime of the SSR `auth_token` cookie: seven days.
const COOKIE_MAX_AGE_SECS: u32 = 604_800;

/// The slice of session state that survives reloads. Never contains the
/// access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub user: User,
    pub is_authenticated: bool,
}

/// Durable client storage for the persisted slice and the refresh token.
///
/// Implementations must not fail loudly: persistence is best-effort and
/// the store logs rather than propagates storage trouble.
pub trait SessionStorage: Send + Sync {
    fn load_session(&self) -> Option<PersistedSession>;
    fn save_session(&self, session: &PersistedSession);
    fn clear_session(&self);

    fn load_refresh_token(&self) -> Option<String>;
    fn save_refresh_token(&self, token: &str);
    fn clear_refresh_token(&self);
}

/// In-memory storage for tests and single-page hosts without persistence.
#[derive(Default)]
pub struct MemoryStorage {
    session: Mutex<Option<PersistedSession>>,
    refresh_token: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn load_session(&self) -> Option<PersistedSession> {
        self.session.lock().clone()
    }

    fn save_session(&self, session: &PersistedSession) {
        *self.session.lock() = Some(session.clone());
    }

    fn clear_session(&self) {
        *self.session.lock() = None;
    }

    fn load_refresh_token(&self) -> Option<String> {
        self.refresh_token.lock().clone()
    }

    fn save_refresh_token(&self, token: &str) {
        *self.refresh_token.lock() = Some(token.to_string());
    }

    fn clear_refresh_token(&self) {
        *self.refresh_token.lock() = None;
    }
}

/// JSON-file storage for the server-rendered host.
#[derive(Serialize, Deserialize, Default)]
struct FileContents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session: Option<PersistedSession>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> FileContents {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => FileContents::default(),
        }
    }

    fn write(&self, contents: &FileContents) {
        let raw = match serde_json::to_string_pretty(contents) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%err, "could not serialize session storage");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, raw) {
            warn!(%err, path = %self.path.display(), "could not write session storage");
        }
    }
}

impl SessionStorage for FileStorage {
    fn load_session(&self) -> Option<PersistedSession> {
        self.read().session
    }

    fn save_session(&self, session: &PersistedSession) {
        let mut contents = self.read();
        contents.session = Some(session.clone());
        self.write(&contents);
    }

    fn clear_session(&self) {
        let mut contents = self.read();
        contents.session = None;
        self.write(&contents);
    }

    fn load_refresh_token(&self) -> Option<String> {
        self.read().refresh_token
    }

    fn save_refresh_token(&self, token: &str) {
        let mut contents = self.read();
        contents.refresh_token = Some(token.to_string());
        self.write(&contents);
    }

    fn clear_refresh_token(&self) {
        let mut contents = self.read();
        contents.refresh_token = None;
        self.write(&contents);
    }
}

/// Current in-memory session state.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub error: Option<String>,
}

pub struct AuthSessionStore {
    client: Arc<HttpClient>,
    storage: Arc<dyn SessionStorage>,
    state: RwLock<SessionState>,
}

impl AuthSessionStore {
    pub fn new(client: Arc<HttpClient>, storage: Arc<dyn SessionStorage>) -> Self {
        // Persisted slice seeds optimistic UI state; privileged actions
        // still require a successful fetch_user.
        let state = storage
            .load_session()
            .map(|persisted| SessionState {
                user: Some(persisted.user),
                is_authenticated: persisted.is_authenticated,
                error: None,
            })
            .unwrap_or_default();
        Self {
            client,
            storage,
            state: RwLock::new(state),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    /// Reset the recorded error. Pure state change, no I/O.
    pub fn clear_error(&self) {
        self.state.write().error = None;
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let result: Result<ApiResponse<AuthPayload>, ApiError> =
            self.client.post(endpoints::auth::LOGIN, &credentials).await;
        self.commit_auth(result.and_then(ApiResponse::into_result))
    }

    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        if let Err(err) = validate_registration(registration) {
            self.state.write().error = Some(err.message());
            return Err(err);
        }
        let result: Result<ApiResponse<AuthPayload>, ApiError> = self
            .client
            .post(endpoints::auth::REGISTER, registration)
            .await;
        self.commit_auth(result.and_then(ApiResponse::into_result))
    }

    /// On success: token into the client, refresh token and session slice
    /// into storage, state committed. On failure: record the error and
    /// leave prior session state untouched.
    fn commit_auth(&self, result: Result<AuthPayload, ApiError>) -> Result<User, ApiError> {
        match result {
            Ok(payload) => {
                self.client.set_token(Some(payload.access_token));
                self.storage.save_refresh_token(&payload.refresh_token);
                self.storage.save_session(&PersistedSession {
                    user: payload.user.clone(),
                    is_authenticated: true,
                });
                *self.state.write() = SessionState {
                    user: Some(payload.user.clone()),
                    is_authenticated: true,
                    error: None,
                };
                Ok(payload.user)
            }
            Err(err) => {
                self.state.write().error = Some(err.message());
                Err(err)
            }
        }
    }

    /// Best-effort server-side logout followed by unconditional local
    /// cleanup. A dead backend must never leave a half-logged-out client.
    pub async fn logout(&self) {
        let result: Result<ApiResponse<serde_json::Value>, ApiError> = self
            .client
            .post(endpoints::auth::LOGOUT, &serde_json::json!({}))
            .await;
        if let Err(err) = result {
            warn!(%err, "logout request failed; clearing local session anyway");
        }
        self.reset_local();
    }

    /// Re-derive session state from stored credentials, e.g. on app start.
    /// Any failure lands in a clean unauthenticated state — an unverifiable
    /// session is logged-out, not an error.
    pub async fn fetch_user(&self) -> Option<User> {
        if !self.client.has_token() {
            let refresh_token = match self.storage.load_refresh_token() {
                Some(token) => token,
                None => {
                    self.reset_local();
                    return None;
                }
            };
            let refreshed: Result<ApiResponse<RefreshPayload>, ApiError> = self
                .client
                .post(endpoints::auth::REFRESH, &RefreshRequest { refresh_token })
                .await;
            match refreshed.and_then(ApiResponse::into_result) {
                Ok(payload) => self.client.set_token(Some(payload.access_token)),
                Err(err) => {
                    debug!(%err, "token refresh failed; treating session as logged out");
                    self.reset_local();
                    return None;
                }
            }
        }

        let me: Result<ApiResponse<User>, ApiError> =
            self.client.get(endpoints::auth::ME, &[]).await;
        match me.and_then(ApiResponse::into_result) {
            Ok(user) => {
                self.storage.save_session(&PersistedSession {
                    user: user.clone(),
                    is_authenticated: true,
                });
                *self.state.write() = SessionState {
                    user: Some(user.clone()),
                    is_authenticated: true,
                    error: None,
                };
                Some(user)
            }
            Err(err) => {
                debug!(%err, "session could not be verified; treating as logged out");
                self.reset_local();
                None
            }
        }
    }

    fn reset_local(&self) {
        self.client.set_token(None);
        self.storage.clear_session();
        self.storage.clear_refresh_token();
        *self.state.write() = SessionState::default();
    }
}

/// `auth_token` cookie for the server-rendered front end's SSR layer.
pub fn auth_cookie(token: &str) -> String {
    format!("auth_token={token}; Path=/; Max-Age={COOKIE_MAX_AGE_SECS}; SameSite=Lax")
}

/// Local, pre-network checks for the registration form.
fn validate_registration(registration: &Registration) -> Result<(), ApiError> {
    if registration.email.trim().is_empty() {
        return Err(ApiError::validation("email", "Email is required"));
    }
    if registration.first_name.trim().is_empty() {
        return Err(ApiError::validation("firstName", "First name is required"));
    }
    if registration.last_name.trim().is_empty() {
        return Err(ApiError::validation("lastName", "Last name is required"));
    }
    if registration.password.len() < 8 {
        return Err(ApiError::validation(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    if registration.password != registration.password_confirmation {
        return Err(ApiError::validation(
            "passwordConfirmation",
            "Passwords do not match",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::config::ApiConfig;
    use crate::types::UserRole;

    use super::*;

    fn registration() -> Registration {
        Registration {
            email: "anna@example.com".to_string(),
            password: "wunderbar123".to_string(),
            password_confirmation: "wunderbar123".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Schmidt".to_string(),
        }
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "anna@example.com".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Schmidt".to_string(),
            role: UserRole::Client,
            suspended: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn registration_validation_matrix() {
        assert!(validate_registration(&registration()).is_ok());

        let mut r = registration();
        r.email = "  ".to_string();
        assert!(matches!(
            validate_registration(&r),
            Err(ApiError::Validation { field: "email", .. })
        ));

        let mut r = registration();
        r.password = "kurz".to_string();
        r.password_confirmation = "kurz".to_string();
        assert!(matches!(
            validate_registration(&r),
            Err(ApiError::Validation {
                field: "password",
                ..
            })
        ));

        let mut r = registration();
        r.password_confirmation = "anders12345".to_string();
        assert!(matches!(
            validate_registration(&r),
            Err(ApiError::Validation {
                field: "passwordConfirmation",
                ..
            })
        ));

        let mut r = registration();
        r.first_name = String::new();
        assert!(validate_registration(&r).is_err());
    }

    #[test]
    fn auth_cookie_matches_ssr_contract() {
        assert_eq!(
            auth_cookie("tok123"),
            "auth_token=tok123; Path=/; Max-Age=604800; SameSite=Lax"
        );
    }

    #[test]
    fn memory_storage_round_trips() {
        let storage = MemoryStorage::new();
        assert!(storage.load_session().is_none());
        assert!(storage.load_refresh_token().is_none());

        storage.save_session(&PersistedSession {
            user: user(),
            is_authenticated: true,
        });
        storage.save_refresh_token("refresh-1");
        assert!(storage.load_session().unwrap().is_authenticated);
        assert_eq!(storage.load_refresh_token().unwrap(), "refresh-1");

        storage.clear_session();
        storage.clear_refresh_token();
        assert!(storage.load_session().is_none());
        assert!(storage.load_refresh_token().is_none());
    }

    #[test]
    fn persisted_slice_seeds_state_but_not_the_token() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save_session(&PersistedSession {
            user: user(),
            is_authenticated: true,
        });
        let client = Arc::new(HttpClient::new(ApiConfig::new("http://localhost:8000")));
        let store = AuthSessionStore::new(client.clone(), storage);

        // Optimistic UI hint restored, but no credential until fetch_user.
        assert!(store.is_authenticated());
        assert!(store.user().is_some());
        assert!(!client.has_token());
    }

    #[test]
    fn local_validation_never_reaches_the_wire() {
        // Unroutable base URL: if register tried the network this would
        // not return a Validation error.
        let client = Arc::new(HttpClient::new(ApiConfig::new("http://127.0.0.1:1")));
        let store = AuthSessionStore::new(client, Arc::new(MemoryStorage::new()));
        let mut r = registration();
        r.password_confirmation = "mismatch99".to_string();

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let err = rt.block_on(store.register(&r)).unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
        assert_eq!(store.error(), Some("Passwords do not match".to_string()));
    }

    #[test]
    fn file_storage_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("session.json"));

        storage.save_refresh_token("refresh-2");
        storage.save_session(&PersistedSession {
            user: user(),
            is_authenticated: true,
        });
        // Refresh token and slice live in the same file without clobbering
        // each other.
        assert_eq!(storage.load_refresh_token().unwrap(), "refresh-2");
        assert!(storage.load_session().unwrap().is_authenticated);

        storage.clear_refresh_token();
        assert!(storage.load_refresh_token().is_none());
        assert!(storage.load_session().is_some());
    }
}
