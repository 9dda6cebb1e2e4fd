//! Async HTTP client — the single choke point for outbound API calls.
//!
//! # Design
//! `HttpClient` owns the base URL, a reqwest client, and the process-wide
//! bearer-token slot. Every resource API and the session store go through
//! its `get`/`post`/`put`/`patch`/`delete` methods; nothing else touches
//! the network.
//!
//! The token is a single mutable slot: only the session store writes it
//! (via [`HttpClient::set_token`]), everything else observes it implicitly
//! by issuing requests. Non-2xx responses become [`ApiError::Http`] with a
//! message extracted from the JSON body when possible; transport failures
//! become [`ApiError::Network`] so callers can tell "backend unreachable"
//! apart from "backend rejected request".

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{ApiError, FALLBACK_MESSAGE};

/// Query parameters as ordered pairs. Absent filter fields are simply not
/// present — there is no way to serialize an "undefined" value.
pub type Params = Vec<(&'static str, String)>;

/// Shared, token-carrying HTTP client for the Werkmarkt backend.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl HttpClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Replace the bearer token used by all subsequent requests.
    /// `None` removes the `Authorization` header entirely.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    /// Whether a token is currently held. The value itself is never exposed.
    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, params, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, &[], Some(to_body(body)?))
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PUT, path, &[], Some(to_body(body)?))
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PATCH, path, &[], Some(to_body(body)?))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, &[], None).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&'static str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "api request");

        let mut req = self.http.request(method, &url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(token) = self.token.read().as_deref() {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: extract_message(&body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Serialize a request body up front so a bad payload fails before any I/O.
fn to_body<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Best-effort `message` extraction from an error body; unparsable or
/// message-less bodies fall back to the generic text.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_message_reads_json_message_field() {
        let body = r#"{"success":false,"message":"Invalid credentials"}"#;
        assert_eq!(extract_message(body), "Invalid credentials");
    }

    #[test]
    fn extract_message_falls_back_on_non_json() {
        assert_eq!(extract_message("<html>502</html>"), FALLBACK_MESSAGE);
        assert_eq!(extract_message(""), FALLBACK_MESSAGE);
    }

    #[test]
    fn extract_message_falls_back_on_missing_field() {
        assert_eq!(extract_message(r#"{"error":"nope"}"#), FALLBACK_MESSAGE);
        assert_eq!(extract_message(r#"{"message":42}"#), FALLBACK_MESSAGE);
    }

    #[test]
    fn token_slot_is_single_and_mutable() {
        let client = HttpClient::new(ApiConfig::new("http://localhost:8000"));
        assert!(!client.has_token());
        client.set_token(Some("abc".to_string()));
        assert!(client.has_token());
        let clone = client.clone();
        clone.set_token(None);
        // Clones share the slot: clearing through one clears for all.
        assert!(!client.has_token());
    }
}
