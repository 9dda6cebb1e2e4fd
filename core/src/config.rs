//! Client configuration.
//!
//! The base URL comes from the environment (`API_URL`), falling back to the
//! local development backend. Callers never pass absolute URLs per request.

/// Environment variable read by [`ApiConfig::from_env`].
pub const API_URL_VAR: &str = "API_URL";

/// Local development backend used when `API_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for [`crate::HttpClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    /// Build a config from an explicit base URL. A trailing slash is
    /// stripped so path concatenation never produces `//`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read `API_URL` from the environment, defaulting to the local backend.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var(API_URL_VAR).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(&base_url)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ApiConfig::new("https://api.werkmarkt.example/");
        assert_eq!(config.base_url, "https://api.werkmarkt.example");
    }

    #[test]
    fn default_points_at_local_backend() {
        assert_eq!(ApiConfig::default().base_url, DEFAULT_BASE_URL);
    }
}
