//! Endpoint registry: every backend path is defined exactly once here.
//!
//! Literal routes are `const`s; routes with a path segment are pure
//! builders. Callers combine these with [`crate::HttpClient`] — no caller
//! hardcodes a path string. Adding a backend route means adding one entry.

use uuid::Uuid;

pub const API_PREFIX: &str = "/api/v1";

pub mod auth {
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const LOGOUT: &str = "/api/v1/auth/logout";
    pub const REFRESH: &str = "/api/v1/auth/refresh";
    pub const ME: &str = "/api/v1/auth/me";
}

pub mod experts {
    use super::Uuid;

    pub const LIST: &str = "/api/v1/experts";
    pub const FEATURED: &str = "/api/v1/experts/featured";

    pub fn detail(id: Uuid) -> String {
        format!("/api/v1/experts/{id}")
    }
}

pub mod services {
    use super::Uuid;

    pub const LIST: &str = "/api/v1/services";
    pub const FEATURED: &str = "/api/v1/services/featured";

    pub fn detail(id: Uuid) -> String {
        format!("/api/v1/services/{id}")
    }
}

pub mod categories {
    pub const LIST: &str = "/api/v1/categories";

    pub fn detail(slug: &str) -> String {
        format!("/api/v1/categories/{slug}")
    }
}

pub mod search {
    pub const SEARCH: &str = "/api/v1/search";
}

pub mod messages {
    use super::Uuid;

    pub const CONVERSATIONS: &str = "/api/v1/conversations";
    pub const SEND: &str = "/api/v1/messages";

    pub fn conversation(id: Uuid) -> String {
        format!("/api/v1/conversations/{id}/messages")
    }
}

pub mod payments {
    use super::Uuid;

    pub const HISTORY: &str = "/api/v1/payments";
    pub const CHECKOUT: &str = "/api/v1/payments/checkout";

    pub fn detail(id: Uuid) -> String {
        format!("/api/v1/payments/{id}")
    }
}

pub mod postings {
    use super::Uuid;

    pub const LIST: &str = "/api/v1/postings";

    pub fn detail(id: Uuid) -> String {
        format!("/api/v1/postings/{id}")
    }

    pub fn status(id: Uuid) -> String {
        format!("/api/v1/postings/{id}/status")
    }
}

pub mod users {
    use super::Uuid;

    pub const ME: &str = "/api/v1/users/me";

    pub fn profile(id: Uuid) -> String {
        format!("/api/v1/users/{id}")
    }
}

pub mod admin {
    use super::Uuid;

    pub const STATS: &str = "/api/v1/admin/stats";
    pub const USERS: &str = "/api/v1/admin/users";

    pub fn suspend_user(id: Uuid) -> String {
        format!("/api/v1/admin/users/{id}/suspend")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_embed_the_id() {
        let id = Uuid::nil();
        assert_eq!(
            experts::detail(id),
            "/api/v1/experts/00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            messages::conversation(id),
            "/api/v1/conversations/00000000-0000-0000-0000-000000000000/messages"
        );
        assert_eq!(
            postings::status(id),
            "/api/v1/postings/00000000-0000-0000-0000-000000000000/status"
        );
    }

    #[test]
    fn category_detail_uses_slug() {
        assert_eq!(
            categories::detail("smart-home"),
            "/api/v1/categories/smart-home"
        );
    }

    #[test]
    fn literal_routes_share_the_version_prefix() {
        for path in [
            auth::LOGIN,
            experts::LIST,
            services::FEATURED,
            categories::LIST,
            search::SEARCH,
            messages::CONVERSATIONS,
            payments::CHECKOUT,
            postings::LIST,
            users::ME,
            admin::STATS,
        ] {
            assert!(path.starts_with(API_PREFIX), "{path}");
        }
    }
}
