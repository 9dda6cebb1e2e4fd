//! Per-resource request filters.
//!
//! # Design
//! Every field is optional. `params()` serializes only the populated
//! fields, in declaration order, so two filters with equal field values
//! always produce the same pair list — and therefore the same cache key —
//! no matter how they were constructed. Absent fields never reach the
//! query string.

use crate::http::Params;
use crate::types::{PostingStatus, UserRole};

fn push<T: ToString>(params: &mut Params, key: &'static str, value: &Option<T>) {
    if let Some(value) = value {
        params.push((key, value.to_string()));
    }
}

/// Shared pagination fields embedded in the listing filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pagination {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Pagination {
    pub fn page(page: u32, per_page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    fn extend(&self, params: &mut Params) {
        push(params, "page", &self.page);
        push(params, "perPage", &self.per_page);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpertFilters {
    pub query: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub min_rating: Option<f32>,
    pub sort: Option<String>,
    pub pagination: Pagination,
}

impl ExpertFilters {
    pub fn params(&self) -> Params {
        let mut params = Params::new();
        push(&mut params, "q", &self.query);
        push(&mut params, "category", &self.category);
        push(&mut params, "location", &self.location);
        push(&mut params, "minRating", &self.min_rating);
        push(&mut params, "sort", &self.sort);
        self.pagination.extend(&mut params);
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceFilters {
    pub query: Option<String>,
    pub category: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub max_delivery_days: Option<u32>,
    pub sort: Option<String>,
    pub pagination: Pagination,
}

impl ServiceFilters {
    pub fn params(&self) -> Params {
        let mut params = Params::new();
        push(&mut params, "q", &self.query);
        push(&mut params, "category", &self.category);
        push(&mut params, "minPrice", &self.min_price_cents);
        push(&mut params, "maxPrice", &self.max_price_cents);
        push(&mut params, "maxDeliveryDays", &self.max_delivery_days);
        push(&mut params, "sort", &self.sort);
        self.pagination.extend(&mut params);
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub query: Option<String>,
    pub category: Option<String>,
    pub pagination: Pagination,
}

impl SearchFilters {
    pub fn query(text: &str) -> Self {
        Self {
            query: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn params(&self) -> Params {
        let mut params = Params::new();
        push(&mut params, "q", &self.query);
        push(&mut params, "category", &self.category);
        self.pagination.extend(&mut params);
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingFilters {
    pub status: Option<PostingStatus>,
    pub category: Option<String>,
    pub pagination: Pagination,
}

impl PostingFilters {
    pub fn params(&self) -> Params {
        let mut params = Params::new();
        if let Some(status) = self.status {
            let s = match status {
                PostingStatus::Open => "open",
                PostingStatus::Assigned => "assigned",
                PostingStatus::Closed => "closed",
            };
            params.push(("status", s.to_string()));
        }
        push(&mut params, "category", &self.category);
        self.pagination.extend(&mut params);
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminUserFilters {
    pub role: Option<UserRole>,
    pub suspended: Option<bool>,
    pub pagination: Pagination,
}

impl AdminUserFilters {
    pub fn params(&self) -> Params {
        let mut params = Params::new();
        if let Some(role) = self.role {
            let r = match role {
                UserRole::Client => "client",
                UserRole::Expert => "expert",
                UserRole::Admin => "admin",
            };
            params.push(("role", r.to_string()));
        }
        push(&mut params, "suspended", &self.suspended);
        self.pagination.extend(&mut params);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_never_serialized() {
        let filters = ServiceFilters::default();
        assert!(filters.params().is_empty());

        let filters = ServiceFilters {
            category: Some("industrie-40".to_string()),
            ..ServiceFilters::default()
        };
        assert_eq!(
            filters.params(),
            vec![("category", "industrie-40".to_string())]
        );
    }

    #[test]
    fn equal_values_give_equal_params_regardless_of_construction() {
        let a = ExpertFilters {
            query: Some("knx".to_string()),
            min_rating: Some(4.0),
            pagination: Pagination::page(1, 20),
            ..ExpertFilters::default()
        };
        let mut b = ExpertFilters::default();
        b.pagination.per_page = Some(20);
        b.min_rating = Some(4.0);
        b.query = Some("knx".to_string());
        b.pagination.page = Some(1);
        assert_eq!(a.params(), b.params());
    }

    #[test]
    fn pagination_uses_camel_case_keys() {
        let filters = PostingFilters {
            status: Some(PostingStatus::Open),
            pagination: Pagination::page(2, 12),
            ..PostingFilters::default()
        };
        assert_eq!(
            filters.params(),
            vec![
                ("status", "open".to_string()),
                ("page", "2".to_string()),
                ("perPage", "12".to_string()),
            ]
        );
    }
}
