//! Wire types: response envelopes, domain DTOs, and write payloads.
//!
//! # Design
//! Every backend response is wrapped in [`ApiResponse`] or, for listings,
//! [`PaginatedResponse`]. Field names on the wire are camelCase (the
//! backend serves two JavaScript front ends); `rename_all` keeps the Rust
//! side idiomatic. These types mirror the backend schema but are defined
//! independently — the mock-server integration tests catch schema drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, FALLBACK_MESSAGE};

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// The universal `{ success, data, message? }` envelope.
///
/// When `success` is false the payload must not be trusted, whatever it
/// contains — [`ApiResponse::into_result`] enforces that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the envelope. An unsuccessful envelope on a 2xx response is
    /// a backend contract violation and is reported as a decode-class
    /// error carrying the envelope message when present.
    pub fn into_result(self) -> Result<T, ApiError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(ApiError::Decode(
                self.message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
            )),
        }
    }
}

/// Pagination metadata. `has_next == (current_page < total_pages)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current_page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Envelope for paginated listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Client,
    Expert,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    #[serde(default)]
    pub suspended: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload of successful login/register responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Payload of a successful token refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPayload {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// ---------------------------------------------------------------------------
// Marketplace listings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expert {
    pub id: Uuid,
    pub display_name: String,
    pub headline: String,
    pub location: String,
    pub hourly_rate_cents: i64,
    pub currency: String,
    pub rating: f32,
    pub review_count: u32,
    pub categories: Vec<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub expert_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price_cents: i64,
    pub currency: String,
    pub delivery_days: u32,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub service_count: u64,
}

/// Combined cross-resource search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub experts: Vec<Expert>,
    pub services: Vec<Service>,
}

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub participants: Vec<Uuid>,
    #[serde(default)]
    pub last_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Refunded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub service_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub service_id: Uuid,
    pub payment_method: String,
}

// ---------------------------------------------------------------------------
// Project postings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostingStatus {
    Open,
    Assigned,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Posting {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub budget_cents: Option<i64>,
    pub status: PostingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPosting {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_cents: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingStatusUpdate {
    pub status: PostingStatus,
}

// ---------------------------------------------------------------------------
// Profiles & admin
// ---------------------------------------------------------------------------

/// Partial profile update. Only the fields present in the JSON are applied;
/// omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: u64,
    pub total_experts: u64,
    pub total_services: u64,
    pub open_postings: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_envelope_unwraps() {
        let resp = ApiResponse {
            success: true,
            data: Some(7u32),
            message: None,
        };
        assert_eq!(resp.into_result().unwrap(), 7);
    }

    #[test]
    fn unsuccessful_envelope_data_is_not_trusted() {
        let resp = ApiResponse {
            success: false,
            data: Some(7u32),
            message: Some("nope".to_string()),
        };
        let err = resp.into_result().unwrap_err();
        assert_eq!(err, ApiError::Decode("nope".to_string()));
    }

    #[test]
    fn missing_data_with_success_is_an_error() {
        let resp: ApiResponse<u32> = ApiResponse {
            success: true,
            data: None,
            message: None,
        };
        assert_eq!(
            resp.into_result().unwrap_err(),
            ApiError::Decode(FALLBACK_MESSAGE.to_string())
        );
    }

    #[test]
    fn page_meta_uses_camel_case_on_the_wire() {
        let json = r#"{
            "currentPage": 2, "perPage": 12, "totalItems": 50,
            "totalPages": 5, "hasNext": true, "hasPrev": true
        }"#;
        let meta: PageMeta = serde_json::from_str(json).unwrap();
        assert_eq!(meta.current_page, 2);
        assert_eq!(meta.total_pages, 5);
        assert!(meta.has_next && meta.has_prev);
    }

    #[test]
    fn new_posting_omits_absent_budget() {
        let posting = NewPosting {
            title: "KNX-Integration".to_string(),
            description: "Lichtsteuerung".to_string(),
            category: "smart-home".to_string(),
            budget_cents: None,
        };
        let v = serde_json::to_value(&posting).unwrap();
        assert!(v.get("budgetCents").is_none());
    }

    #[test]
    fn envelope_roundtrips_message_only_failure() {
        let json = r#"{"success":false,"message":"Invalid credentials"}"#;
        let resp: ApiResponse<User> = serde_json::from_str(json).unwrap();
        assert!(!resp.success);
        assert!(resp.data.is_none());
    }

    #[test]
    fn envelope_decodes_with_both_optional_fields_absent() {
        let json = r#"{"success":true}"#;
        let resp: ApiResponse<Expert> = serde_json::from_str(json).unwrap();
        assert!(resp.data.is_none());
        assert!(resp.message.is_none());
    }
}
