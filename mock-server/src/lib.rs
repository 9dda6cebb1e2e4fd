//! In-memory stub of the Werkmarkt backend API.
//!
//! # Design
//! Serves the `{ success, data, message? }` envelope (and the paginated
//! variant) over seeded marketplace fixtures so the client crate's
//! integration tests run against realistic responses. DTOs are defined
//! independently from the client crate; drift between the two shows up as
//! failing integration tests, which is the point.
//!
//! Every request passes a counting middleware; tests read
//! [`AppState::hits`] to assert that caching and coalescing really did
//! suppress network calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub suspended: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
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
    pub featured: bool,
}

#[derive(Debug, Clone, Serialize)]
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
    pub featured: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub service_count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub participants: Vec<Uuid>,
    pub last_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub service_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Posting {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub budget_cents: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    #[allow(dead_code)]
    pub password_confirmation: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub body: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub service_id: Uuid,
    #[allow(dead_code)]
    pub payment_method: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPosting {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub budget_cents: Option<i64>,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

// ---------------------------------------------------------------------------
// State & seed data
// ---------------------------------------------------------------------------

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
struct Db {
    accounts: Vec<Account>,
    experts: Vec<Expert>,
    services: Vec<Service>,
    categories: Vec<Category>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    payments: Vec<Payment>,
    postings: Vec<Posting>,
    access_tokens: HashMap<String, Uuid>,
    refresh_tokens: HashMap<String, Uuid>,
}

pub struct AppState {
    db: tokio::sync::RwLock<Db>,
    /// Total requests served, read by tests as a request-count spy.
    pub hits: AtomicUsize,
}

pub type SharedState = Arc<AppState>;

/// Demo credentials accepted by `POST /api/v1/auth/login`.
pub const DEMO_EMAIL: &str = "anna@example.com";
pub const DEMO_PASSWORD: &str = "wunderbar123";
pub const ADMIN_EMAIL: &str = "admin@werkmarkt.example";
pub const ADMIN_PASSWORD: &str = "verwaltung99";

fn seed() -> Db {
    let now = Utc::now();
    let mut db = Db::default();

    let anna = User {
        id: Uuid::new_v4(),
        email: DEMO_EMAIL.to_string(),
        first_name: "Anna".to_string(),
        last_name: "Schmidt".to_string(),
        role: "client".to_string(),
        suspended: false,
        created_at: now,
    };
    let admin = User {
        id: Uuid::new_v4(),
        email: ADMIN_EMAIL.to_string(),
        first_name: "Jürgen".to_string(),
        last_name: "Vogel".to_string(),
        role: "admin".to_string(),
        suspended: false,
        created_at: now,
    };
    let anna_id = anna.id;
    db.accounts.push(Account {
        user: anna,
        password: DEMO_PASSWORD.to_string(),
    });
    db.accounts.push(Account {
        user: admin,
        password: ADMIN_PASSWORD.to_string(),
    });

    for (slug, name) in [
        ("smart-home", "Smart Home"),
        ("industrie-automation", "Industrie-Automation"),
        ("prozess-digitalisierung", "Prozess-Digitalisierung"),
    ] {
        db.categories.push(Category {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            name: name.to_string(),
            service_count: 0,
        });
    }

    let experts = [
        ("Lukas Brandt", "KNX & Loxone Integrator", "Zürich", 14500, "CHF", 4.9, true),
        ("Miriam Köhler", "SPS-Programmiererin (Siemens S7)", "Stuttgart", 11000, "EUR", 4.7, true),
        ("Tobias Aigner", "Gebäudeleittechnik", "Wien", 9800, "EUR", 4.5, false),
        ("Heike Lorenz", "RPA & Workflow-Automatisierung", "Hamburg", 10500, "EUR", 4.8, false),
    ];
    for (name, headline, location, rate, currency, rating, featured) in experts {
        db.experts.push(Expert {
            id: Uuid::new_v4(),
            display_name: name.to_string(),
            headline: headline.to_string(),
            location: location.to_string(),
            hourly_rate_cents: rate,
            currency: currency.to_string(),
            rating,
            review_count: 12,
            categories: vec!["industrie-automation".to_string()],
            featured,
        });
    }

    // 50 services so pagination tests have 5 pages of 12, 10, ...
    let slugs = ["smart-home", "industrie-automation", "prozess-digitalisierung"];
    for i in 0..50u32 {
        let expert = &db.experts[(i as usize) % db.experts.len()];
        let category = slugs[(i as usize) % slugs.len()];
        db.services.push(Service {
            id: Uuid::new_v4(),
            expert_id: expert.id,
            title: format!("Automatisierungspaket {}", i + 1),
            description: "Beratung, Umsetzung und Abnahme".to_string(),
            category: category.to_string(),
            price_cents: 50_000 + i64::from(i) * 2_500,
            currency: "EUR".to_string(),
            delivery_days: 7 + i % 21,
            featured: i < 4,
        });
    }
    for category in &mut db.categories {
        category.service_count = db
            .services
            .iter()
            .filter(|s| s.category == category.slug)
            .count() as u64;
    }

    let partner = db.experts[0].id;
    let conversation = Conversation {
        id: Uuid::new_v4(),
        participants: vec![anna_id, partner],
        last_message: Some("Passt Donnerstag 14 Uhr?".to_string()),
        updated_at: now,
    };
    db.messages.push(Message {
        id: Uuid::new_v4(),
        conversation_id: conversation.id,
        sender_id: anna_id,
        body: "Hallo, ist der Termin noch frei?".to_string(),
        sent_at: now,
    });
    db.messages.push(Message {
        id: Uuid::new_v4(),
        conversation_id: conversation.id,
        sender_id: partner,
        body: "Passt Donnerstag 14 Uhr?".to_string(),
        sent_at: now,
    });
    db.conversations.push(conversation);

    db.postings.push(Posting {
        id: Uuid::new_v4(),
        author_id: anna_id,
        title: "Lichtsteuerung für Einfamilienhaus".to_string(),
        description: "KNX-Aktoren vorhanden, Programmierung gesucht".to_string(),
        category: "smart-home".to_string(),
        budget_cents: Some(120_000),
        status: "open".to_string(),
        created_at: now,
    });

    db
}

pub fn state() -> SharedState {
    Arc::new(AppState {
        db: tokio::sync::RwLock::new(seed()),
        hits: AtomicUsize::new(0),
    })
}

// ---------------------------------------------------------------------------
// Envelope helpers
// ---------------------------------------------------------------------------

fn ok<T: Serialize>(data: T) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "message": message })),
    )
        .into_response()
}

fn paginated<T: Serialize>(items: &[T], page: u32, per_page: u32) -> Response {
    let total_items = items.len() as u64;
    let total_pages = ((total_items + u64::from(per_page) - 1) / u64::from(per_page)) as u32;
    let start = (page.saturating_sub(1) * per_page) as usize;
    let slice: Vec<&T> = items.iter().skip(start).take(per_page as usize).collect();
    Json(json!({
        "data": slice,
        "meta": {
            "currentPage": page,
            "perPage": per_page,
            "totalItems": total_items,
            "totalPages": total_pages,
            "hasNext": page < total_pages,
            "hasPrev": page > 1,
        }
    }))
    .into_response()
}

fn page_args(params: &HashMap<String, String>) -> (u32, u32) {
    let page = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page = params
        .get("perPage")
        .and_then(|p| p.parse().ok())
        .unwrap_or(20);
    (page.max(1), per_page.clamp(1, 100))
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn authed_user(db: &Db, headers: &HeaderMap) -> Result<User, Response> {
    let token = bearer(headers).ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Not authenticated"))?;
    let user_id = db
        .access_tokens
        .get(&token)
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Not authenticated"))?;
    db.accounts
        .iter()
        .find(|a| a.user.id == *user_id)
        .map(|a| a.user.clone())
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Not authenticated"))
}

fn admin_user(db: &Db, headers: &HeaderMap) -> Result<User, Response> {
    let user = authed_user(db, headers)?;
    if user.role != "admin" {
        return Err(fail(StatusCode::FORBIDDEN, "Admin access required"));
    }
    Ok(user)
}

fn issue_tokens(db: &mut Db, user_id: Uuid) -> (String, String) {
    let access = format!("acc-{}", Uuid::new_v4());
    let refresh = format!("ref-{}", Uuid::new_v4());
    db.access_tokens.insert(access.clone(), user_id);
    db.refresh_tokens.insert(refresh.clone(), user_id);
    (access, refresh)
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn app(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/refresh", post(refresh))
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/experts", get(list_experts))
        .route("/api/v1/experts/featured", get(featured_experts))
        .route("/api/v1/experts/{id}", get(expert_detail))
        .route("/api/v1/services", get(list_services))
        .route("/api/v1/services/featured", get(featured_services))
        .route("/api/v1/services/{id}", get(service_detail))
        .route("/api/v1/categories", get(list_categories))
        .route("/api/v1/categories/{slug}", get(category_detail))
        .route("/api/v1/search", get(search))
        .route("/api/v1/conversations", get(list_conversations))
        .route("/api/v1/conversations/{id}/messages", get(conversation_messages))
        .route("/api/v1/messages", post(send_message))
        .route("/api/v1/payments", get(list_payments))
        .route("/api/v1/payments/checkout", post(checkout))
        .route("/api/v1/payments/{id}", get(payment_detail))
        .route("/api/v1/postings", get(list_postings).post(create_posting))
        .route(
            "/api/v1/postings/{id}",
            get(posting_detail).delete(delete_posting),
        )
        .route("/api/v1/postings/{id}/status", axum::routing::patch(update_posting_status))
        .route("/api/v1/users/me", axum::routing::put(update_profile))
        .route("/api/v1/users/{id}", get(user_profile))
        .route("/api/v1/admin/stats", get(admin_stats))
        .route("/api/v1/admin/users", get(admin_users))
        .route("/api/v1/admin/users/{id}/suspend", post(admin_suspend))
        .layer(middleware::from_fn_with_state(state.clone(), count_hits))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, state()).await
}

/// Serve with caller-owned state so tests can read the hit counter.
pub async fn run_with_state(
    listener: TcpListener,
    state: SharedState,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

async fn count_hits(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    next.run(req).await
}

// ---------------------------------------------------------------------------
// Auth handlers
// ---------------------------------------------------------------------------

async fn login(State(state): State<SharedState>, Json(input): Json<Credentials>) -> Response {
    let mut db = state.db.write().await;
    let account = db
        .accounts
        .iter()
        .find(|a| a.user.email == input.email && a.password == input.password)
        .map(|a| a.user.clone());
    match account {
        Some(user) if !user.suspended => {
            let (access, refresh) = issue_tokens(&mut db, user.id);
            ok(json!({ "user": user, "accessToken": access, "refreshToken": refresh }))
        }
        Some(_) => fail(StatusCode::FORBIDDEN, "Account suspended"),
        None => fail(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn register(State(state): State<SharedState>, Json(input): Json<Registration>) -> Response {
    let mut db = state.db.write().await;
    if db.accounts.iter().any(|a| a.user.email == input.email) {
        return fail(StatusCode::CONFLICT, "Email already registered");
    }
    let user = User {
        id: Uuid::new_v4(),
        email: input.email,
        first_name: input.first_name,
        last_name: input.last_name,
        role: "client".to_string(),
        suspended: false,
        created_at: Utc::now(),
    };
    db.accounts.push(Account {
        user: user.clone(),
        password: input.password,
    });
    let (access, refresh) = issue_tokens(&mut db, user.id);
    ok(json!({ "user": user, "accessToken": access, "refreshToken": refresh }))
}

async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut db = state.db.write().await;
    if let Some(token) = bearer(&headers) {
        db.access_tokens.remove(&token);
    }
    ok(json!({}))
}

async fn refresh(State(state): State<SharedState>, Json(input): Json<RefreshRequest>) -> Response {
    let mut db = state.db.write().await;
    match db.refresh_tokens.get(&input.refresh_token).copied() {
        Some(user_id) => {
            let access = format!("acc-{}", Uuid::new_v4());
            db.access_tokens.insert(access.clone(), user_id);
            ok(json!({ "accessToken": access }))
        }
        None => fail(StatusCode::UNAUTHORIZED, "Invalid refresh token"),
    }
}

async fn me(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let db = state.db.read().await;
    match authed_user(&db, &headers) {
        Ok(user) => ok(user),
        Err(resp) => resp,
    }
}

// ---------------------------------------------------------------------------
// Listing handlers
// ---------------------------------------------------------------------------

async fn list_experts(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let db = state.db.read().await;
    let filtered: Vec<Expert> = db
        .experts
        .iter()
        .filter(|e| match params.get("category") {
            Some(c) => e.categories.iter().any(|ec| ec == c),
            None => true,
        })
        .filter(|e| match params.get("q") {
            Some(q) => {
                let q = q.to_lowercase();
                e.display_name.to_lowercase().contains(&q)
                    || e.headline.to_lowercase().contains(&q)
            }
            None => true,
        })
        .cloned()
        .collect();
    let (page, per_page) = page_args(&params);
    paginated(&filtered, page, per_page)
}

async fn featured_experts(State(state): State<SharedState>) -> Response {
    let db = state.db.read().await;
    let featured: Vec<&Expert> = db.experts.iter().filter(|e| e.featured).collect();
    ok(featured)
}

async fn expert_detail(State(state): State<SharedState>, Path(id): Path<Uuid>) -> Response {
    let db = state.db.read().await;
    match db.experts.iter().find(|e| e.id == id) {
        Some(expert) => ok(expert),
        None => fail(StatusCode::NOT_FOUND, "Expert not found"),
    }
}

async fn list_services(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let db = state.db.read().await;
    let min: Option<i64> = params.get("minPrice").and_then(|p| p.parse().ok());
    let max: Option<i64> = params.get("maxPrice").and_then(|p| p.parse().ok());
    let filtered: Vec<Service> = db
        .services
        .iter()
        .filter(|s| match params.get("category") {
            Some(c) => &s.category == c,
            None => true,
        })
        .filter(|s| match params.get("q") {
            Some(q) => s.title.to_lowercase().contains(&q.to_lowercase()),
            None => true,
        })
        .filter(|s| min.map_or(true, |m| s.price_cents >= m))
        .filter(|s| max.map_or(true, |m| s.price_cents <= m))
        .cloned()
        .collect();
    let (page, per_page) = page_args(&params);
    paginated(&filtered, page, per_page)
}

async fn featured_services(State(state): State<SharedState>) -> Response {
    let db = state.db.read().await;
    let featured: Vec<&Service> = db.services.iter().filter(|s| s.featured).collect();
    ok(featured)
}

async fn service_detail(State(state): State<SharedState>, Path(id): Path<Uuid>) -> Response {
    let db = state.db.read().await;
    match db.services.iter().find(|s| s.id == id) {
        Some(service) => ok(service),
        None => fail(StatusCode::NOT_FOUND, "Service not found"),
    }
}

async fn list_categories(State(state): State<SharedState>) -> Response {
    let db = state.db.read().await;
    ok(&db.categories)
}

async fn category_detail(State(state): State<SharedState>, Path(slug): Path<String>) -> Response {
    let db = state.db.read().await;
    match db.categories.iter().find(|c| c.slug == slug) {
        Some(category) => ok(category),
        None => fail(StatusCode::NOT_FOUND, "Category not found"),
    }
}

async fn search(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let db = state.db.read().await;
    let q = params.get("q").cloned().unwrap_or_default().to_lowercase();
    let experts: Vec<&Expert> = db
        .experts
        .iter()
        .filter(|e| {
            e.display_name.to_lowercase().contains(&q) || e.headline.to_lowercase().contains(&q)
        })
        .collect();
    let services: Vec<&Service> = db
        .services
        .iter()
        .filter(|s| s.title.to_lowercase().contains(&q))
        .collect();
    ok(json!({ "experts": experts, "services": services }))
}

// ---------------------------------------------------------------------------
// Messaging handlers
// ---------------------------------------------------------------------------

async fn list_conversations(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let db = state.db.read().await;
    let user = match authed_user(&db, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let conversations: Vec<&Conversation> = db
        .conversations
        .iter()
        .filter(|c| c.participants.contains(&user.id))
        .collect();
    ok(conversations)
}

async fn conversation_messages(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let db = state.db.read().await;
    let user = match authed_user(&db, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let allowed = db
        .conversations
        .iter()
        .any(|c| c.id == id && c.participants.contains(&user.id));
    if !allowed {
        return fail(StatusCode::NOT_FOUND, "Conversation not found");
    }
    let messages: Vec<&Message> = db
        .messages
        .iter()
        .filter(|m| m.conversation_id == id)
        .collect();
    ok(messages)
}

async fn send_message(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(input): Json<NewMessage>,
) -> Response {
    let mut db = state.db.write().await;
    let user = match authed_user(&db, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let allowed = db
        .conversations
        .iter()
        .any(|c| c.id == input.conversation_id && c.participants.contains(&user.id));
    if !allowed {
        return fail(StatusCode::NOT_FOUND, "Conversation not found");
    }
    let message = Message {
        id: Uuid::new_v4(),
        conversation_id: input.conversation_id,
        sender_id: user.id,
        body: input.body,
        sent_at: Utc::now(),
    };
    db.messages.push(message.clone());
    if let Some(conversation) = db
        .conversations
        .iter_mut()
        .find(|c| c.id == input.conversation_id)
    {
        conversation.last_message = Some(message.body.clone());
        conversation.updated_at = message.sent_at;
    }
    ok(message)
}

// ---------------------------------------------------------------------------
// Payment handlers
// ---------------------------------------------------------------------------

async fn list_payments(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let db = state.db.read().await;
    if let Err(resp) = authed_user(&db, &headers) {
        return resp;
    }
    let (page, per_page) = page_args(&params);
    paginated(&db.payments, page, per_page)
}

async fn payment_detail(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let db = state.db.read().await;
    if let Err(resp) = authed_user(&db, &headers) {
        return resp;
    }
    match db.payments.iter().find(|p| p.id == id) {
        Some(payment) => ok(payment),
        None => fail(StatusCode::NOT_FOUND, "Payment not found"),
    }
}

async fn checkout(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(input): Json<CheckoutRequest>,
) -> Response {
    let mut db = state.db.write().await;
    if let Err(resp) = authed_user(&db, &headers) {
        return resp;
    }
    let service = match db.services.iter().find(|s| s.id == input.service_id) {
        Some(service) => service.clone(),
        None => return fail(StatusCode::UNPROCESSABLE_ENTITY, "Unknown service"),
    };
    let payment = Payment {
        id: Uuid::new_v4(),
        service_id: service.id,
        amount_cents: service.price_cents,
        currency: service.currency,
        status: "completed".to_string(),
        created_at: Utc::now(),
    };
    db.payments.push(payment.clone());
    ok(payment)
}

// ---------------------------------------------------------------------------
// Posting handlers
// ---------------------------------------------------------------------------

async fn list_postings(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let db = state.db.read().await;
    let filtered: Vec<Posting> = db
        .postings
        .iter()
        .filter(|p| match params.get("status") {
            Some(status) => &p.status == status,
            None => true,
        })
        .filter(|p| match params.get("category") {
            Some(c) => &p.category == c,
            None => true,
        })
        .cloned()
        .collect();
    let (page, per_page) = page_args(&params);
    paginated(&filtered, page, per_page)
}

async fn posting_detail(State(state): State<SharedState>, Path(id): Path<Uuid>) -> Response {
    let db = state.db.read().await;
    match db.postings.iter().find(|p| p.id == id) {
        Some(posting) => ok(posting),
        None => fail(StatusCode::NOT_FOUND, "Posting not found"),
    }
}

async fn create_posting(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(input): Json<NewPosting>,
) -> Response {
    let mut db = state.db.write().await;
    let user = match authed_user(&db, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    if input.title.trim().is_empty() {
        return fail(StatusCode::UNPROCESSABLE_ENTITY, "Title is required");
    }
    let posting = Posting {
        id: Uuid::new_v4(),
        author_id: user.id,
        title: input.title,
        description: input.description,
        category: input.category,
        budget_cents: input.budget_cents,
        status: "open".to_string(),
        created_at: Utc::now(),
    };
    db.postings.push(posting.clone());
    ok(posting)
}

async fn delete_posting(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let mut db = state.db.write().await;
    let user = match authed_user(&db, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let before = db.postings.len();
    db.postings
        .retain(|p| !(p.id == id && p.author_id == user.id));
    if db.postings.len() == before {
        return fail(StatusCode::NOT_FOUND, "Posting not found");
    }
    ok(json!({}))
}

async fn update_posting_status(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<StatusUpdate>,
) -> Response {
    let mut db = state.db.write().await;
    let user = match authed_user(&db, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    if !["open", "assigned", "closed"].contains(&input.status.as_str()) {
        return fail(StatusCode::UNPROCESSABLE_ENTITY, "Unknown status");
    }
    match db
        .postings
        .iter_mut()
        .find(|p| p.id == id && p.author_id == user.id)
    {
        Some(posting) => {
            posting.status = input.status;
            ok(posting.clone())
        }
        None => fail(StatusCode::NOT_FOUND, "Posting not found"),
    }
}

// ---------------------------------------------------------------------------
// User & admin handlers
// ---------------------------------------------------------------------------

async fn user_profile(State(state): State<SharedState>, Path(id): Path<Uuid>) -> Response {
    let db = state.db.read().await;
    match db.accounts.iter().find(|a| a.user.id == id) {
        Some(account) => ok(&account.user),
        None => fail(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn update_profile(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(input): Json<ProfileUpdate>,
) -> Response {
    let mut db = state.db.write().await;
    let user = match authed_user(&db, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let account = db
        .accounts
        .iter_mut()
        .find(|a| a.user.id == user.id)
        .expect("authed account exists");
    if let Some(first_name) = input.first_name {
        account.user.first_name = first_name;
    }
    if let Some(last_name) = input.last_name {
        account.user.last_name = last_name;
    }
    if let Some(email) = input.email {
        account.user.email = email;
    }
    ok(&account.user)
}

async fn admin_stats(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let db = state.db.read().await;
    if let Err(resp) = admin_user(&db, &headers) {
        return resp;
    }
    let open_postings = db.postings.iter().filter(|p| p.status == "open").count();
    ok(json!({
        "totalUsers": db.accounts.len(),
        "totalExperts": db.experts.len(),
        "totalServices": db.services.len(),
        "openPostings": open_postings,
    }))
}

async fn admin_users(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let db = state.db.read().await;
    if let Err(resp) = admin_user(&db, &headers) {
        return resp;
    }
    let users: Vec<User> = db
        .accounts
        .iter()
        .map(|a| a.user.clone())
        .filter(|u| match params.get("role") {
            Some(role) => &u.role == role,
            None => true,
        })
        .collect();
    let (page, per_page) = page_args(&params);
    paginated(&users, page, per_page)
}

async fn admin_suspend(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let mut db = state.db.write().await;
    if let Err(resp) = admin_user(&db, &headers) {
        return resp;
    }
    match db.accounts.iter_mut().find(|a| a.user.id == id) {
        Some(account) => {
            account.user.suspended = true;
            ok(&account.user)
        }
        None => fail(StatusCode::NOT_FOUND, "User not found"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn user_serializes_camel_case() {
        let user = User {
            id: Uuid::nil(),
            email: "anna@example.com".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Schmidt".to_string(),
            role: "client".to_string(),
            suspended: false,
            created_at: Utc::now(),
        };
        let v = serde_json::to_value(&user).unwrap();
        assert_eq!(v["firstName"], "Anna");
        assert!(v.get("first_name").is_none());
    }

    #[test]
    fn seed_has_five_pages_of_twelve_services() {
        let db = seed();
        assert_eq!(db.services.len(), 50);
        assert!(db.accounts.iter().any(|a| a.user.email == DEMO_EMAIL));
    }

    #[tokio::test]
    async fn paginated_meta_is_consistent() {
        let items: Vec<u32> = (0..50).collect();
        let resp = paginated(&items, 2, 12);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let v: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["data"].as_array().unwrap().len(), 12);
        assert_eq!(v["data"][0], 12);
        assert_eq!(v["meta"]["totalPages"], 5);
        assert_eq!(v["meta"]["hasNext"], true);
        assert_eq!(v["meta"]["hasPrev"], true);
    }
}
