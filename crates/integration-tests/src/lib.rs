//! Integration tests for PokeStore.
//!
//! The tests drive the real storefront and admin crates against
//! [`MockApi`], an in-process `axum` stand-in for the remote PokeStore API
//! listening on an ephemeral port. No external services are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pokestore-integration-tests
//! ```
//!
//! # Mocked endpoints
//!
//! - `POST /auth/login` - issues `{"access_token": ...}` or 401
//! - `POST /auth/register` - 201, 400 with validation messages, or 409
//! - `GET /v2/pokemones` - the product listing
//! - `POST /v2/pokemones/seed` - admin only, loads [`seed_products`]
//! - `PATCH /v2/pokemones/{id}` / `DELETE /v2/pokemones/{id}` - admin only

#![cfg_attr(not(test), forbid(unsafe_code))]
// Fixture code: a broken harness should fail the test loudly.
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use pokestore_storefront::storage::{MemoryStorage, Storage};
use pokestore_storefront::{Storefront, StorefrontConfig};

/// Message the mock answers a bad login with.
pub const BAD_CREDENTIALS: &str = "Credenciales inválidas";

/// Message the mock answers a duplicate registration with.
pub const EMAIL_TAKEN: &str = "El correo ya está registrado";

/// Validation message for a short registration password.
pub const PASSWORD_TOO_SHORT: &str = "password must be longer than or equal to 6 characters";

/// The administrator account every mock starts with.
pub const ADMIN_EMAIL: &str = "oak@pallet.town";
pub const ADMIN_PASSWORD: &str = "profesor";

// ============================================================================
// Mock state
// ============================================================================

#[derive(Debug, Clone)]
struct MockUser {
    id: i64,
    name: String,
    email: String,
    password: String,
    role: &'static str,
}

/// One request as the mock received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Debug, Default)]
struct MockState {
    users: Vec<MockUser>,
    products: Vec<Value>,
    tokens: HashMap<String, i64>,
    requests: Vec<RecordedRequest>,
    listing_delay: Duration,
    token_lifetime_secs: i64,
    issued: u64,
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// The product set `POST /v2/pokemones/seed` loads.
///
/// Charmander comes without image or description to exercise the client
/// fallbacks.
#[must_use]
pub fn seed_products() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "nombre": "Bulbasaur",
            "tipo": "Planta",
            "imagenUrl": "https://img.pokestore.test/1.png",
            "precio": 45000,
            "descripcion": "Lleva una semilla en el lomo."
        }),
        json!({
            "id": 4,
            "nombre": "Charmander",
            "tipo": "Fuego",
            "imagenUrl": null,
            "precio": 52000,
            "descripcion": ""
        }),
        json!({
            "id": 25,
            "nombre": "Pikachu",
            "tipo": "Eléctrico",
            "imagenUrl": "https://img.pokestore.test/25.png",
            "precio": 99990,
            "descripcion": "Almacena electricidad en las mejillas."
        }),
    ]
}

// ============================================================================
// Server
// ============================================================================

/// An in-process stand-in for the remote PokeStore API.
///
/// The server task is aborted when the mock is dropped.
pub struct MockApi {
    base_url: Url,
    state: Shared,
    server: JoinHandle<()>,
}

impl MockApi {
    /// Start the mock on an ephemeral port, with the admin account
    /// registered and the catalog already seeded.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState {
            users: vec![MockUser {
                id: 1,
                name: "Profesor Oak".to_string(),
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
                role: "admin",
            }],
            products: seed_products(),
            token_lifetime_secs: 3600,
            ..MockState::default()
        }));

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/v2/pokemones", get(list_products))
            .route("/v2/pokemones/seed", post(seed))
            .route("/v2/pokemones/{id}", patch(update_product).delete(delete_product))
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock API listener");
        let addr = listener.local_addr().expect("mock API address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock API server");
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}")).expect("mock API URL"),
            state,
            server,
        }
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Storefront configuration pointing at this mock.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        let mut config = StorefrontConfig::with_api_url(self.base_url.clone());
        config.http_timeout = Duration::from_secs(5);
        config
    }

    /// A storefront over fresh in-memory storage.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        self.storefront_with(Arc::new(MemoryStorage::new()))
    }

    /// A storefront over `storage`.
    #[must_use]
    pub fn storefront_with(&self, storage: Arc<dyn Storage>) -> Storefront {
        Storefront::with_storage(self.config(), storage).expect("build storefront")
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// How many `GET` requests hit `path`.
    #[must_use]
    pub fn hits(&self, path: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.method == "GET" && r.path == path)
            .count()
    }

    /// Delay every listing response by `delay`.
    pub fn delay_listing(&self, delay: Duration) {
        lock(&self.state).listing_delay = delay;
    }

    /// Issue tokens that expire `secs` seconds after login; negative values
    /// issue tokens that are already expired.
    pub fn set_token_lifetime(&self, secs: i64) {
        lock(&self.state).token_lifetime_secs = secs;
    }

    /// Replace the backend product listing.
    pub fn set_products(&self, products: Vec<Value>) {
        lock(&self.state).products = products;
    }

    /// The backend product listing as stored.
    #[must_use]
    pub fn products(&self) -> Vec<Value> {
        lock(&self.state).products.clone()
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Build a bearer token carrying `claims`, in the shape the API issues.
#[must_use]
pub fn token_for(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.mock-signature")
}

// ============================================================================
// Handlers
// ============================================================================

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        authorization: request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
    };
    lock(&state).requests.push(recorded);
    next.run(request).await
}

fn error(status: StatusCode, message: impl Into<Value>) -> Response {
    (status, Json(json!({ "message": message.into(), "statusCode": status.as_u16() })))
        .into_response()
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    let mut state = lock(&state);
    let Some(user) = state
        .users
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(&body.email) && u.password == body.password)
        .cloned()
    else {
        return error(StatusCode::UNAUTHORIZED, BAD_CREDENTIALS);
    };

    state.issued += 1;
    let exp = chrono::Utc::now().timestamp() + state.token_lifetime_secs;
    let token = token_for(&json!({
        "sub": user.id,
        "email": user.email,
        "name": user.name,
        "role": user.role,
        "iat": state.issued,
        "exp": exp,
    }));
    state.tokens.insert(token.clone(), user.id);

    Json(json!({ "access_token": token })).into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<RegisterBody>) -> Response {
    if body.password.chars().count() < 6 {
        return error(StatusCode::BAD_REQUEST, json!([PASSWORD_TOO_SHORT]));
    }

    let mut state = lock(&state);
    if state
        .users
        .iter()
        .any(|u| u.email.eq_ignore_ascii_case(&body.email))
    {
        return error(StatusCode::CONFLICT, EMAIL_TAKEN);
    }

    let id = state.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
    state.users.push(MockUser {
        id,
        name: body.name.clone(),
        email: body.email.clone(),
        password: body.password,
        role: "user",
    });

    (
        StatusCode::CREATED,
        Json(json!({ "id": id, "name": body.name, "email": body.email })),
    )
        .into_response()
}

async fn list_products(State(state): State<Shared>) -> Response {
    let delay = lock(&state).listing_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    Json(Value::Array(lock(&state).products.clone())).into_response()
}

/// Resolve the bearer token to an admin, or the error response to send.
fn require_admin(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let user_id = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| state.tokens.get(token))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Unauthorized"))?;

    match state.users.iter().find(|u| u.id == *user_id) {
        Some(user) if user.role == "admin" => Ok(()),
        _ => Err(error(StatusCode::FORBIDDEN, "Forbidden resource")),
    }
}

async fn seed(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    state.products = seed_products();
    (StatusCode::CREATED, Json(json!({ "message": "Seed executed" }))).into_response()
}

async fn update_product(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(changes): Json<Map<String, Value>>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }

    let Some(product) = state
        .products
        .iter_mut()
        .find(|p| p.get("id").and_then(Value::as_i64) == Some(id))
    else {
        return error(StatusCode::NOT_FOUND, format!("Pokémon #{id} no encontrado"));
    };

    if let Some(fields) = product.as_object_mut() {
        fields.extend(changes);
    }
    Json(product.clone()).into_response()
}

async fn delete_product(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }

    let before = state.products.len();
    state
        .products
        .retain(|p| p.get("id").and_then(Value::as_i64) != Some(id));
    if state.products.len() == before {
        return error(StatusCode::NOT_FOUND, format!("Pokémon #{id} no encontrado"));
    }
    StatusCode::NO_CONTENT.into_response()
}
