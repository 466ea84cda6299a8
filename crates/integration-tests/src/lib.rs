//! End-to-end tests for the Bazaar client.
//!
//! [`MockBackend`] serves canned JSON responses from an axum server bound to
//! an ephemeral localhost port and records every request it receives, so
//! tests can assert both on what the client returns and on how many
//! requests actually reached the network.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use bazaar_client::api::LoginRequest;
use bazaar_client::{Bazaar, ClientConfig, MemoryStorage, RecordingNavigator};
use bazaar_core::{Email, UserProfile};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// A request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl Recorded {
    /// The request body parsed as JSON, or `Null`.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    body: Value,
    delay: Option<Duration>,
}

#[derive(Default)]
struct MockState {
    routes: Mutex<HashMap<(Method, String), Canned>>,
    requests: Mutex<Vec<Recorded>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Canned-response HTTP backend for one test.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Bind to `127.0.0.1:0` and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");
        let app = Router::new().fallback(respond).with_state(Arc::clone(&state));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL to configure the client with.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Answer `method path` with `200` and `body`.
    pub fn ok(&self, method: Method, path: &str, body: Value) {
        self.respond(method, path, StatusCode::OK, body);
    }

    /// Answer `method path` with `status` and `body`.
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        lock(&self.state.routes).insert(
            (method, path.to_string()),
            Canned {
                status,
                body,
                delay: None,
            },
        );
    }

    /// Hold the response to `method path` back for `delay`.
    pub fn delay(&self, method: Method, path: &str, delay: Duration) {
        if let Some(canned) = lock(&self.state.routes).get_mut(&(method, path.to_string())) {
            canned.delay = Some(delay);
        }
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        lock(&self.state.requests).clone()
    }

    /// Number of requests received for `method path`.
    #[must_use]
    pub fn hits(&self, method: &Method, path: &str) -> usize {
        lock(&self.state.requests)
            .iter()
            .filter(|r| &r.method == method && r.path == path)
            .count()
    }

    /// The most recent request for `method path`.
    #[must_use]
    pub fn last(&self, method: &Method, path: &str) -> Option<Recorded> {
        lock(&self.state.requests)
            .iter()
            .rev()
            .find(|r| &r.method == method && r.path == path)
            .cloned()
    }

    /// A client pointed at this backend with in-memory storage.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client(&self) -> TestClient {
        self.client_with(|_| {})
    }

    /// Like [`MockBackend::client`], with `tune` applied to the configuration
    /// first.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn client_with(&self, tune: impl FnOnce(&mut ClientConfig)) -> TestClient {
        let navigator = Arc::new(RecordingNavigator::new());
        let mut config = ClientConfig::new(&self.url()).expect("Mock URL is valid");
        tune(&mut config);
        let bazaar = Bazaar::new(config, Arc::new(MemoryStorage::new()), navigator.clone())
            .expect("Failed to build client");
        TestClient { bazaar, navigator }
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A client together with the navigator it reports to.
pub struct TestClient {
    pub bazaar: Bazaar,
    pub navigator: Arc<RecordingNavigator>,
}

impl TestClient {
    /// Sign in as `email`. The backend must answer `POST /auth/login`.
    ///
    /// # Panics
    ///
    /// Panics if the email is invalid or the login fails.
    #[allow(clippy::expect_used)]
    pub async fn login(&self, email: &str) -> UserProfile {
        let email = Email::parse(email).expect("Test email is valid");
        self.bazaar
            .auth()
            .login(&LoginRequest::new(email, "password"))
            .await
            .expect("Login failed")
    }
}

async fn respond(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    lock(&state.requests).push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: header(&headers, AUTHORIZATION),
        content_type: header(&headers, CONTENT_TYPE),
        body,
    });

    let canned = lock(&state.routes).get(&(method, path)).cloned();
    match canned {
        Some(canned) => {
            if let Some(delay) = canned.delay {
                tokio::time::sleep(delay).await;
            }
            (canned.status, Json(canned.body)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No such route" })),
        )
            .into_response(),
    }
}

fn header(headers: &HeaderMap, name: axum::http::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// =============================================================================
// Fixtures
// =============================================================================

/// A product body in the backend's snake_case spelling.
#[must_use]
pub fn product_json(id: &str, name: &str, price: f64, active: bool) -> Value {
    json!({
        "id": id,
        "user_id": "u1",
        "name": name,
        "description": format!("{name} description"),
        "price": price,
        "is_active": active,
        "images": [],
    })
}

/// A store body.
#[must_use]
pub fn store_json(id: &str, name: &str, slug: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": slug,
        "username": slug,
        "bio": "",
        "whatsapp_number": "+2348012345678",
        "email": format!("{slug}@example.com"),
    })
}

/// A vendor body as listed in the admin queues.
#[must_use]
pub fn vendor_json(id: &str, name: &str, active: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": format!("{id}@example.com"),
        "whatsapp_number": "0801",
        "username": id,
        "bio": "",
        "store_name": format!("{name} Store"),
        "store_slug": id,
        "role": "vendor",
        "is_active": active,
    })
}

/// A successful login response for user `id` with `role`.
#[must_use]
pub fn auth_json(id: &str, name: &str, role: &str) -> Value {
    json!({
        "token": format!("token-{id}"),
        "user": {
            "id": id,
            "name": name,
            "email": format!("{id}@example.com"),
            "role": role,
        }
    })
}
