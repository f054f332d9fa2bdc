//! Test support: an in-process backend implementing the wire contract,
//! with switches for failure injection and counters for observing what
//! the client actually sent.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use wastedesk_client::{ApiClient, ClientConfig, CredentialStore, SessionManager};

pub struct BackendState {
    /// The access token the server currently accepts.
    pub valid_token: Mutex<String>,
    pub refresh_calls: AtomicUsize,
    pub refresh_fails: AtomicBool,
    /// When set, the refresh response rotates the refresh token to "rt2".
    pub rotate_refresh: AtomicBool,
    pub logout_fails: AtomicBool,
    pub slow_status: AtomicBool,
    /// Authorization header of every waste-records request, in arrival order.
    pub record_auth_headers: Mutex<Vec<Option<String>>>,
    /// Authorization header of every login request.
    pub login_auth_headers: Mutex<Vec<Option<String>>>,
    /// Authorization header of every logout request.
    pub logout_auth_headers: Mutex<Vec<Option<String>>>,
}

pub struct MockBackend {
    pub state: Arc<BackendState>,
    pub base_url: String,
}

impl MockBackend {
    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn set_valid_token(&self, token: &str) {
        *self.state.valid_token.lock().unwrap() = token.to_string();
    }

    pub fn fail_refresh(&self) {
        self.state.refresh_fails.store(true, Ordering::SeqCst);
    }

    pub fn rotate_refresh(&self) {
        self.state.rotate_refresh.store(true, Ordering::SeqCst);
    }

    pub fn fail_logout(&self) {
        self.state.logout_fails.store(true, Ordering::SeqCst);
    }

    pub fn slow_status(&self) {
        self.state.slow_status.store(true, Ordering::SeqCst);
    }

    pub fn record_auth_headers(&self) -> Vec<Option<String>> {
        self.state.record_auth_headers.lock().unwrap().clone()
    }

    pub fn login_auth_headers(&self) -> Vec<Option<String>> {
        self.state.login_auth_headers.lock().unwrap().clone()
    }

    pub fn logout_auth_headers(&self) -> Vec<Option<String>> {
        self.state.logout_auth_headers.lock().unwrap().clone()
    }
}

pub fn alice_json() -> Value {
    json!({
        "id": "u1",
        "username": "alice",
        "role": "tenant_admin",
        "tenantId": "t1",
        "isActive": true,
        "mustChangePassword": false
    })
}

pub fn alice() -> wastedesk_client::User {
    serde_json::from_value(alice_json()).unwrap()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": "Authentication required" })),
    )
}

async fn login(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state
        .login_auth_headers
        .lock()
        .unwrap()
        .push(bearer(&headers));

    if body["username"] == "alice" && body["password"] == "secret" {
        *state.valid_token.lock().unwrap() = "tok1".to_string();
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Login successful",
                "data": {
                    "user": alice_json(),
                    "accessToken": "tok1",
                    "refreshToken": "rt1",
                    "expiresIn": 900
                }
            })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid credentials" })),
        )
    }
}

async fn refresh(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let n = state.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;

    // Keep the exchange in flight long enough for every concurrent 401
    // to observe it.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    if state.refresh_fails.load(Ordering::SeqCst) || body["refreshToken"] != "rt1" {
        return unauthorized();
    }

    let token = format!("tok{}", n + 1);
    *state.valid_token.lock().unwrap() = token.clone();

    let data = if state.rotate_refresh.load(Ordering::SeqCst) {
        json!({ "accessToken": token, "refreshToken": "rt2" })
    } else {
        json!({ "accessToken": token })
    };
    (StatusCode::OK, Json(json!({ "success": true, "data": data })))
}

async fn logout(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state
        .logout_auth_headers
        .lock()
        .unwrap()
        .push(bearer(&headers));

    if state.logout_fails.load(Ordering::SeqCst) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "Internal server error" })),
        )
    } else {
        (StatusCode::OK, Json(json!({ "success": true })))
    }
}

async fn me(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let expected = format!("Bearer {}", state.valid_token.lock().unwrap());
    if bearer(&headers).as_deref() == Some(expected.as_str()) {
        (
            StatusCode::OK,
            Json(json!({ "success": true, "data": { "user": alice_json() } })),
        )
    } else {
        unauthorized()
    }
}

async fn waste_records(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let auth = bearer(&headers);
    state.record_auth_headers.lock().unwrap().push(auth.clone());

    let expected = format!("Bearer {}", state.valid_token.lock().unwrap());
    if auth.as_deref() == Some(expected.as_str()) {
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "wasteRecords": [],
                    "pagination": { "current": 1, "pages": 1, "total": 0, "limit": 20 }
                }
            })),
        )
    } else {
        unauthorized()
    }
}

async fn create_user(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let expected = format!("Bearer {}", state.valid_token.lock().unwrap());
    if bearer(&headers).as_deref() != Some(expected.as_str()) {
        return unauthorized();
    }
    if body.get("username").is_none() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "success": false,
                "message": "Validation failed",
                "errors": [{ "field": "username", "message": "required" }]
            })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": { "user": alice_json() } })),
    )
}

async fn status(State(state): State<Arc<BackendState>>) -> (StatusCode, Json<Value>) {
    if state.slow_status.load(Ordering::SeqCst) {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
    }
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": { "status": "ok" } })),
    )
}

/// Bind the mock backend on an ephemeral port and serve it in the
/// background for the lifetime of the test process.
pub async fn spawn_backend() -> MockBackend {
    let state = Arc::new(BackendState {
        valid_token: Mutex::new("tokA".to_string()),
        refresh_calls: AtomicUsize::new(0),
        refresh_fails: AtomicBool::new(false),
        rotate_refresh: AtomicBool::new(false),
        logout_fails: AtomicBool::new(false),
        slow_status: AtomicBool::new(false),
        record_auth_headers: Mutex::new(Vec::new()),
        login_auth_headers: Mutex::new(Vec::new()),
        logout_auth_headers: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/refresh", post(refresh))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/waste-management/waste-records", get(waste_records))
        .route("/api/v1/admin/users", post(create_user))
        .route("/api/v1/system/status", get(status))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        state,
        base_url: format!("http://{}/api/v1", addr),
    }
}

pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        base_url: base_url.to_string(),
        timeout_secs: 2,
        max_credential_age_secs: 3600,
        ..ClientConfig::default()
    }
}

pub fn test_client(backend: &MockBackend) -> (Arc<ApiClient>, Arc<CredentialStore>) {
    let config = test_config(&backend.base_url);
    let store = Arc::new(CredentialStore::from_config(&config));
    let client = ApiClient::new(&config, Arc::clone(&store)).unwrap();
    (client, store)
}

pub fn test_session(backend: &MockBackend) -> (Arc<SessionManager>, Arc<CredentialStore>) {
    let (client, store) = test_client(backend);
    (SessionManager::new(client), store)
}
