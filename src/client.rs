//! HTTP client and interceptor pipeline
//! One configured sender for the whole SDK. Outgoing requests get a
//! bearer token, a correlation id and a timestamp attached; responses go
//! through 401 detection with a single transparent refresh-and-retry.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::models::{into_data, ApiEnvelope};
use crate::refresh::RefreshCoordinator;
use crate::storage::CredentialStore;

/// Paths this client is willing to call. A defensive measure against
/// requests escaping to unintended origins, not a security boundary.
static ALLOWED_PATHS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^/auth/.+$").unwrap(),
        Regex::new(r"^/admin/.+$").unwrap(),
        Regex::new(r"^/tenant/.+$").unwrap(),
        Regex::new(r"^/waste-management/.+$").unwrap(),
        Regex::new(r"^/system/(health|status)$").unwrap(),
    ]
});

type ExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// Configured API client shared by every endpoint module.
///
/// Constructed explicitly and passed around; there is no global instance.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    store: Arc<CredentialStore>,
    refresh: RefreshCoordinator,
    expired_hook: RwLock<Option<ExpiredHook>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, store: Arc<CredentialStore>) -> Result<Arc<Self>> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL: {}", e)))?;
        // Url::join treats the last segment as a file unless the base path
        // ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {}", e)))?;

        let refresh_url = base_url
            .join("auth/refresh")
            .map_err(|e| ApiError::Config(format!("invalid refresh URL: {}", e)))?;
        let refresh = RefreshCoordinator::new(http.clone(), refresh_url, Arc::clone(&store));

        Ok(Arc::new(Self {
            http,
            base_url,
            store,
            refresh,
            expired_hook: RwLock::new(None),
        }))
    }

    pub fn credential_store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Register the callback fired on terminal authentication failure,
    /// after credentials have been cleared. The hosting application (via
    /// the session manager) decides what navigation, if any, follows.
    pub fn on_session_expired(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.expired_hook.write().unwrap() = Some(Arc::new(hook));
    }

    // ---- Typed verbs ------------------------------------------------------

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let env = self.execute(Method::GET, path, None, false).await?;
        into_data(env)
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let env = self
            .execute(Method::POST, path, Some(to_value(body)?), false)
            .await?;
        into_data(env)
    }

    /// POST without a bearer token; never enters the refresh flow. Used
    /// for login and other calls that must not carry credentials.
    pub async fn post_exempt<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let env = self
            .execute(Method::POST, path, Some(to_value(body)?), true)
            .await?;
        into_data(env)
    }

    /// POST for endpoints whose envelope carries no data payload.
    pub async fn post_no_content<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        self.post_unit(path, body, false).await
    }

    /// POST with neither a bearer token nor a data payload. Used for
    /// logout, where the refresh token travels in the body and a refresh
    /// cycle during teardown would be pointless.
    pub async fn post_no_content_exempt<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        self.post_unit(path, body, true).await
    }

    async fn post_unit<B: Serialize>(&self, path: &str, body: &B, exempt: bool) -> Result<()> {
        let env: ApiEnvelope<serde_json::Value> = self
            .execute(Method::POST, path, Some(to_value(body)?), exempt)
            .await?;
        if !env.success {
            return Err(ApiError::BadRequest(
                env.message
                    .unwrap_or_else(|| "request rejected by server".to_string()),
            ));
        }
        Ok(())
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let env = self
            .execute(Method::PUT, path, Some(to_value(body)?), false)
            .await?;
        into_data(env)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let env: ApiEnvelope<serde_json::Value> =
            self.execute(Method::DELETE, path, None, false).await?;
        if !env.success {
            return Err(ApiError::BadRequest(
                env.message
                    .unwrap_or_else(|| "request rejected by server".to_string()),
            ));
        }
        Ok(())
    }

    // ---- Pipeline ---------------------------------------------------------

    /// Send a request through the interceptor pipeline.
    ///
    /// A 401 on a non-exempt request triggers exactly one refresh-and-retry;
    /// the caller never sees the first failure. A second 401, or a refresh
    /// failure, is terminal: credentials are cleared and the session-expired
    /// hook fires.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        exempt: bool,
    ) -> Result<ApiEnvelope<T>> {
        validate_path(path)?;
        let url = self.endpoint_url(path)?;

        let first = self
            .send_once(&method, &url, body.as_ref(), exempt, None)
            .await;

        match first {
            Err(ApiError::Unauthorized) if !exempt => {
                debug!(%path, "access token rejected, attempting refresh");
                let token = match self.refresh.refresh().await {
                    Ok(token) => token,
                    Err(_) => {
                        self.terminal_auth_failure();
                        return Err(ApiError::SessionExpired);
                    }
                };
                match self
                    .send_once(&method, &url, body.as_ref(), exempt, Some(&token))
                    .await
                {
                    // Already retried once; a second rejection is terminal.
                    Err(err) if err.is_auth_failure() => {
                        self.terminal_auth_failure();
                        Err(ApiError::SessionExpired)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&serde_json::Value>,
        exempt: bool,
        override_token: Option<&str>,
    ) -> Result<ApiEnvelope<T>> {
        let request_id = Uuid::new_v4();
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header("x-request-id", request_id.to_string())
            .header(
                "x-request-timestamp",
                chrono::Utc::now().timestamp_millis().to_string(),
            );

        if !exempt {
            let token: Option<Secret<String>> = match override_token {
                Some(t) => Some(Secret::new(t.to_string())),
                None => self.store.get_access_token(),
            };
            if let Some(token) = token {
                request = request.bearer_auth(token.expose_secret());
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, %url, %request_id, "sending request");
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ApiError::Internal(format!("malformed response body: {}", e)));
        }

        // Pull message and field errors out of the error envelope when the
        // body parses; classification works without it.
        let (message, errors) = match response.json::<ApiEnvelope<serde_json::Value>>().await {
            Ok(env) => (env.message, env.errors.unwrap_or_default()),
            Err(_) => (None, vec![]),
        };
        let err = ApiError::from_status(status.as_u16(), message, errors);
        debug!(%url, status = status.as_u16(), %request_id, error = %err, "request failed");
        Err(err)
    }

    fn endpoint_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::BadRequest(format!("invalid request path: {}", e)))
    }

    fn terminal_auth_failure(&self) {
        warn!("terminal authentication failure, clearing credentials");
        self.store.clear_tokens();
        let hook = self.expired_hook.read().unwrap().clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

/// Reject paths outside the expected API surface before anything is sent.
fn validate_path(path: &str) -> Result<()> {
    let path_only = path.split('?').next().unwrap_or(path);
    if ALLOWED_PATHS.iter().any(|re| re.is_match(path_only)) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "request path not allowed: {}",
            path_only
        )))
    }
}

fn to_value<B: Serialize>(body: &B) -> Result<serde_json::Value> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::Internal(format!("failed to serialize request body: {}", e)))
}
