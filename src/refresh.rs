//! Refresh coordination
//! At most one refresh-token exchange is in flight per client. Concurrent
//! callers that hit an expired access token all await the same pending
//! exchange and receive the same new token (or the same failure), so the
//! single-use refresh token is never spent twice.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ApiError, Result};
use crate::models::{ApiEnvelope, RefreshData};
use crate::storage::CredentialStore;

type SharedExchange = Shared<BoxFuture<'static, Result<String>>>;

pub struct RefreshCoordinator {
    http: Client,
    refresh_url: Url,
    store: Arc<CredentialStore>,
    /// The in-progress exchange, tagged with a generation so a settled
    /// handle is only cleared by its own waiters and never clobbers a
    /// newer exchange started in the meantime.
    inflight: Mutex<Option<(u64, SharedExchange)>>,
    generation: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(http: Client, refresh_url: Url, store: Arc<CredentialStore>) -> Self {
        Self {
            http,
            refresh_url,
            store,
            inflight: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Obtain a fresh access token, joining the in-flight exchange if one
    /// exists. On failure the credentials have already been cleared.
    pub async fn refresh(&self) -> Result<String> {
        let (generation_id, pending) = {
            let mut guard = self.inflight.lock().unwrap();
            if let Some((generation_id, fut)) = guard.as_ref() {
                debug!("joining in-flight token refresh");
                (*generation_id, fut.clone())
            } else {
                let generation_id = self.generation.fetch_add(1, Ordering::Relaxed);
                let fut = exchange(
                    self.http.clone(),
                    self.refresh_url.clone(),
                    Arc::clone(&self.store),
                )
                .boxed()
                .shared();
                *guard = Some((generation_id, fut.clone()));
                (generation_id, fut)
            }
        };

        let result = pending.await;

        // Clear the settled handle so the next 401 starts a new exchange.
        let mut guard = self.inflight.lock().unwrap();
        if matches!(guard.as_ref(), Some((g, _)) if *g == generation_id) {
            *guard = None;
        }
        result
    }
}

/// Perform one refresh-token exchange. Runs outside the normal request
/// pipeline so a 401 here can never recurse into another refresh. Every
/// failure path clears the stored credentials.
async fn exchange(http: Client, refresh_url: Url, store: Arc<CredentialStore>) -> Result<String> {
    let refresh_token = match store.get_refresh_token() {
        Some(token) => token,
        None => {
            debug!("no refresh token available");
            store.clear_tokens();
            return Err(ApiError::SessionExpired);
        }
    };

    let result = perform(
        &http,
        refresh_url,
        refresh_token.expose_secret().to_string(),
        &store,
    )
    .await;

    if let Err(err) = &result {
        warn!(error = %err, "token refresh failed, clearing credentials");
        store.clear_tokens();
        return Err(ApiError::SessionExpired);
    }
    result
}

async fn perform(
    http: &Client,
    refresh_url: Url,
    refresh_token: String,
    store: &CredentialStore,
) -> Result<String> {
    let response = http
        .post(refresh_url)
        .json(&json!({ "refreshToken": refresh_token }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::from_status(status.as_u16(), None, vec![]));
    }

    let envelope: ApiEnvelope<RefreshData> = response
        .json()
        .await
        .map_err(|e| ApiError::Internal(format!("malformed refresh response: {}", e)))?;
    let data = crate::models::into_data(envelope)?;

    // The refresh token is reused as-is unless the server rotated it.
    let next_refresh = data.refresh_token.unwrap_or(refresh_token);
    store.set_tokens(&data.access_token, &next_refresh);
    info!("access token refreshed");

    Ok(data.access_token)
}
