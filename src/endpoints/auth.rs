//! Authentication endpoints.
//! Login is exempt from bearer auth; the refresh exchange itself lives in
//! the refresh coordinator, not here, so it can never recurse.

use std::sync::Arc;

use serde_json::json;

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{LoginData, MeData, User};

#[derive(Clone)]
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginData> {
        self.client
            .post_exempt(
                "/auth/login",
                &json!({ "username": username, "password": password }),
            )
            .await
    }

    /// Invalidate the refresh token server-side. Fire-and-forget from the
    /// session's perspective; callers treat failure as non-fatal. Goes out
    /// exempt: the token to revoke is in the body, and a 401 here must not
    /// spend a refresh cycle on a session that is being torn down.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        self.client
            .post_no_content_exempt("/auth/logout", &json!({ "refreshToken": refresh_token }))
            .await
    }

    pub async fn me(&self) -> Result<User> {
        let data: MeData = self.client.get("/auth/me").await?;
        Ok(data.user)
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<()> {
        self.client
            .post_no_content(
                "/auth/change-password",
                &json!({
                    "currentPassword": current_password,
                    "newPassword": new_password,
                }),
            )
            .await
    }

    pub async fn change_credentials(
        &self,
        current_password: &str,
        new_username: &str,
        new_password: &str,
    ) -> Result<User> {
        let data: MeData = self
            .client
            .post(
                "/auth/change-credentials",
                &json!({
                    "currentPassword": current_password,
                    "newUsername": new_username,
                    "newPassword": new_password,
                }),
            )
            .await?;
        Ok(data.user)
    }
}
