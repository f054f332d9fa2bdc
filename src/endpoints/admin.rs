//! Platform administration endpoints (super-admin scope).

use std::sync::Arc;

use serde::Deserialize;

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{
    CreateTenantRequest, CreateUserRequest, PageQuery, Pagination, Tenant, UpdateTenantRequest,
    UpdateUserRequest, User,
};

#[derive(Debug, Clone, Deserialize)]
pub struct UsersPage {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenantsPage {
    pub tenants: Vec<Tenant>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordData {
    pub temporary_password: String,
}

#[derive(Debug, Clone, Deserialize)]
struct UserData {
    user: User,
}

#[derive(Debug, Clone, Deserialize)]
struct TenantData {
    tenant: Tenant,
}

#[derive(Clone)]
pub struct AdminApi {
    client: Arc<ApiClient>,
}

impl AdminApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    // ---- Users ------------------------------------------------------------

    pub async fn get_users(&self, query: PageQuery) -> Result<UsersPage> {
        self.client
            .get(&format!("/admin/users{}", query.to_query_string()))
            .await
    }

    pub async fn create_user(&self, req: &CreateUserRequest) -> Result<User> {
        let data: UserData = self.client.post("/admin/users", req).await?;
        Ok(data.user)
    }

    pub async fn update_user(&self, id: &str, req: &UpdateUserRequest) -> Result<User> {
        let data: UserData = self.client.put(&format!("/admin/users/{}", id), req).await?;
        Ok(data.user)
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        self.client.delete(&format!("/admin/users/{}", id)).await
    }

    /// Issues a temporary password; the user must change it on next login.
    pub async fn reset_user_password(&self, id: &str) -> Result<ResetPasswordData> {
        self.client
            .post(
                &format!("/admin/users/{}/reset-password", id),
                &serde_json::json!({}),
            )
            .await
    }

    // ---- Tenants ----------------------------------------------------------

    pub async fn get_tenants(&self, query: PageQuery) -> Result<TenantsPage> {
        self.client
            .get(&format!("/admin/tenants{}", query.to_query_string()))
            .await
    }

    pub async fn get_tenant(&self, id: &str) -> Result<Tenant> {
        let data: TenantData = self.client.get(&format!("/admin/tenants/{}", id)).await?;
        Ok(data.tenant)
    }

    pub async fn create_tenant(&self, req: &CreateTenantRequest) -> Result<Tenant> {
        let data: TenantData = self.client.post("/admin/tenants", req).await?;
        Ok(data.tenant)
    }

    pub async fn update_tenant(&self, id: &str, req: &UpdateTenantRequest) -> Result<Tenant> {
        let data: TenantData = self
            .client
            .put(&format!("/admin/tenants/{}", id), req)
            .await?;
        Ok(data.tenant)
    }

    pub async fn delete_tenant(&self, id: &str) -> Result<()> {
        self.client.delete(&format!("/admin/tenants/{}", id)).await
    }
}
