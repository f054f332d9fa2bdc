//! Tenant-scoped endpoints (tenant-admin scope).

use std::sync::Arc;

use serde::Deserialize;

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{
    Branch, CreateBranchRequest, PageQuery, Pagination, Tenant, UpdateBranchRequest, User,
};

#[derive(Debug, Clone, Deserialize)]
pub struct BranchesPage {
    pub branches: Vec<Branch>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenantUsersPage {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize)]
struct BranchData {
    branch: Branch,
}

#[derive(Debug, Clone, Deserialize)]
struct TenantData {
    tenant: Tenant,
}

#[derive(Debug, Clone, Deserialize)]
struct UserData {
    user: User,
}

#[derive(Clone)]
pub struct TenantApi {
    client: Arc<ApiClient>,
}

impl TenantApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// The calling user's own tenant record.
    pub async fn get_info(&self) -> Result<Tenant> {
        let data: TenantData = self.client.get("/tenant/info").await?;
        Ok(data.tenant)
    }

    pub async fn get_branches(&self, query: PageQuery) -> Result<BranchesPage> {
        self.client
            .get(&format!("/tenant/branches{}", query.to_query_string()))
            .await
    }

    pub async fn get_branch(&self, id: &str) -> Result<Branch> {
        let data: BranchData = self.client.get(&format!("/tenant/branches/{}", id)).await?;
        Ok(data.branch)
    }

    pub async fn create_branch(&self, req: &CreateBranchRequest) -> Result<Branch> {
        let data: BranchData = self.client.post("/tenant/branches", req).await?;
        Ok(data.branch)
    }

    pub async fn update_branch(&self, id: &str, req: &UpdateBranchRequest) -> Result<Branch> {
        let data: BranchData = self
            .client
            .put(&format!("/tenant/branches/{}", id), req)
            .await?;
        Ok(data.branch)
    }

    pub async fn delete_branch(&self, id: &str) -> Result<()> {
        self.client.delete(&format!("/tenant/branches/{}", id)).await
    }

    pub async fn get_users(&self, query: PageQuery) -> Result<TenantUsersPage> {
        self.client
            .get(&format!("/tenant/users{}", query.to_query_string()))
            .await
    }

    /// Create an admin account bound to one branch of this tenant.
    pub async fn create_branch_admin(
        &self,
        branch_id: &str,
        username: &str,
        password: &str,
    ) -> Result<User> {
        let data: UserData = self
            .client
            .post(
                &format!("/tenant/branches/{}/admins", branch_id),
                &serde_json::json!({ "username": username, "password": password }),
            )
            .await?;
        Ok(data.user)
    }
}
