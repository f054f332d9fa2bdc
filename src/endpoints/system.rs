//! System probes.

use std::sync::Arc;

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::HealthStatus;

#[derive(Clone)]
pub struct SystemApi {
    client: Arc<ApiClient>,
}

impl SystemApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn get_health(&self) -> Result<HealthStatus> {
        self.client.get("/system/health").await
    }

    pub async fn get_status(&self) -> Result<HealthStatus> {
        self.client.get("/system/status").await
    }
}
