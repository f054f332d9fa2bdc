//! Typed endpoint wrappers, one module per backend resource group.
//! These are thin: request shaping and response typing only. Token
//! handling, retries and error normalization live in the client pipeline.

mod admin;
mod auth;
mod system;
mod tenant;
mod waste_management;

pub use admin::{AdminApi, ResetPasswordData, TenantsPage, UsersPage};
pub use auth::AuthApi;
pub use system::SystemApi;
pub use tenant::{BranchesPage, TenantApi, TenantUsersPage};
pub use waste_management::{WasteManagementApi, WasteRecordsPage};
