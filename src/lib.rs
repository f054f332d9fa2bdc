//! Client SDK for the wastedesk waste-management backend.
//!
//! The core is the authenticated session pipeline: a credential store
//! with a staleness ceiling, an HTTP client that attaches bearer tokens
//! and correlation ids to every request, a refresh coordinator that
//! guarantees at most one refresh-token exchange in flight, and a
//! session manager that owns the "who is logged in" state. Endpoint
//! modules are thin typed wrappers on top.
//!
//! ```no_run
//! use std::sync::Arc;
//! use wastedesk_client::{
//!     ApiClient, ClientConfig, CredentialStore, SessionManager,
//! };
//!
//! # async fn run() -> wastedesk_client::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let store = Arc::new(CredentialStore::from_config(&config));
//! let client = ApiClient::new(&config, store)?;
//! let session = SessionManager::new(Arc::clone(&client));
//!
//! session.initialize().await;
//! session.login("alice", "password").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod refresh;
pub mod session;
pub mod storage;
pub mod telemetry;

pub use client::ApiClient;
pub use config::{ClientConfig, LoggingConfig};
pub use endpoints::{AdminApi, AuthApi, SystemApi, TenantApi, WasteManagementApi};
pub use error::{ApiError, FieldError, Result};
pub use models::{Role, User};
pub use session::{SessionManager, SessionSnapshot};
pub use storage::{CredentialStore, FileBackend, MemoryBackend, StorageBackend};
pub use telemetry::init_telemetry;
