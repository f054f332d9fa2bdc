//! Credential store
//! Session-scoped persistence of the token pair and user profile with a
//! lazy staleness ceiling. Decode failures read as absent (fail closed);
//! the store never returns an error to its callers.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use chrono::{DateTime, Duration, Utc};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::models::User;

const TOKENS_SLOT: &str = "auth_tokens";
const PROFILE_SLOT: &str = "user_profile";

/// Key/value persistence behind the store.
///
/// Implementations must be safe to share across concurrent request flows;
/// each call is a single indivisible operation.
pub trait StorageBackend: Send + Sync {
    fn read(&self, slot: &str) -> Option<String>;
    fn write(&self, slot: &str, value: &str);
    fn remove(&self, slot: &str);
}

/// Persisted token pair. Both tokens live in one record so a reader can
/// never observe an access token without its matching refresh token.
#[derive(Serialize, Deserialize)]
struct TokenRecord {
    access_token: String,
    refresh_token: String,
    stored_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct ProfileRecord {
    user: User,
    stored_at: DateTime<Utc>,
}

/// Durable (session-scoped) storage of tokens and the user profile.
pub struct CredentialStore {
    backend: Box<dyn StorageBackend>,
    max_age: Duration,
}

impl CredentialStore {
    /// `max_age_secs` is the staleness ceiling: records older than this
    /// are discarded on read regardless of the tokens' own expiry.
    pub fn new(backend: Box<dyn StorageBackend>, max_age_secs: u64) -> Self {
        Self {
            backend,
            max_age: Duration::seconds(max_age_secs as i64),
        }
    }

    /// In-memory store with the default 24-hour ceiling.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()), 24 * 60 * 60)
    }

    /// In-memory store using the configured staleness ceiling.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            Box::new(MemoryBackend::new()),
            config.max_credential_age_secs,
        )
    }

    /// Store both tokens together, stamping the current time.
    pub fn set_tokens(&self, access_token: &str, refresh_token: &str) {
        let record = TokenRecord {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            stored_at: Utc::now(),
        };
        match serde_json::to_string(&record) {
            Ok(json) => self.backend.write(TOKENS_SLOT, &json),
            Err(err) => warn!(error = %err, "failed to serialize token record"),
        }
    }

    pub fn get_access_token(&self) -> Option<Secret<String>> {
        self.token_record().map(|r| Secret::new(r.access_token))
    }

    pub fn get_refresh_token(&self) -> Option<Secret<String>> {
        self.token_record().map(|r| Secret::new(r.refresh_token))
    }

    /// Remove all persisted token and profile state. Idempotent.
    pub fn clear_tokens(&self) {
        self.backend.remove(TOKENS_SLOT);
        self.backend.remove(PROFILE_SLOT);
    }

    pub fn set_user(&self, user: &User) {
        let record = ProfileRecord {
            user: user.clone(),
            stored_at: Utc::now(),
        };
        match serde_json::to_string(&record) {
            Ok(json) => self.backend.write(PROFILE_SLOT, &json),
            Err(err) => warn!(error = %err, "failed to serialize profile record"),
        }
    }

    pub fn get_user(&self) -> Option<User> {
        let raw = self.backend.read(PROFILE_SLOT)?;
        let record: ProfileRecord = match serde_json::from_str(&raw) {
            Ok(r) => r,
            Err(err) => {
                warn!(error = %err, "corrupt profile record, treating as absent");
                self.backend.remove(PROFILE_SLOT);
                return None;
            }
        };
        if self.is_stale(record.stored_at) {
            debug!("stored profile exceeded the credential age ceiling");
            self.clear_tokens();
            return None;
        }
        Some(record.user)
    }

    /// Read and validate the token record. A stale or corrupt record is
    /// purged as a side effect; the staleness ceiling clears the profile
    /// too, never one slot alone.
    fn token_record(&self) -> Option<TokenRecord> {
        let raw = self.backend.read(TOKENS_SLOT)?;
        let record: TokenRecord = match serde_json::from_str(&raw) {
            Ok(r) => r,
            Err(err) => {
                warn!(error = %err, "corrupt token record, treating as absent");
                self.clear_tokens();
                return None;
            }
        };
        if self.is_stale(record.stored_at) {
            debug!("stored credentials exceeded the age ceiling, clearing");
            self.clear_tokens();
            return None;
        }
        Some(record)
    }

    fn is_stale(&self, stored_at: DateTime<Utc>) -> bool {
        Utc::now() - stored_at > self.max_age
    }
}
