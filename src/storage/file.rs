//! File-backed credential storage with a best-effort tamper seal.
//!
//! Each slot is stored base64-encoded alongside a sha-256 seal computed
//! over a per-store random key plus the payload. The key lives in a
//! sibling file, so this is tamper-evidence against casual edits of the
//! persistence medium, not confidentiality against an attacker who can
//! read both files; the real trust boundary is the server. A seal
//! mismatch reads as absent and purges the slot. Any I/O failure degrades
//! to "absent" rather than an error.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use super::StorageBackend;

#[derive(Serialize, Deserialize)]
struct SealedEntry {
    payload: String,
    seal: String,
}

pub struct FileBackend {
    path: PathBuf,
    key: [u8; 32],
    // Serializes read-modify-write cycles on the backing file.
    io_lock: Mutex<()>,
}

impl FileBackend {
    /// Open (or create) a store at `path`. The seal key is kept in a
    /// sibling `<path>.key` file and created on first use.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let key = load_or_create_key(&path);
        Self {
            path,
            key,
            io_lock: Mutex::new(()),
        }
    }

    fn seal(&self, slot: &str, payload: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.key);
        hasher.update(slot.as_bytes());
        hasher.update(payload);
        hex::encode(hasher.finalize())
    }

    fn load_entries(&self) -> HashMap<String, SealedEntry> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(error = %err, "credential file unreadable, starting empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        }
    }

    fn store_entries(&self, entries: &HashMap<String, SealedEntry>) {
        let json = match serde_json::to_string(entries) {
            Ok(j) => j,
            Err(err) => {
                warn!(error = %err, "failed to serialize credential file");
                return;
            }
        };
        // Write-then-rename so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("tmp");
        if let Err(err) = fs::write(&tmp, json).and_then(|_| fs::rename(&tmp, &self.path)) {
            warn!(error = %err, path = %self.path.display(), "failed to persist credentials");
        }
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, slot: &str) -> Option<String> {
        let _guard = self.io_lock.lock().unwrap();
        let mut entries = self.load_entries();
        let entry = entries.get(slot)?;

        let payload = match BASE64.decode(&entry.payload) {
            Ok(p) => p,
            Err(_) => {
                warn!(slot, "credential slot is not valid base64, purging");
                entries.remove(slot);
                self.store_entries(&entries);
                return None;
            }
        };
        if entry.seal != self.seal(slot, &payload) {
            warn!(slot, "credential slot failed seal verification, purging");
            entries.remove(slot);
            self.store_entries(&entries);
            return None;
        }
        match String::from_utf8(payload) {
            Ok(s) => Some(s),
            Err(_) => {
                entries.remove(slot);
                self.store_entries(&entries);
                None
            }
        }
    }

    fn write(&self, slot: &str, value: &str) {
        let _guard = self.io_lock.lock().unwrap();
        let mut entries = self.load_entries();
        entries.insert(
            slot.to_string(),
            SealedEntry {
                payload: BASE64.encode(value.as_bytes()),
                seal: self.seal(slot, value.as_bytes()),
            },
        );
        self.store_entries(&entries);
    }

    fn remove(&self, slot: &str) {
        let _guard = self.io_lock.lock().unwrap();
        let mut entries = self.load_entries();
        if entries.remove(slot).is_some() {
            self.store_entries(&entries);
        }
    }
}

fn key_path(path: &Path) -> PathBuf {
    let mut p = path.as_os_str().to_owned();
    p.push(".key");
    PathBuf::from(p)
}

fn load_or_create_key(path: &Path) -> [u8; 32] {
    let key_file = key_path(path);
    if let Ok(raw) = fs::read_to_string(&key_file) {
        if let Ok(bytes) = hex::decode(raw.trim()) {
            if bytes.len() == 32 {
                let mut key = [0u8; 32];
                key.copy_from_slice(&bytes);
                return key;
            }
        }
        warn!(path = %key_file.display(), "seal key file corrupt, regenerating");
    }

    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    if let Err(err) = fs::write(&key_file, hex::encode(key)) {
        warn!(error = %err, "failed to persist seal key, store will reset next run");
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path().join("creds.json"));
        backend.write("auth_tokens", "payload");
        assert_eq!(backend.read("auth_tokens").as_deref(), Some("payload"));
        backend.remove("auth_tokens");
        assert!(backend.read("auth_tokens").is_none());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        FileBackend::open(&path).write("slot", "value");
        let reopened = FileBackend::open(&path);
        assert_eq!(reopened.read("slot").as_deref(), Some("value"));
    }

    #[test]
    fn test_tampered_payload_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        let backend = FileBackend::open(&path);
        backend.write("slot", "value");

        // Flip the payload on disk without fixing the seal.
        let mut entries: HashMap<String, SealedEntry> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        entries.get_mut("slot").unwrap().payload = BASE64.encode(b"forged");
        fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        assert!(backend.read("slot").is_none());
        // The bad slot was purged, not left to fail again.
        let remaining: HashMap<String, SealedEntry> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(remaining.is_empty());
    }

    #[test]
    fn test_garbage_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        fs::write(&path, "not json at all").unwrap();
        let backend = FileBackend::open(&path);
        assert!(backend.read("slot").is_none());
        backend.write("slot", "value");
        assert_eq!(backend.read("slot").as_deref(), Some("value"));
    }

    #[test]
    fn test_missing_file_reads_absent() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path().join("nonexistent.json"));
        assert!(backend.read("slot").is_none());
    }
}
