//! In-memory backend, the process-lifetime analogue of tab session storage.

use std::collections::HashMap;
use std::sync::Mutex;

use super::StorageBackend;

#[derive(Default)]
pub struct MemoryBackend {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, slot: &str) -> Option<String> {
        self.slots.lock().unwrap().get(slot).cloned()
    }

    fn write(&self, slot: &str, value: &str) {
        self.slots
            .lock()
            .unwrap()
            .insert(slot.to_string(), value.to_string());
    }

    fn remove(&self, slot: &str) {
        self.slots.lock().unwrap().remove(slot);
    }
}
