//! In-memory store.

use std::collections::HashMap;

use super::SecretStore;

/// A fixed set of secrets held in memory.
#[derive(Default, Clone)]
pub struct MemoryStore {
    secrets: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

impl SecretStore for MemoryStore {
    fn get_secret(&self, name: &str) -> Option<String> {
        self.secrets.get(name).cloned()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.secrets.len())
            .finish()
    }
}
