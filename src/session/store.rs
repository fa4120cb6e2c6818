//! Persisted session slots. The browser original keeps a raw token string and
//! a JSON profile record in `localStorage`; here the same two slots live
//! behind a `SessionStore` trait so the resolver and gateway can be exercised
//! against an in-memory store while real deployments persist to disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::warn;

/// Slot holding the raw bearer token string.
pub const TOKEN_KEY: &str = "token";
/// Slot holding the JSON-encoded cached profile record.
pub const USER_KEY: &str = "user";

/// Shared string-slot storage. Writes perform no format validation, reads of
/// missing slots yield `None`, and `remove` is idempotent. Storage failures
/// are logged rather than propagated; the session layer must keep working
/// with a cold store.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// File-per-slot store rooted at a directory. Visible to every process that
/// shares the directory; last writer wins, no locking.
pub struct FileSessionStore {
    root: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.slot_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.root) {
            warn!("session store: cannot create {}: {}", self.root.display(), e);
            return;
        }
        if let Err(e) = std::fs::write(self.slot_path(key), value) {
            warn!("session store: write of '{}' failed: {}", key, e);
        }
    }

    fn remove(&self, key: &str) {
        match std::fs::remove_file(self.slot_path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("session store: remove of '{}' failed: {}", key, e),
        }
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemorySessionStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.slots.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.slots.write().remove(key);
    }
}
