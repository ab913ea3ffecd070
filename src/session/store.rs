//! Session Recovery Store
//!
//! Persists the single recovery token of a verification session: the status
//! URL. It is written on initiation, cleared on reset and read at startup.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

/// Key under which the status URL is stored.
pub const STATUS_URL_KEY: &str = "statusUrl";

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file is not a valid key/value document.
    #[error("corrupt store file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persistence of the status URL.
pub trait SessionStore: Send + Sync {
    /// Read the persisted status URL.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Persist a status URL, replacing any previous one.
    fn save(&self, status_url: &str) -> Result<(), StoreError>;

    /// Forget the persisted status URL.
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    status_url: Mutex<Option<String>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a status URL.
    pub fn with_status_url(status_url: impl Into<String>) -> Self {
        Self { status_url: Mutex::new(Some(status_url.into())) }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // The slot holds a plain value, so a poisoned lock is still consistent
        self.status_url.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.slot().clone())
    }

    fn save(&self, status_url: &str) -> Result<(), StoreError> {
        *self.slot() = Some(status_url.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot() = None;
        Ok(())
    }
}

/// File-backed store.
///
/// The file is a flat JSON object of string values so other keys written by
/// the host application survive. Writes go to a sibling temp file which is
/// then renamed over the original.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(&serde_json::to_vec_pretty(map)?)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_map()?;
        f(&mut map);
        self.write_map(&map)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_map()?.remove(STATUS_URL_KEY))
    }

    fn save(&self, status_url: &str) -> Result<(), StoreError> {
        debug!("Persisting status URL to {}", self.path.display());
        self.update(|map| {
            map.insert(STATUS_URL_KEY.to_string(), status_url.to_string());
        })
    }

    fn clear(&self) -> Result<(), StoreError> {
        debug!("Clearing status URL from {}", self.path.display());
        self.update(|map| {
            map.remove(STATUS_URL_KEY);
        })
    }
}
