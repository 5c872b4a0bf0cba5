//! Bearer-token persistence.
//!
//! SYSTEM CONTEXT
//! ==============
//! The auth client is the only writer. Everything lives under one well-known
//! key so a file store looks like a browser's script-accessible storage.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde_json::{Map, Value};

/// The single storage key holding the bearer token.
pub const TOKEN_STORAGE_KEY: &str = "access_token";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted bearer-token slot.
pub trait TokenStore: Send + Sync {
    /// Read the stored token, if any. Never touches the network.
    fn get(&self) -> Option<String>;

    /// Replace the stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted.
    fn set(&self, token: &str) -> Result<(), StorageError>;

    /// Remove the stored token. Succeeds when nothing is stored.
    fn clear(&self);
}

/// Process-local store, the default for tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { slot: Mutex::new(Some(token.into())) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_owned());
        Ok(())
    }

    fn clear(&self) {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

/// JSON-file store: `{"access_token": "..."}`. Other keys in the file are
/// left alone.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Map::new()),
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes)? {
                Value::Object(map) => Ok(map),
                _ => Ok(Map::new()),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        write_json_file(&self.path, map)
    }
}

/// Write `value` as pretty JSON through a sibling `.tmp` file and a rename,
/// so readers never see a half-written file.
pub(crate) fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let rendered = serde_json::to_vec_pretty(value)?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, rendered)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.read_map() {
            Ok(map) => map
                .get(TOKEN_STORAGE_KEY)
                .and_then(Value::as_str)
                .filter(|token| !token.is_empty())
                .map(str::to_owned),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "token store unreadable");
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map().unwrap_or_default();
        map.insert(TOKEN_STORAGE_KEY.to_owned(), Value::String(token.to_owned()));
        self.write_map(&map)
    }

    fn clear(&self) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let Ok(mut map) = self.read_map() else {
            // Unreadable file: drop it entirely so no stale token survives.
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!(error = %e, path = %self.path.display(), "token store removal failed");
            }
            return;
        };
        if map.remove(TOKEN_STORAGE_KEY).is_none() {
            return;
        }
        if let Err(e) = self.write_map(&map) {
            // Losing the other keys beats leaving the token on disk.
            tracing::warn!(error = %e, path = %self.path.display(), "token store rewrite failed; removing file");
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::error!(error = %e, path = %self.path.display(), "token store removal failed");
            }
        }
    }
}
