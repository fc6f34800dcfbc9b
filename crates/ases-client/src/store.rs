//! Where an authenticated session survives between runs.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use ases_domain::account::AccountView;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored session is unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("session storage lock poisoned")]
    Poisoned,
}

/// Persisted session: the user projection (kept under its historical
/// `quiz-user` key) and the bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(rename = "quiz-user")]
    pub user: AccountView,
    pub token: String,
}

pub trait SessionStore: Send + Sync {
    /// `Ok(None)` when nothing is stored; `Err(Corrupt)` when something unreadable is.
    fn load(&self) -> Result<Option<StoredSession>, StoreError>;

    fn save(&self, session: &StoredSession) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

// ── Memory ────────────────────────────────────────────────────────────────────

/// Keeps the serialized session in memory, exactly as a file would hold it.
#[derive(Default)]
pub struct MemorySessionStore {
    raw: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from arbitrary stored bytes, e.g. a corrupt payload.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|guard| guard.clone())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<StoredSession>, StoreError> {
        let guard = self.raw.lock().map_err(|_| StoreError::Poisoned)?;
        guard
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(StoreError::from)
    }

    fn save(&self, session: &StoredSession) -> Result<(), StoreError> {
        let raw = serde_json::to_string(session)?;
        *self.raw.lock().map_err(|_| StoreError::Poisoned)? = Some(raw);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.raw.lock().map_err(|_| StoreError::Poisoned)? = None;
        Ok(())
    }
}

// ── File ──────────────────────────────────────────────────────────────────────

/// JSON file store. Writes go through a temp file in the same directory and
/// are renamed into place.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<StoredSession>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session: &StoredSession) -> Result<(), StoreError> {
        std::fs::create_dir_all(self.dir())?;
        let mut tmp = tempfile::NamedTempFile::new_in(self.dir())?;
        serde_json::to_writer_pretty(&mut tmp, session)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
