//! Session store: the persisted credential token plus small durable preferences.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use appshell_core::Token;

use crate::error::StoreError;

/// Durable session state. Calls block; async callers run them on the
/// blocking pool.
pub trait SessionStore: Send + Sync {
    fn read_token(&self) -> Result<Option<Token>, StoreError>;
    fn write_token(&self, token: &Token) -> Result<(), StoreError>;
    /// Remove the token and every other value held by the store.
    fn clear_all(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<Token>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    preferences: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

// ─── File-backed store ────────────────────────────────────────────

/// JSON file store. A missing file is an empty session.
pub struct FileSessionStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within the process.
    guard: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Store at `<dir>/session.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn preference(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _lock = self.lock()?;
        Ok(self.load()?.preferences.get(key).cloned())
    }

    pub fn set_preference(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _lock = self.lock()?;
        let mut file = self.load()?;
        file.preferences.insert(key.to_string(), value.to_string());
        self.save(&mut file)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, StoreError> {
        self.guard
            .lock()
            .map_err(|_| StoreError::Poisoned("session file"))
    }

    fn load(&self) -> Result<SessionFile, StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a sibling temp file, then rename over the target.
    fn save(&self, file: &mut SessionFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        file.updated_at = Some(Utc::now());
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(file)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn read_token(&self) -> Result<Option<Token>, StoreError> {
        let _lock = self.lock()?;
        Ok(self.load()?.access_token)
    }

    fn write_token(&self, token: &Token) -> Result<(), StoreError> {
        let _lock = self.lock()?;
        let mut file = self.load()?;
        file.access_token = Some(token.clone());
        self.save(&mut file)
    }

    fn clear_all(&self) -> Result<(), StoreError> {
        let _lock = self.lock()?;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "session file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ─── In-memory store ──────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<SessionFile>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: Token) -> Self {
        Self {
            inner: Mutex::new(SessionFile {
                access_token: Some(token),
                ..SessionFile::default()
            }),
        }
    }

    pub fn set_preference(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock()?
            .preferences
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        let file = self.lock()?;
        Ok(file.access_token.is_none() && file.preferences.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SessionFile>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Poisoned("memory session"))
    }
}

impl SessionStore for MemorySessionStore {
    fn read_token(&self) -> Result<Option<Token>, StoreError> {
        Ok(self.lock()?.access_token.clone())
    }

    fn write_token(&self, token: &Token) -> Result<(), StoreError> {
        let mut file = self.lock()?;
        file.access_token = Some(token.clone());
        file.updated_at = Some(Utc::now());
        Ok(())
    }

    fn clear_all(&self) -> Result<(), StoreError> {
        *self.lock()? = SessionFile::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_no_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::in_dir(dir.path());
        assert!(store.read_token().expect("read").is_none());
    }

    #[test]
    fn token_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        FileSessionStore::in_dir(dir.path())
            .write_token(&Token::new("abc"))
            .expect("write");

        let reopened = FileSessionStore::in_dir(dir.path());
        let token = reopened.read_token().expect("read").expect("token");
        assert_eq!(token.expose(), "abc");
    }

    #[test]
    fn clear_all_removes_token_and_preferences() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::in_dir(dir.path());
        store.write_token(&Token::new("abc")).expect("write");
        store.set_preference("theme", "dark").expect("pref");

        store.clear_all().expect("clear");
        assert!(store.read_token().expect("read").is_none());
        assert!(store.preference("theme").expect("pref").is_none());
        assert!(!store.path().exists());

        // Clearing an already empty store is fine.
        store.clear_all().expect("clear again");
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        let store = FileSessionStore::in_dir(&nested);
        store.write_token(&Token::new("t")).expect("write");
        assert!(nested.join("session.json").exists());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::in_dir(dir.path());
        std::fs::write(store.path(), b"{not json").expect("write");
        assert!(matches!(store.read_token(), Err(StoreError::Json(_))));
    }

    #[test]
    fn memory_store_clear() {
        let store = MemorySessionStore::with_token(Token::new("abc"));
        store.set_preference("k", "v").expect("pref");
        assert!(!store.is_empty().expect("empty"));

        store.clear_all().expect("clear");
        assert!(store.is_empty().expect("empty"));
        assert!(store.read_token().expect("read").is_none());
    }
}
