//! Session types, the token-exchange seam, and session persistence.
//!
//! The engine never talks to the network or the disk. It emits an
//! `ExchangeToken` action; the embedding runtime runs its `TokenExchanger`
//! and feeds the result back, then executes `StoreSession` against whichever
//! `SessionStore` it wired in.
//!
//! # Defensive Store
//!
//! The file-backed store mirrors the defensive posture of client storage:
//! a missing, empty, or corrupt file loads as `None` with a warning, and
//! writes go through a temp file + rename so a crash never leaves a partial
//! session on disk.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EmbedError, Result};

/// Schema version for the persisted session file.
const SESSION_FILE_VERSION: u32 = 1;

/// An authenticated guest session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    /// Empty when the session came from a pre-exchanged token; downstream
    /// route scoping must tolerate the empty scope.
    pub project_id: String,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, project_id: impl Into<String>) -> Self {
        Session {
            token: token.into(),
            project_id: project_id.into(),
            issued_at: Utc::now(),
        }
    }

    /// A session built directly from a pre-exchanged internal token.
    pub fn from_pre_exchanged(token: &str) -> Self {
        Session::new(token, "")
    }
}

/// Error payload of a failed token exchange.
///
/// Serialized verbatim into `CLIENT_AUTHENTICATION_FAILED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ExchangeError {
    pub code: String,
    pub message: String,
}

impl ExchangeError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        ExchangeError {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// The one network round-trip: external token in, internal session out.
///
/// No retries are attempted on failure; the caller must re-initiate.
pub trait TokenExchanger {
    fn exchange(&self, external_token: &str, locale: &str) -> std::result::Result<Session, ExchangeError>;
}

/// Durable client storage for the session, reused across navigations.
pub trait SessionStore {
    fn save(&mut self, session: &Session, long_lived: bool) -> Result<()>;
    fn load(&self) -> Result<Option<Session>>;
}

/// In-memory store for tests and the simulator.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    saved: Option<(Session, bool)>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Option<&(Session, bool)> {
        self.saved.as_ref()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&mut self, session: &Session, long_lived: bool) -> Result<()> {
        self.saved = Some((session.clone(), long_lived));
        Ok(())
    }

    fn load(&self) -> Result<Option<Session>> {
        Ok(self.saved.as_ref().map(|(session, _)| session.clone()))
    }
}

/// The on-disk JSON structure for the session file.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    long_lived: bool,
    session: Session,
}

/// File-backed session store at `~/.flowdeck/session.json`.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionStore { path: path.into() }
    }

    /// Store rooted in the user's home directory.
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().ok_or(EmbedError::StorageUnavailable)?;
        Ok(FileSessionStore::new(home.join(".flowdeck").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> EmbedError {
        EmbedError::StoreIo {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn save(&mut self, session: &Session, long_lived: bool) -> Result<()> {
        let parent = self.path.parent().ok_or(EmbedError::StorageUnavailable)?;
        fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;

        let file = SessionFile {
            version: SESSION_FILE_VERSION,
            long_lived,
            session: session.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;

        let temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| self.io_error(e))?;
        fs::write(temp.path(), content).map_err(|e| self.io_error(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;
        Ok(())
    }

    fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<SessionFile>(&content) {
            Ok(file) if file.version == SESSION_FILE_VERSION => Ok(Some(file.session)),
            Ok(file) => {
                warn!(
                    version = file.version,
                    path = %self.path.display(),
                    "Ignoring session file with incompatible version"
                );
                Ok(None)
            }
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "Ignoring corrupt session file");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn pre_exchanged_session_has_empty_project_id() {
        let session = Session::from_pre_exchanged("ap-token");
        assert_eq!(session.token, "ap-token");
        assert_eq!(session.project_id, "");
    }

    #[test]
    fn memory_store_records_longevity() {
        let mut store = MemorySessionStore::new();
        store.save(&Session::new("tok", "proj"), true).unwrap();
        let (session, long_lived) = store.saved().unwrap();
        assert_eq!(session.token, "tok");
        assert!(*long_lived);
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempdir().unwrap();
        let mut store = FileSessionStore::new(dir.path().join("session.json"));

        assert_eq!(store.load().unwrap(), None);

        let session = Session::new("tok", "proj-1");
        store.save(&session, true).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));
    }

    #[test]
    fn file_store_overwrites_wholesale() {
        let dir = tempdir().unwrap();
        let mut store = FileSessionStore::new(dir.path().join("session.json"));

        store.save(&Session::new("first", "a"), true).unwrap();
        store.save(&Session::new("second", "b"), false).unwrap();
        assert_eq!(store.load().unwrap().unwrap().token, "second");
    }

    #[test]
    fn corrupt_file_loads_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileSessionStore::new(path);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn incompatible_version_loads_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let session = Session::new("tok", "proj");
        let file = serde_json::json!({
            "version": 99,
            "long_lived": true,
            "session": session,
        });
        std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        let store = FileSessionStore::new(path);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn exchange_error_serializes_to_raw_payload() {
        let error = ExchangeError::new("invalid_token", "token rejected by upstream");
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"code": "invalid_token", "message": "token rejected by upstream"})
        );
    }
}
