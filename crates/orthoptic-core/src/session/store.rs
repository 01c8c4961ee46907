//! Locally persisted session record.
//!
//! One record per device, stored as JSON at
//! `~/.config/orthoptic/session.json`. Loads fail soft: a missing or
//! malformed file reads as "not logged in," never as an error.

use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::storage::data_dir;

/// The locally persisted proof of a logged-in identity.
///
/// Invariant: a logged-in session carries both tokens. A record holding
/// only one of them is treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "local_id")]
    pub user_id: String,
    pub id_token: String,
    pub refresh_token: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,
}

/// Single-record session persistence.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store backed by `session.json` under the data directory.
    pub fn open() -> Result<Self, CoreError> {
        Ok(Self {
            path: data_dir()?.join("session.json"),
        })
    }

    /// Store backed by an explicit path (tests).
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the current session. Missing file, unreadable file, malformed
    /// JSON, and a record with either token blank all read as `None`.
    pub fn load(&self) -> Option<Session> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let session: Session = serde_json::from_str(&content).ok()?;
        if session.id_token.is_empty() || session.refresh_token.is_empty() {
            return None;
        }
        Some(session)
    }

    /// Persist the session, fully overwriting any prior record. The write
    /// goes to a sibling temp file first and lands via rename, so readers
    /// never observe a partial record.
    pub fn save(&self, session: &Session) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(session)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Log out: delete the record. Succeeds if it was already absent.
    pub fn clear(&self) -> Result<(), CoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Session {
        Session {
            user_id: "uid-1".into(),
            id_token: "id.tok.en".into(),
            refresh_token: "refresh".into(),
            email: "user@example.com".into(),
            fcm_token: None,
        }
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.json"));
        store.save(&sample()).unwrap();
        assert_eq!(store.load(), Some(sample()));
    }

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.json"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn load_malformed_json_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(SessionStore::at(&path).load(), None);
    }

    #[test]
    fn record_with_one_token_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{"local_id":"u","id_token":"tok","refresh_token":"","email":"a@b.c"}"#,
        )
        .unwrap();
        assert_eq!(SessionStore::at(&path).load(), None);
    }

    #[test]
    fn save_overwrites_whole_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.json"));
        let mut first = sample();
        first.fcm_token = Some("tok-a".into());
        store.save(&first).unwrap();

        let second = sample(); // no fcm_token
        store.save(&second).unwrap();
        assert_eq!(store.load().unwrap().fcm_token, None);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.json"));
        store.save(&sample()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn wire_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("local_id").is_some());
        assert!(json.get("user_id").is_none());
    }
}
