//! Signed-in member and display theme, persisted through a storage port.
//!
//! `MemberSession::init` hydrates from storage; every mutation writes through.
//! `teardown` flushes and forgets the in-memory state.

use crate::models::Member;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Io(#[from] io::Error),
    #[error("session storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// What gets persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(default)]
    pub member: Option<Member>,
    #[serde(default)]
    pub theme: Theme,
}

/// Where the session is persisted.
pub trait SessionStorage {
    fn load(&mut self) -> Result<Option<StoredSession>, SessionError>;
    fn save(&mut self, session: &StoredSession) -> Result<(), SessionError>;
    fn clear(&mut self) -> Result<(), SessionError>;
}

/// In-process storage; counts writes.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    saved: Option<StoredSession>,
    writes: usize,
}

impl MemoryStorage {
    pub fn with(session: StoredSession) -> Self {
        Self {
            saved: Some(session),
            writes: 0,
        }
    }

    pub fn saved(&self) -> Option<&StoredSession> {
        self.saved.as_ref()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&mut self) -> Result<Option<StoredSession>, SessionError> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, session: &StoredSession) -> Result<(), SessionError> {
        self.saved = Some(session.clone());
        self.writes += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        self.saved = None;
        self.writes += 1;
        Ok(())
    }
}

/// JSON file storage.
#[derive(Clone, Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for JsonFileStorage {
    fn load(&mut self) -> Result<Option<StoredSession>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&mut self, session: &StoredSession) -> Result<(), SessionError> {
        let raw = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-wide identity and theme.
#[derive(Debug)]
pub struct MemberSession<S: SessionStorage> {
    storage: S,
    state: StoredSession,
}

impl<S: SessionStorage> MemberSession<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            state: StoredSession::default(),
        }
    }

    /// Hydrate from storage. Unreadable storage starts a fresh session.
    pub fn init(&mut self) {
        self.state = match self.storage.load() {
            Ok(stored) => stored.unwrap_or_default(),
            Err(e) => {
                log::warn!("ignoring unreadable session: {e}");
                StoredSession::default()
            }
        };
        if let Some(member) = &self.state.member {
            log::info!("restored session for {} ({:?})", member.full_name, member.role);
        }
    }

    pub fn member(&self) -> Option<&Member> {
        self.state.member.as_ref()
    }

    pub fn theme(&self) -> Theme {
        self.state.theme
    }

    pub fn state(&self) -> &StoredSession {
        &self.state
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn set_member(&mut self, member: Member) -> Result<(), SessionError> {
        self.state.member = Some(member);
        self.storage.save(&self.state)
    }

    /// Sign out. The theme is kept.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.state.member = None;
        self.storage.save(&self.state)
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), SessionError> {
        self.state.theme = theme;
        self.storage.save(&self.state)
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, SessionError> {
        let theme = self.state.theme.toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }

    /// Flush to storage and drop the in-memory state.
    pub fn teardown(&mut self) -> Result<(), SessionError> {
        let result = self.storage.save(&self.state);
        self.state = StoredSession::default();
        result
    }

    /// Forget everything, in memory and in storage.
    pub fn wipe(&mut self) -> Result<(), SessionError> {
        self.state = StoredSession::default();
        self.storage.clear()
    }
}
