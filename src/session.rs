//! Saved view state per data file.
//!
//! When a grid is closed its filters, sort and page are stored under the data
//! file's canonical path, so reopening the same file restores the view.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::view::ViewState;

/// Errors reading or writing the session file
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("session file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Stored state for one data file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    pub state: ViewState,
    /// Unix timestamp of last use
    pub last_used: u64,
}

/// Session file format
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    sessions: HashMap<String, SessionEntry>,
}

impl Default for SessionFile {
    fn default() -> Self {
        Self {
            version: 1,
            sessions: HashMap::new(),
        }
    }
}

/// Session store
pub struct Sessions {
    sessions: HashMap<String, SessionEntry>,
    path: PathBuf,
    max_entries: usize,
    decay_after_days: u64,
}

impl Sessions {
    /// Create a store backed by the default session file
    pub fn new(max_entries: usize, decay_after_days: u64) -> Self {
        Self::with_path(Self::default_path(), max_entries, decay_after_days)
    }

    pub fn with_path(path: PathBuf, max_entries: usize, decay_after_days: u64) -> Self {
        Self {
            sessions: HashMap::new(),
            path,
            max_entries,
            decay_after_days,
        }
    }

    /// Get the default session file path
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("darkwall-grid")
            .join("sessions.json")
    }

    /// Load sessions from disk. A missing file is an empty store.
    pub fn load(&mut self) -> Result<(), SessionError> {
        if !self.path.exists() {
            tracing::debug!("No session file found, starting fresh");
            return Ok(());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })?;

        let file: SessionFile =
            serde_json::from_str(&content).map_err(|source| SessionError::Json {
                path: self.path.clone(),
                source,
            })?;

        self.sessions = file.sessions;
        tracing::info!("Loaded {} saved sessions", self.sessions.len());

        self.prune_old_entries();
        Ok(())
    }

    /// Save sessions to disk
    pub fn save(&self) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let file = SessionFile {
            version: 1,
            sessions: self.sessions.clone(),
        };

        let content = serde_json::to_string_pretty(&file).map_err(|source| SessionError::Json {
            path: self.path.clone(),
            source,
        })?;

        fs::write(&self.path, content).map_err(io_err)?;

        tracing::debug!("Saved {} sessions", self.sessions.len());
        Ok(())
    }

    /// Saved state for a data file
    pub fn get(&self, data_path: &Path) -> Option<&ViewState> {
        self.sessions.get(&session_key(data_path)).map(|e| &e.state)
    }

    /// Remember the state for a data file
    pub fn record(&mut self, data_path: &Path, state: ViewState) {
        self.sessions.insert(
            session_key(data_path),
            SessionEntry {
                state,
                last_used: current_timestamp(),
            },
        );

        if self.sessions.len() > self.max_entries {
            self.prune_least_recent();
        }
    }

    /// Forget the state for a data file
    pub fn forget(&mut self, data_path: &Path) -> bool {
        self.sessions.remove(&session_key(data_path)).is_some()
    }

    /// Remove entries older than decay_after_days
    fn prune_old_entries(&mut self) {
        let now = current_timestamp();
        let cutoff = now.saturating_sub(self.decay_after_days * 24 * 3600);

        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.last_used >= cutoff);
        let removed = before - self.sessions.len();

        if removed > 0 {
            tracing::info!("Pruned {} stale sessions", removed);
        }
    }

    /// Drop the least recently used entries to stay under max_entries
    fn prune_least_recent(&mut self) {
        if self.sessions.len() <= self.max_entries {
            return;
        }

        let mut entries: Vec<_> = self.sessions.drain().collect();
        entries.sort_by(|a, b| b.1.last_used.cmp(&a.1.last_used).then_with(|| a.0.cmp(&b.0)));
        self.sessions = entries.into_iter().take(self.max_entries).collect();
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Canonical path where possible so `./data.json` and its absolute path
/// share a session.
fn session_key(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

/// Get current Unix timestamp
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}
