//! File-backed session state storage.
//!
//! Each session gets one JSON file in the state directory, named by a fixed
//! prefix plus the sanitized session id. Writes go through a `.tmp` sibling
//! that is renamed over the final path so readers never see a partial record.

use crate::error::Result;
use crate::paths;
use crate::traits::StateStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Per-session state persisted across hook invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// The session this record belongs to.
    pub session_id: String,
    /// Consecutive stop attempts blocked in this session.
    #[serde(default)]
    pub denial_count: u32,
    /// When the record was last changed by a hook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Create a fresh record with a zero denial count.
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self { session_id: session_id.into(), denial_count: 0, updated_at: None }
    }
}

/// State store keeping one JSON file per session.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    /// Create a store rooted at the default state directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dir(paths::default_state_dir())
    }

    /// Create a store rooted at a specific directory.
    #[must_use]
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The state file path for a session.
    #[must_use]
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        paths::state_file_path(&self.dir, session_id)
    }
}

impl Default for FileStateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The `.tmp` sibling used for write-then-rename.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

impl StateStore for FileStateStore {
    fn get_session_state(&self, session_id: &str) -> Option<SessionState> {
        let path = self.path_for(session_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to read session state");
                }
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring undecodable session state");
                None
            }
        }
    }

    fn save_session_state(&self, session_id: &str, state: &SessionState) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(session_id);
        let tmp = temp_path(&path);
        let json = serde_json::to_string_pretty(state)?;

        fs::write(&tmp, &json)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            tracing::warn!(path = %path.display(), error = %e, "Rename failed, writing state in place");
            let _ = fs::remove_file(&tmp);
            fs::write(&path, &json)?;
        }
        Ok(())
    }

    fn clear_session_state(&self, session_id: &str) -> Result<()> {
        match fs::remove_file(self.path_for(session_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
