//! Path utilities for determining data storage locations.
//!
//! Session state lives in one JSON file per session in a shared state
//! directory (the system temp directory unless overridden). Project-scoped
//! files such as the config and the debug event log live under `.claude/`.

use std::path::{Path, PathBuf};

/// Environment variable that overrides the state directory.
pub const STATE_DIR_ENV: &str = "SESSION_HOOKS_STATE_DIR";

/// Prefix of every session state file name.
pub const STATE_FILE_PREFIX: &str = "session-hooks-state-";

/// Directory for project-scoped data, relative to the project root.
const PROJECT_DATA_DIR: &str = ".claude/session-hooks";

/// Get the default state directory.
///
/// Returns the value of `SESSION_HOOKS_STATE_DIR` if set and non-empty,
/// otherwise the system temp directory.
#[must_use]
pub fn default_state_dir() -> PathBuf {
    match std::env::var_os(STATE_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::temp_dir(),
    }
}

/// Normalize a session identifier into a filesystem-safe token.
///
/// Every character other than an ASCII letter, digit, `-` or `_` becomes `_`,
/// so the token can never contain a path separator or a `.`. An empty id maps
/// to `unknown`.
#[must_use]
pub fn sanitize_session_id(session_id: &str) -> String {
    if session_id.is_empty() {
        return "unknown".to_string();
    }
    session_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Get the state file path for a session inside `state_dir`.
#[must_use]
pub fn state_file_path(state_dir: &Path, session_id: &str) -> PathBuf {
    state_dir.join(format!("{STATE_FILE_PREFIX}{}.json", sanitize_session_id(session_id)))
}

/// Get the project-specific data directory.
#[must_use]
pub fn project_data_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(PROJECT_DATA_DIR)
}
