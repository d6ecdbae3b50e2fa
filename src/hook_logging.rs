//! Debug hook event logging.
//!
//! When `debug_logging` is enabled in the project config, every hook
//! invocation is appended as a JSONL line to
//! `.claude/session-hooks/hook-events.jsonl`. This allows debugging hook
//! behavior by inspecting exactly what events were received.

use crate::config::ProjectConfig;
use crate::paths;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Log file name within the data directory.
const HOOK_EVENTS_FILE: &str = "hook-events.jsonl";

/// Path of the hook event log for a project.
#[must_use]
pub fn hook_events_path(base_dir: &Path) -> PathBuf {
    paths::project_data_dir(base_dir).join(HOOK_EVENTS_FILE)
}

/// Log a hook event if debug logging is enabled in `config`.
///
/// Errors are silently ignored; logging should never break hook execution.
pub fn log_hook_event(config: &ProjectConfig, hook_type: &str, raw_input: &str, base_dir: &Path) {
    if !config.debug_logging {
        return;
    }
    write_hook_event(hook_type, raw_input, base_dir);
}

fn write_hook_event(hook_type: &str, raw_input: &str, base_dir: &Path) {
    let log_path = hook_events_path(base_dir);
    if let Some(parent) = log_path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }

    // Embed the input as JSON when it parses, otherwise as a string.
    let input_value: serde_json::Value = serde_json::from_str(raw_input)
        .unwrap_or_else(|_| serde_json::Value::String(raw_input.to_string()));

    let entry = serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "hook_type": hook_type,
        "input": input_value,
    });

    let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) else {
        return;
    };
    let _ = writeln!(file, "{entry}");
}
