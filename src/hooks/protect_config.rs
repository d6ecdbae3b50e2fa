//! Config protection rule.
//!
//! The hook config decides which quality gates run and how often a stop may
//! be blocked. The agent must not be able to edit or delete it to get past
//! a failing gate.

use crate::config::CONFIG_FILE_PATH;
use crate::error::Result;
use crate::hooks::{HookInput, PreToolUseOutput};
use crate::templates;
use tera::Context;

/// File name of the protected config, for matching inside shell commands.
const CONFIG_FILE_NAME: &str = "session-hooks.yaml";

/// Check if a path points at the protected config file.
fn is_protected_path(path: &str) -> bool {
    let normalized = path.trim_start_matches("./").trim_start_matches('/');
    normalized == CONFIG_FILE_PATH || normalized.ends_with(&format!("/{CONFIG_FILE_PATH}"))
}

/// Check if a bash command might delete, move, or overwrite the config file.
fn is_config_tamper_command(command: &str) -> bool {
    if !command.contains(CONFIG_FILE_NAME) {
        return false;
    }
    let destructive = ["rm ", "rm\t", "mv ", "truncate ", "sed -i", "> ", ">>", "tee "];
    destructive.iter().any(|d| command.contains(d))
}

/// Deny Write/Edit of the config and destructive Bash commands naming it.
///
/// # Errors
///
/// Returns an error if the denial message fails to render.
pub fn check_protect_config(input: &HookInput) -> Result<Option<PreToolUseOutput>> {
    let tampering = match input.tool_name.as_deref() {
        Some("Write" | "Edit" | "MultiEdit") => input.file_path().is_some_and(is_protected_path),
        Some("Bash") => is_config_tamper_command(input.command()),
        _ => false,
    };
    if !tampering {
        return Ok(None);
    }

    let mut ctx = Context::new();
    ctx.insert("config_path", CONFIG_FILE_PATH);
    let message = templates::render("messages/protect_config.tera", &ctx)?;
    Ok(Some(PreToolUseOutput::deny(message.trim())))
}
