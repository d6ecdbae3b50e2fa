//! Unified `PreToolUse` hook dispatcher.
//!
//! Rules are evaluated in order and the first denial wins. Anything no rule
//! objects to is allowed.

use crate::error::Result;
use crate::hooks::no_verify::check_no_verify;
use crate::hooks::protect_config::check_protect_config;
use crate::hooks::{HookInput, PreToolUseOutput};
use crate::templates;
use once_cell::sync::Lazy;
use regex::Regex;
use tera::Context;

/// Recursive `rm` aimed at `/`, `~` or `$HOME`.
static RECURSIVE_DELETE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r#"\brm\s+(?:-[a-zA-Z]*\s+)*-[a-zA-Z]*[rR][a-zA-Z]*\s+(?:-[a-zA-Z-]*\s+)*(/|~/?|\$HOME/?|"\$HOME"/?)(?:\s|;|&|\||$)"#,
    )
    .ok()
});

/// Describe what a dangerous recursive delete would wipe, if the command is one.
fn recursive_delete_target(command: &str) -> Option<&'static str> {
    let caps = RECURSIVE_DELETE.as_ref()?.captures(command)?;
    match caps.get(1)?.as_str() {
        "/" => Some("the filesystem root"),
        _ => Some("your home directory"),
    }
}

fn check_dangerous_command(input: &HookInput) -> Result<Option<PreToolUseOutput>> {
    if input.tool_name.as_deref() != Some("Bash") {
        return Ok(None);
    }
    let Some(target) = recursive_delete_target(input.command()) else {
        return Ok(None);
    };

    let mut ctx = Context::new();
    ctx.insert("command", input.command().trim());
    ctx.insert("target", target);
    let message = templates::render("messages/dangerous_command.tera", &ctx)?;
    Ok(Some(PreToolUseOutput::deny(message.trim())))
}

/// Run all `PreToolUse` rules for the given input.
///
/// # Errors
///
/// Returns an error if a denial message fails to render.
pub fn run_pre_tool_use(input: &HookInput) -> Result<PreToolUseOutput> {
    let rules: [fn(&HookInput) -> Result<Option<PreToolUseOutput>>; 3] =
        [check_no_verify, check_dangerous_command, check_protect_config];

    for rule in rules {
        if let Some(denied) = rule(input)? {
            tracing::info!(
                tool = input.tool_name.as_deref().unwrap_or(""),
                reason = denied.reason().unwrap_or(""),
                "Denied tool use"
            );
            return Ok(denied);
        }
    }
    Ok(PreToolUseOutput::allow())
}
