//! Rule against bypassing git hooks with `--no-verify`.
//!
//! Git hooks are often the same checks as the quality gates; skipping them
//! on commit or push would let failures reach the repository unnoticed.

use crate::error::Result;
use crate::hooks::{HookInput, PreToolUseOutput};
use crate::templates;
use once_cell::sync::Lazy;
use regex::Regex;
use tera::Context;

/// Patterns that match git commit/push with --no-verify (or commit's -n).
static NO_VERIFY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\bgit\s+(commit|push)\b[^;&|]*\s--no-verify\b",
        r"\bgit\s+commit\b[^;&|]*\s-[a-zA-Z]*n[a-zA-Z]*\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Check whether a shell command skips git hooks.
pub fn uses_no_verify(command: &str) -> bool {
    NO_VERIFY_PATTERNS.iter().any(|re| re.is_match(command))
}

/// Deny Bash calls that skip git hooks.
///
/// # Errors
///
/// Returns an error if the denial message fails to render.
pub fn check_no_verify(input: &HookInput) -> Result<Option<PreToolUseOutput>> {
    if input.tool_name.as_deref() != Some("Bash") || !uses_no_verify(input.command()) {
        return Ok(None);
    }
    let message = templates::render("messages/no_verify_block.tera", &Context::new())?;
    Ok(Some(PreToolUseOutput::deny(message.trim())))
}
