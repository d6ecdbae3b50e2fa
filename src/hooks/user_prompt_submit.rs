//! `UserPromptSubmit` hook.
//!
//! Lets every prompt through. If earlier stops in this session were blocked
//! by a failing gate, the agent is reminded so it does not forget the gates
//! while working on the new prompt.

use crate::error::Result;
use crate::hooks::{HookInput, HookOutput};
use crate::templates;
use crate::traits::StateStore;
use tera::Context;

/// Run the user prompt submit hook.
///
/// # Errors
///
/// Returns an error if the reminder fails to render.
pub fn run_user_prompt_submit_hook(
    input: &HookInput,
    max_stop_denials: u32,
    store: &dyn StateStore,
) -> Result<HookOutput> {
    let denial_count = store.get_session_state(&input.session_id).map_or(0, |s| s.denial_count);
    if denial_count == 0 {
        return Ok(HookOutput::proceed());
    }

    let mut ctx = Context::new();
    ctx.insert("denial_count", &denial_count);
    ctx.insert("max_stop_denials", &max_stop_denials);
    let message = templates::render("messages/stop_denied_reminder.tera", &ctx)?;
    Ok(HookOutput::with_context("UserPromptSubmit", message.trim()))
}
