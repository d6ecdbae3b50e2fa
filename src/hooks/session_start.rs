//! `SessionStart` hook.
//!
//! Tells the agent which quality gates guard the stop, and resets the
//! session's denial counter when a fresh conversation begins.

use crate::error::Result;
use crate::hooks::{HookInput, HookOutput, StopHookConfig};
use crate::templates;
use crate::traits::StateStore;
use tera::Context;

/// Session sources that start a new conversation rather than continuing one.
const FRESH_SOURCES: [&str; 2] = ["startup", "clear"];

/// Run the session start hook.
///
/// # Errors
///
/// Returns an error if stale state cannot be cleared or the message fails to render.
pub fn run_session_start_hook(
    input: &HookInput,
    config: &StopHookConfig,
    store: &dyn StateStore,
) -> Result<HookOutput> {
    let source = input.source.as_deref().unwrap_or("startup");
    if FRESH_SOURCES.contains(&source) {
        store.clear_session_state(&input.session_id)?;
        tracing::debug!(session_id = %input.session_id, source, "Cleared session state");
    }

    let gate_names: Vec<&str> = config.gates.iter().map(|g| g.name.as_str()).collect();
    let mut ctx = Context::new();
    ctx.insert("gates", &gate_names);
    ctx.insert("max_stop_denials", &config.max_stop_denials);
    let message = templates::render("messages/session_start.tera", &ctx)?;

    Ok(HookOutput::with_context("SessionStart", message.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::QualityGate;
    use crate::testing::MemoryStateStore;

    fn input(source: &str) -> HookInput {
        HookInput {
            session_id: "s1".to_string(),
            source: Some(source.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_startup_clears_state() {
        let store = MemoryStateStore::new().with_denials("s1", 3);
        run_session_start_hook(&input("startup"), &StopHookConfig::default(), &store).unwrap();
        assert_eq!(store.denial_count("s1"), None);
    }

    #[test]
    fn test_resume_keeps_state() {
        let store = MemoryStateStore::new().with_denials("s1", 3);
        run_session_start_hook(&input("resume"), &StopHookConfig::default(), &store).unwrap();
        assert_eq!(store.denial_count("s1"), Some(3));
    }

    #[test]
    fn test_context_lists_gates() {
        let store = MemoryStateStore::new();
        let output =
            run_session_start_hook(&input("startup"), &StopHookConfig::default(), &store).unwrap();
        let context = output.context().unwrap();
        assert!(context.contains("typecheck, lint, knip, test"));
        assert!(context.contains("at most 5 times"));
    }

    #[test]
    fn test_context_without_gates() {
        let store = MemoryStateStore::new();
        let config = StopHookConfig { gates: Vec::<QualityGate>::new(), ..Default::default() };
        let output = run_session_start_hook(&input("clear"), &config, &store).unwrap();
        assert_eq!(output.context(), Some("No quality gates are configured for this project."));
    }
}
