//! Stop hook: quality gates before the session may end.
//!
//! When the agent tries to stop with uncommitted changes, the quality gate
//! pipeline runs. A failing gate blocks the stop and tells the agent what to
//! fix. Each block is counted per session, and once the count reaches the
//! configured ceiling every further stop is allowed, so a session can always
//! end even if a gate never passes.

use crate::config::ProjectConfig;
use crate::error::Result;
use crate::gates::{self, GateContext, GateOutcome, QualityGate};
use crate::git;
use crate::hooks::HookInput;
use crate::templates;
use crate::traits::{CommandRunner, ScriptRegistry, StateStore};
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use tera::Context;

/// Maximum characters of gate output quoted in a block reason.
pub const MAX_OUTPUT_CHARS: usize = 2000;

/// Appended to gate output that was cut at [`MAX_OUTPUT_CHARS`].
pub const TRUNCATION_MARKER: &str = "\n... (output truncated)";

/// Configuration for the stop hook.
#[derive(Debug, Clone)]
pub struct StopHookConfig {
    /// Blocked stops allowed per session before stops are always allowed.
    pub max_stop_denials: u32,
    /// Ordered gate pipeline.
    pub gates: Vec<QualityGate>,
    /// Program used to run manifest scripts.
    pub script_runner: String,
    /// Per-gate deadline. `None` waits indefinitely.
    pub gate_timeout: Option<Duration>,
    /// Run the gates even when the working-tree status query fails.
    pub strict_change_detection: bool,
}

impl Default for StopHookConfig {
    fn default() -> Self {
        Self::from(&ProjectConfig::default())
    }
}

impl From<&ProjectConfig> for StopHookConfig {
    fn from(config: &ProjectConfig) -> Self {
        Self {
            max_stop_denials: config.max_stop_denials,
            gates: config.gates.clone(),
            script_runner: config.script_runner.clone(),
            gate_timeout: config.gate_timeout(),
            strict_change_detection: config.strict_change_detection,
        }
    }
}

/// The decision reached for one stop attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopDecision {
    /// Another stop hook already blocked this attempt.
    ReentrantAllow,
    /// The session has used up its blocked stops.
    SafetyValveAllow {
        /// The stored denial count.
        denial_count: u32,
    },
    /// Nothing in the working tree to check.
    NoChangesAllow,
    /// A gate failed; the stop is blocked.
    GateFailureBlock {
        /// Explanation shown to the agent.
        reason: String,
        /// The denial count after this block.
        denial_count: u32,
    },
    /// Every gate passed or was skipped.
    AllPassedAllow,
}

impl StopDecision {
    /// Whether the stop is blocked.
    #[must_use]
    pub const fn is_block(&self) -> bool {
        matches!(self, Self::GateFailureBlock { .. })
    }

    /// Convert to the document written to stdout.
    #[must_use]
    pub fn into_output(self) -> StopHookOutput {
        match self {
            Self::GateFailureBlock { reason, .. } => StopHookOutput::block(reason),
            _ => StopHookOutput::allow(),
        }
    }
}

/// Stop hook response. Allow serializes as `{}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct StopHookOutput {
    /// `Some("block")` to block the stop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    /// Why the stop was blocked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StopHookOutput {
    /// Allow the stop. Also the fallback document on faults.
    #[must_use]
    pub const fn allow() -> Self {
        Self { decision: None, reason: None }
    }

    /// Block the stop with an explanation.
    #[must_use]
    pub fn block(reason: impl Into<String>) -> Self {
        Self { decision: Some("block".to_string()), reason: Some(reason.into()) }
    }
}

/// Changed paths to check, or `None` when there is nothing to gate.
///
/// A failed status query normally counts as "no changes". In strict mode the
/// gates run anyway, with an empty file list.
fn detect_changes(runner: &dyn CommandRunner, strict: bool) -> Option<Vec<String>> {
    let files = if strict {
        match git::changed_files(runner) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(error = %e, "Could not list changed files; running gates anyway");
                return Some(Vec::new());
            }
        }
    } else {
        git::list_changed_files(runner)
    };
    (!files.is_empty()).then_some(files)
}

/// Truncate `output` to `max` characters, appending [`TRUNCATION_MARKER`] if cut.
#[must_use]
pub fn truncate_output(output: &str, max: usize) -> String {
    match output.char_indices().nth(max) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &output[..cut]),
        None => output.to_string(),
    }
}

/// Run the stop hook.
///
/// The checks run in order and the first one that decides ends the
/// evaluation: re-entrant attempt, safety valve, no changes, gate failure.
///
/// # Errors
///
/// Returns an error if the denial count cannot be persisted or the block
/// reason cannot be rendered. Callers treat any error as "allow".
pub fn run_stop_hook(
    input: &HookInput,
    config: &StopHookConfig,
    runner: &dyn CommandRunner,
    store: &dyn StateStore,
    registry: &dyn ScriptRegistry,
) -> Result<StopDecision> {
    let session_id = input.session_id.as_str();

    if input.stop_hook_active {
        tracing::info!(session_id, "Stop already blocked for this attempt; allowing");
        return Ok(StopDecision::ReentrantAllow);
    }

    let denial_count = store.get_session_state(session_id).map_or(0, |s| s.denial_count);
    if denial_count >= config.max_stop_denials {
        tracing::warn!(
            session_id,
            denial_count,
            max = config.max_stop_denials,
            "Stop denial limit reached; allowing"
        );
        return Ok(StopDecision::SafetyValveAllow { denial_count });
    }

    let Some(changed) = detect_changes(runner, config.strict_change_detection) else {
        tracing::info!(session_id, "No working-tree changes; allowing");
        return Ok(StopDecision::NoChangesAllow);
    };

    let ctx = GateContext {
        runner,
        registry,
        script_runner: &config.script_runner,
        timeout: config.gate_timeout,
    };
    let failed = match gates::run_quality_gates(&config.gates, &ctx) {
        GateOutcome::AllPassed => {
            tracing::info!(session_id, "All quality gates passed; allowing");
            return Ok(StopDecision::AllPassedAllow);
        }
        GateOutcome::Failed(result) => result,
    };

    let state = store.update_session_state(session_id, &mut |s| {
        s.denial_count += 1;
        s.updated_at = Some(Utc::now());
    })?;

    let mut tera_ctx = Context::new();
    tera_ctx.insert("gate", &failed.name);
    tera_ctx.insert("attempt", &state.denial_count);
    tera_ctx.insert("max_attempts", &config.max_stop_denials);
    tera_ctx.insert("output", &truncate_output(&failed.output, MAX_OUTPUT_CHARS));
    tera_ctx.insert("files", &changed);
    let reason = templates::render("messages/stop/gate_failed.tera", &tera_ctx)?;

    tracing::info!(
        session_id,
        gate = %failed.name,
        denial_count = state.denial_count,
        "Blocking stop"
    );
    Ok(StopDecision::GateFailureBlock { reason, denial_count: state.denial_count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        FailingCommandRunner, MemoryStateStore, MockCommandRunner, StaticScriptRegistry,
    };
    use crate::traits::CommandOutput;

    fn output(exit_code: i32, stdout: &str) -> CommandOutput {
        CommandOutput { exit_code, stdout: stdout.to_string(), stderr: String::new() }
    }

    fn expect_status(runner: &mut MockCommandRunner, porcelain: &str) {
        runner.expect("git", &["status", "--porcelain"], output(0, porcelain));
    }

    fn stop_input(session_id: &str) -> HookInput {
        HookInput { session_id: session_id.to_string(), ..Default::default() }
    }

    fn two_gate_config() -> StopHookConfig {
        StopHookConfig {
            gates: vec![QualityGate::script("typecheck"), QualityGate::script("lint")],
            ..Default::default()
        }
    }

    fn all_scripts() -> StaticScriptRegistry {
        StaticScriptRegistry::new(&["typecheck", "lint", "knip", "test"])
    }

    #[test]
    fn test_reentrant_stop_is_allowed() {
        let runner = MockCommandRunner::new();
        let store = MemoryStateStore::new();
        let input = HookInput { stop_hook_active: true, ..stop_input("s1") };

        let decision =
            run_stop_hook(&input, &two_gate_config(), &runner, &store, &all_scripts()).unwrap();
        assert_eq!(decision, StopDecision::ReentrantAllow);
        assert_eq!(runner.calls(), 0);
    }

    #[test]
    fn test_reentrant_stop_ignores_exhausted_counter() {
        let runner = MockCommandRunner::new();
        let store = MemoryStateStore::new().with_denials("s1", 99);
        let input = HookInput { stop_hook_active: true, ..stop_input("s1") };

        let decision =
            run_stop_hook(&input, &two_gate_config(), &runner, &store, &all_scripts()).unwrap();
        assert_eq!(decision, StopDecision::ReentrantAllow);
    }

    #[test]
    fn test_safety_valve_allows_without_checking() {
        // No expectations: any git or gate command would panic.
        let runner = MockCommandRunner::new();
        let store = MemoryStateStore::new().with_denials("s1", 5);

        let decision =
            run_stop_hook(&stop_input("s1"), &two_gate_config(), &runner, &store, &all_scripts())
                .unwrap();
        assert_eq!(decision, StopDecision::SafetyValveAllow { denial_count: 5 });
        assert_eq!(store.denial_count("s1"), Some(5));
    }

    #[test]
    fn test_safety_valve_respects_configured_ceiling() {
        let runner = MockCommandRunner::new();
        let store = MemoryStateStore::new().with_denials("s1", 2);
        let config = StopHookConfig { max_stop_denials: 2, ..two_gate_config() };

        let decision =
            run_stop_hook(&stop_input("s1"), &config, &runner, &store, &all_scripts()).unwrap();
        assert!(matches!(decision, StopDecision::SafetyValveAllow { .. }));
    }

    #[test]
    fn test_no_changes_runs_no_gates() {
        let mut runner = MockCommandRunner::new();
        expect_status(&mut runner, "");
        let store = MemoryStateStore::new();

        let decision =
            run_stop_hook(&stop_input("s1"), &two_gate_config(), &runner, &store, &all_scripts())
                .unwrap();
        assert_eq!(decision, StopDecision::NoChangesAllow);
        assert_eq!(runner.calls(), 1);
        assert_eq!(store.denial_count("s1"), None);
    }

    #[test]
    fn test_status_failure_fails_open() {
        let runner = FailingCommandRunner::new("git: not found");
        let store = MemoryStateStore::new();

        let decision =
            run_stop_hook(&stop_input("s1"), &two_gate_config(), &runner, &store, &all_scripts())
                .unwrap();
        assert_eq!(decision, StopDecision::NoChangesAllow);
    }

    #[test]
    fn test_status_failure_with_strict_detection_runs_gates() {
        let mut runner = MockCommandRunner::new();
        runner.expect(
            "git",
            &["status", "--porcelain"],
            CommandOutput { exit_code: 128, stdout: String::new(), stderr: "fatal".to_string() },
        );
        runner.expect("npm", &["run", "typecheck"], output(1, "TS2322"));
        let store = MemoryStateStore::new();
        let config = StopHookConfig { strict_change_detection: true, ..two_gate_config() };

        let decision =
            run_stop_hook(&stop_input("s1"), &config, &runner, &store, &all_scripts()).unwrap();
        assert!(decision.is_block());
        runner.verify();
    }

    #[test]
    fn test_all_gates_pass_allows() {
        let mut runner = MockCommandRunner::new();
        expect_status(&mut runner, " M a.ts\n");
        runner.expect("npm", &["run", "typecheck"], output(0, ""));
        runner.expect("npm", &["run", "lint"], output(0, ""));
        let store = MemoryStateStore::new();

        let decision =
            run_stop_hook(&stop_input("s1"), &two_gate_config(), &runner, &store, &all_scripts())
                .unwrap();
        assert_eq!(decision, StopDecision::AllPassedAllow);
        assert_eq!(store.denial_count("s1"), None);
        runner.verify();
    }

    #[test]
    fn test_all_gates_skipped_allows() {
        let mut runner = MockCommandRunner::new();
        expect_status(&mut runner, " M a.ts\n");
        let store = MemoryStateStore::new();

        let decision = run_stop_hook(
            &stop_input("s1"),
            &StopHookConfig::default(),
            &runner,
            &store,
            &StaticScriptRegistry::default(),
        )
        .unwrap();
        assert_eq!(decision, StopDecision::AllPassedAllow);
        runner.verify();
    }

    #[test]
    fn test_gate_failure_blocks_and_counts() {
        let mut runner = MockCommandRunner::new();
        expect_status(&mut runner, " M a.ts\n?? b.ts\n");
        runner.expect("npm", &["run", "typecheck"], output(0, ""));
        runner.expect("npm", &["run", "lint"], output(1, "2 errors"));
        let store = MemoryStateStore::new();

        let decision =
            run_stop_hook(&stop_input("s1"), &two_gate_config(), &runner, &store, &all_scripts())
                .unwrap();

        let StopDecision::GateFailureBlock { reason, denial_count } = decision else {
            panic!("expected a block");
        };
        assert_eq!(denial_count, 1);
        assert!(reason.contains("lint"));
        assert!(reason.contains("1/5"));
        assert!(reason.contains("2 errors"));
        assert!(reason.contains("- a.ts"));
        assert!(reason.contains("- b.ts"));
        assert_eq!(store.denial_count("s1"), Some(1));
        runner.verify();
    }

    #[test]
    fn test_block_stamps_updated_at() {
        let mut runner = MockCommandRunner::new();
        expect_status(&mut runner, " M a.ts\n");
        runner.expect("npm", &["run", "typecheck"], output(1, "bad"));
        let store = MemoryStateStore::new();

        run_stop_hook(&stop_input("s1"), &two_gate_config(), &runner, &store, &all_scripts())
            .unwrap();
        assert!(store.get_session_state("s1").unwrap().updated_at.is_some());
    }

    #[test]
    fn test_state_write_failure_is_an_error() {
        let mut runner = MockCommandRunner::new();
        expect_status(&mut runner, " M a.ts\n");
        runner.expect("npm", &["run", "typecheck"], output(1, "bad"));
        let store = MemoryStateStore::failing_writes();

        let result =
            run_stop_hook(&stop_input("s1"), &two_gate_config(), &runner, &store, &all_scripts());
        assert!(result.is_err());
    }

    #[test]
    fn test_long_output_is_truncated_in_reason() {
        let long = "x".repeat(MAX_OUTPUT_CHARS + 500);
        let mut runner = MockCommandRunner::new();
        expect_status(&mut runner, " M a.ts\n");
        runner.expect("npm", &["run", "typecheck"], output(1, &long));
        let store = MemoryStateStore::new();

        let decision =
            run_stop_hook(&stop_input("s1"), &two_gate_config(), &runner, &store, &all_scripts())
                .unwrap();
        let StopDecision::GateFailureBlock { reason, .. } = decision else {
            panic!("expected a block");
        };
        assert!(reason.contains(&"x".repeat(MAX_OUTPUT_CHARS)));
        assert!(!reason.contains(&"x".repeat(MAX_OUTPUT_CHARS + 1)));
        assert!(reason.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncate_output_boundaries() {
        let exact = "y".repeat(MAX_OUTPUT_CHARS);
        assert_eq!(truncate_output(&exact, MAX_OUTPUT_CHARS), exact);

        let over = "y".repeat(MAX_OUTPUT_CHARS + 1);
        let truncated = truncate_output(&over, MAX_OUTPUT_CHARS);
        assert_eq!(truncated, format!("{exact}{TRUNCATION_MARKER}"));

        assert_eq!(truncate_output("", 10), "");
    }

    #[test]
    fn test_truncate_output_counts_chars_not_bytes() {
        let s = "é".repeat(5);
        assert_eq!(truncate_output(&s, 5), s);
        assert_eq!(truncate_output(&s, 3), format!("ééé{TRUNCATION_MARKER}"));
    }

    #[test]
    fn test_decision_outputs() {
        let allow = serde_json::to_value(StopDecision::NoChangesAllow.into_output()).unwrap();
        assert_eq!(allow, serde_json::json!({}));

        let block = StopDecision::GateFailureBlock { reason: "fix it".to_string(), denial_count: 1 }
            .into_output();
        assert_eq!(
            serde_json::to_value(block).unwrap(),
            serde_json::json!({"decision": "block", "reason": "fix it"})
        );
    }
}
