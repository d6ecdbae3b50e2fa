//! Command execution for the CLI.
//!
//! This module handles running CLI commands and producing output.

use crate::cli::Command;
use crate::command::RealCommandRunner;
use crate::config::{self, ProjectConfig};
use crate::error::Result;
use crate::gates::PackageJsonRegistry;
use crate::git;
use crate::hook_logging;
use crate::hooks::{
    parse_hook_input, run_post_tool_use_hook, run_pre_tool_use, run_session_start_hook,
    run_stop_hook, run_user_prompt_submit_hook, StopDecision, StopHookConfig,
};
use crate::paths;
use crate::state::FileStateStore;
use crate::traits::StateStore;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

/// Printed when the stop hook faults: an empty document allows the stop.
pub const STOP_FALLBACK: &str = "{}";

/// Printed when any other hook faults.
pub const CONTINUE_FALLBACK: &str = r#"{"continue":true}"#;

/// Output from running the CLI, with separate stdout and stderr messages.
#[derive(Debug)]
pub struct CliOutput {
    /// Exit code for the process.
    pub exit_code: ExitCode,
    /// Messages to print to stdout.
    pub stdout: Vec<String>,
    /// Messages to print to stderr.
    pub stderr: Vec<String>,
}

impl CliOutput {
    fn success(stdout: Vec<String>, stderr: Vec<String>) -> Self {
        Self { exit_code: ExitCode::SUCCESS, stdout, stderr }
    }

    fn error(message: String) -> Self {
        Self { exit_code: ExitCode::from(1), stdout: vec![], stderr: vec![message] }
    }
}

/// Run a CLI command against the current directory.
pub fn run(command: Command, stdin: &str) -> CliOutput {
    run_in(command, stdin, Path::new("."))
}

/// Run a CLI command against the project rooted at `base_dir`.
pub fn run_in(command: Command, stdin: &str, base_dir: &Path) -> CliOutput {
    let config = ProjectConfig::load_or_default(base_dir);

    // Log hook events for debugging when enabled
    if let Some(hook_type) = command.hook_type() {
        hook_logging::log_hook_event(&config, hook_type, stdin, base_dir);
    }

    match command {
        Command::Version => run_version(),
        Command::EnsureConfig => run_ensure_config(base_dir),
        Command::ResetState { session_id } => run_reset_state(&session_id, &config, base_dir),
        Command::Stop => run_stop_cmd(stdin, &config, base_dir),
        Command::SessionStart => hook_result(
            &Command::SessionStart,
            parse_hook_input(stdin).and_then(|input| {
                let store = state_store(&config, base_dir);
                run_session_start_hook(&input, &StopHookConfig::from(&config), &store)
            }),
        ),
        Command::UserPromptSubmit => hook_result(
            &Command::UserPromptSubmit,
            parse_hook_input(stdin).and_then(|input| {
                let store = state_store(&config, base_dir);
                run_user_prompt_submit_hook(&input, config.max_stop_denials, &store)
            }),
        ),
        Command::PreToolUse => hook_result(
            &Command::PreToolUse,
            parse_hook_input(stdin).and_then(|input| run_pre_tool_use(&input)),
        ),
        Command::PostToolUse => hook_result(
            &Command::PostToolUse,
            parse_hook_input(stdin).map(|input| run_post_tool_use_hook(&input, &config.manifest)),
        ),
    }
}

/// The state store configured for this project.
///
/// A relative `state_dir` is resolved against the project root.
fn state_store(config: &ProjectConfig, base_dir: &Path) -> FileStateStore {
    let dir = config
        .state_dir
        .as_ref()
        .map_or_else(paths::default_state_dir, |dir| base_dir.join(dir));
    FileStateStore::with_dir(dir)
}

/// Turn a hook result into CLI output, substituting the fallback on error.
fn hook_result<T: Serialize>(command: &Command, result: Result<T>) -> CliOutput {
    match result.and_then(|output| serde_json::to_string(&output).map_err(Into::into)) {
        Ok(json) => CliOutput::success(vec![json], vec![]),
        Err(e) => fault_output(command, &e),
    }
}

/// The output for a command that faulted before producing a result.
///
/// Hooks print their fallback document; every command exits 1.
pub fn fault_output(command: &Command, error: &dyn std::fmt::Display) -> CliOutput {
    let hook_type = command.hook_type().unwrap_or("unknown");
    tracing::error!(hook = hook_type, error = %error, "Hook failed; writing fallback output");
    CliOutput {
        exit_code: ExitCode::from(1),
        stdout: command.fallback_json().map(str::to_string).into_iter().collect(),
        stderr: vec![format!("Error running {hook_type} hook: {error}")],
    }
}

// === Utility Commands ===

fn run_version() -> CliOutput {
    CliOutput::success(vec![], vec![format!("session-hooks v{}", crate::VERSION)])
}

fn run_ensure_config(base_dir: &Path) -> CliOutput {
    match config::ensure_config_in(base_dir) {
        Ok(config) => {
            let gates: Vec<&str> = config.gates.iter().map(|g| g.name.as_str()).collect();
            let messages = vec![
                format!("Config ensured at {}", config::CONFIG_FILE_PATH),
                format!("  git_repo: {}", git::is_git_repo(&RealCommandRunner::in_dir(base_dir))),
                format!("  max_stop_denials: {}", config.max_stop_denials),
                format!("  script_runner: {}", config.script_runner),
                format!(
                    "  gates: {}",
                    if gates.is_empty() { "(none)".to_string() } else { gates.join(", ") }
                ),
            ];
            CliOutput::success(vec![], messages)
        }
        Err(e) => CliOutput::error(format!("Error ensuring config: {e}")),
    }
}

fn run_reset_state(session_id: &str, config: &ProjectConfig, base_dir: &Path) -> CliOutput {
    let store = state_store(config, base_dir);
    match store.clear_session_state(session_id) {
        Ok(()) => CliOutput::success(vec![], vec![format!("Cleared state for session {session_id}")]),
        Err(e) => CliOutput::error(format!("Error clearing session state: {e}")),
    }
}

// === Hook Commands ===

fn run_stop_cmd(stdin: &str, config: &ProjectConfig, base_dir: &Path) -> CliOutput {
    let result = parse_hook_input(stdin).and_then(|input| {
        let runner = RealCommandRunner::in_dir(base_dir);
        let store = state_store(config, base_dir);
        let registry = PackageJsonRegistry::in_dir(base_dir, &config.manifest);
        run_stop_hook(&input, &StopHookConfig::from(config), &runner, &store, &registry)
    });
    hook_result(&Command::Stop, result.map(StopDecision::into_output))
}
