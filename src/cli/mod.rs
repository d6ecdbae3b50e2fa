//! Command-line interface for session-hooks.
//!
//! Every lifecycle hook is a hidden subcommand that reads one JSON document
//! from stdin and prints one JSON document to stdout. A few utility commands
//! are exposed for humans.

mod run;


pub use run::{fault_output, run, run_in, CliOutput, CONTINUE_FALLBACK, STOP_FALLBACK};

use clap::{Parser, Subcommand};

/// Session hooks with a quality gate on stop.
///
/// The hook commands are invoked by the assistant's plugin system and are
/// hidden from help output.
#[derive(Parser, Debug)]
#[command(name = "session-hooks")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // === Utility Commands ===
    /// Show version information.
    Version,

    /// Ensure config file exists (create with defaults if not).
    #[command(name = "ensure-config")]
    EnsureConfig,

    /// Forget the stored denial count for a session.
    #[command(name = "reset-state")]
    ResetState {
        /// The session whose record should be cleared
        session_id: String,
    },

    // === Hook Commands (receive JSON from stdin) ===
    /// Run the stop hook (stdin: JSON hook input).
    ///
    /// Blocks the stop while a quality gate fails on uncommitted changes.
    /// Not intended for direct use.
    #[command(hide = true)]
    Stop,

    /// Run the session start hook (stdin: JSON hook input).
    ///
    /// Not intended for direct use.
    #[command(name = "session-start", hide = true)]
    SessionStart,

    /// Run the user prompt submit hook (stdin: JSON hook input).
    ///
    /// Not intended for direct use.
    #[command(name = "user-prompt-submit", hide = true)]
    UserPromptSubmit,

    /// Run the pre-tool-use hook (stdin: JSON hook input).
    ///
    /// Not intended for direct use.
    #[command(name = "pre-tool-use", hide = true)]
    PreToolUse,

    /// Run the post-tool-use hook (stdin: JSON hook input).
    ///
    /// Not intended for direct use.
    #[command(name = "post-tool-use", hide = true)]
    PostToolUse,
}

impl Command {
    /// Returns true if this command requires stdin input.
    #[must_use]
    pub const fn needs_stdin(&self) -> bool {
        self.is_hook()
    }

    /// Returns true if this is a hook command (invoked by the plugin system).
    #[must_use]
    pub const fn is_hook(&self) -> bool {
        self.hook_type().is_some()
    }

    /// Returns the hook type name for logging, or None for non-hook commands.
    #[must_use]
    pub const fn hook_type(&self) -> Option<&'static str> {
        match self {
            Self::Stop => Some("stop"),
            Self::SessionStart => Some("session-start"),
            Self::UserPromptSubmit => Some("user-prompt-submit"),
            Self::PreToolUse => Some("pre-tool-use"),
            Self::PostToolUse => Some("post-tool-use"),
            Self::Version | Self::EnsureConfig | Self::ResetState { .. } => None,
        }
    }

    /// The document printed when a hook faults, or None for non-hook commands.
    ///
    /// A faulting stop hook allows the stop; every other hook lets the
    /// session continue.
    #[must_use]
    pub const fn fallback_json(&self) -> Option<&'static str> {
        match self {
            Self::Stop => Some(STOP_FALLBACK),
            Self::SessionStart | Self::UserPromptSubmit | Self::PreToolUse | Self::PostToolUse => {
                Some(CONTINUE_FALLBACK)
            }
            Self::Version | Self::EnsureConfig | Self::ResetState { .. } => None,
        }
    }
}
