//! Core traits for testability and abstraction.

use crate::error::Result;
use crate::state::SessionState;
use std::time::Duration;

/// Output from a command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// The exit code of the command.
    pub exit_code: i32,
    /// The stdout output.
    pub stdout: String,
    /// The stderr output.
    pub stderr: String,
}

impl CommandOutput {
    /// Check if the command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined stdout and stderr, each trimmed, stdout first.
    #[must_use]
    pub fn combined_output(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            stdout.to_string()
        } else if stdout.is_empty() {
            stderr.to_string()
        } else {
            format!("{stdout}\n{stderr}")
        }
    }
}

/// Trait for running shell commands.
///
/// This trait abstracts command execution for testability.
pub trait CommandRunner {
    /// Run a command with the given arguments and timeout.
    ///
    /// # Arguments
    ///
    /// * `program` - The program to run.
    /// * `args` - The arguments to pass.
    /// * `timeout` - Optional timeout duration. `None` waits indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned, or if it runs past
    /// the timeout.
    fn run(&self, program: &str, args: &[&str], timeout: Option<Duration>)
        -> Result<CommandOutput>;
}

/// Trait for the named-script registry of a project (e.g. `package.json` scripts).
pub trait ScriptRegistry {
    /// Check whether a script with the given name is defined.
    fn has_script(&self, name: &str) -> bool;
}

/// Trait for persistent per-session state storage.
///
/// Reads never fail: a record that is missing or cannot be decoded is
/// reported as absent. Writes report their errors.
pub trait StateStore {
    /// Get the state record for a session, if one exists and decodes.
    fn get_session_state(&self, session_id: &str) -> Option<SessionState>;

    /// Persist the state record for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn save_session_state(&self, session_id: &str, state: &SessionState) -> Result<()>;

    /// Remove the state record for a session. A missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing record cannot be removed.
    fn clear_session_state(&self, session_id: &str) -> Result<()>;

    /// Read-modify-write the state record for a session.
    ///
    /// Starts from a fresh record when none exists. There is no locking, so
    /// concurrent updates to the same session are last-writer-wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated record cannot be written.
    fn update_session_state(
        &self,
        session_id: &str,
        update: &mut dyn FnMut(&mut SessionState),
    ) -> Result<SessionState> {
        let mut state = self
            .get_session_state(session_id)
            .unwrap_or_else(|| SessionState::new(session_id));
        update(&mut state);
        self.save_session_state(session_id, &state)?;
        Ok(state)
    }
}
