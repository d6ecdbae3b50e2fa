//! Testing utilities and mock implementations.
//!
//! These types are provided for use in tests. They may appear unused in
//! the library itself but are consumed by unit and integration tests.

#![allow(dead_code)]
#![allow(clippy::needless_pass_by_ref_mut)] // &mut self for ergonomics with RefCell

use crate::error::Result;
use crate::state::SessionState;
use crate::traits::{CommandOutput, CommandRunner, ScriptRegistry, StateStore};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// A mock command runner for testing.
///
/// Records expected commands and their outputs, then verifies they were called.
#[derive(Debug, Default)]
pub struct MockCommandRunner {
    expectations: RefCell<Vec<(String, Vec<String>, CommandOutput)>>,
    call_index: RefCell<usize>,
}

impl MockCommandRunner {
    /// Create a new mock command runner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expected command and its output.
    pub fn expect(&mut self, program: &str, args: &[&str], output: CommandOutput) {
        self.expectations.borrow_mut().push((
            program.to_string(),
            args.iter().map(|s| (*s).to_string()).collect(),
            output,
        ));
    }

    /// Number of commands run so far.
    pub fn calls(&self) -> usize {
        *self.call_index.borrow()
    }

    /// Verify all expected commands were called.
    ///
    /// # Panics
    ///
    /// Panics if not all expected commands were called.
    pub fn verify(&self) {
        let index = *self.call_index.borrow();
        let expected = self.expectations.borrow().len();
        assert_eq!(
            index, expected,
            "Expected {expected} command calls, but only {index} were made"
        );
    }
}

impl CommandRunner for MockCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        let mut index = self.call_index.borrow_mut();
        let expectations = self.expectations.borrow();

        assert!(
            *index < expectations.len(),
            "Unexpected command call: {program} {args:?} (no more expectations)"
        );

        let (exp_program, exp_args, output) = &expectations[*index];
        let args_vec: Vec<String> = args.iter().map(|s| (*s).to_string()).collect();

        assert!(
            !(program != exp_program || &args_vec != exp_args),
            "Command mismatch at index {}:\n  Expected: {} {:?}\n  Got: {} {:?}",
            *index,
            exp_program,
            exp_args,
            program,
            args
        );

        *index += 1;
        Ok(output.clone())
    }
}

/// A command runner that always fails, for testing error paths.
#[derive(Debug, Default)]
pub struct FailingCommandRunner {
    error_message: String,
}

impl FailingCommandRunner {
    /// Create a new failing command runner with the specified error message.
    #[must_use]
    pub fn new(error_message: impl Into<String>) -> Self {
        Self { error_message: error_message.into() }
    }
}

impl CommandRunner for FailingCommandRunner {
    fn run(
        &self,
        _program: &str,
        _args: &[&str],
        _timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        Err(std::io::Error::other(self.error_message.clone()).into())
    }
}

/// An in-memory state store.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    states: RefCell<HashMap<String, SessionState>>,
    fail_writes: bool,
}

impl MemoryStateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose writes always fail.
    #[must_use]
    pub fn failing_writes() -> Self {
        Self { states: RefCell::default(), fail_writes: true }
    }

    /// Seed a session with the given denial count.
    pub fn with_denials(self, session_id: &str, denial_count: u32) -> Self {
        self.states.borrow_mut().insert(
            session_id.to_string(),
            SessionState { session_id: session_id.to_string(), denial_count, updated_at: None },
        );
        self
    }

    /// The stored denial count for a session, if a record exists.
    pub fn denial_count(&self, session_id: &str) -> Option<u32> {
        self.states.borrow().get(session_id).map(|s| s.denial_count)
    }
}

impl StateStore for MemoryStateStore {
    fn get_session_state(&self, session_id: &str) -> Option<SessionState> {
        self.states.borrow().get(session_id).cloned()
    }

    fn save_session_state(&self, session_id: &str, state: &SessionState) -> Result<()> {
        if self.fail_writes {
            return Err(std::io::Error::other("state store is read-only").into());
        }
        self.states.borrow_mut().insert(session_id.to_string(), state.clone());
        Ok(())
    }

    fn clear_session_state(&self, session_id: &str) -> Result<()> {
        self.states.borrow_mut().remove(session_id);
        Ok(())
    }
}

/// A script registry backed by a fixed set of names.
#[derive(Debug, Default, Clone)]
pub struct StaticScriptRegistry {
    scripts: HashSet<String>,
}

impl StaticScriptRegistry {
    /// Create a registry containing the given script names.
    #[must_use]
    pub fn new(scripts: &[&str]) -> Self {
        Self { scripts: scripts.iter().map(|s| (*s).to_string()).collect() }
    }
}

impl ScriptRegistry for StaticScriptRegistry {
    fn has_script(&self, name: &str) -> bool {
        self.scripts.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_command_runner() {
        let mut runner = MockCommandRunner::new();
        runner.expect(
            "echo",
            &["hello"],
            CommandOutput { exit_code: 0, stdout: "hello\n".to_string(), stderr: String::new() },
        );

        let output = runner.run("echo", &["hello"], None).unwrap();
        assert_eq!(output.stdout, "hello\n");
        assert_eq!(runner.calls(), 1);
        runner.verify();
    }

    #[test]
    #[should_panic(expected = "Command mismatch")]
    fn test_mock_command_runner_wrong_command() {
        let mut runner = MockCommandRunner::new();
        runner.expect("echo", &["hello"], CommandOutput::default());

        let _ = runner.run("echo", &["world"], None);
    }

    #[test]
    #[should_panic(expected = "no more expectations")]
    fn test_mock_command_runner_too_many_calls() {
        let runner = MockCommandRunner::new();
        let _ = runner.run("echo", &["hello"], None);
    }

    #[test]
    #[should_panic(expected = "Expected 1 command calls")]
    fn test_mock_command_runner_verify_fails() {
        let mut runner = MockCommandRunner::new();
        runner.expect("echo", &["hello"], CommandOutput::default());
        runner.verify();
    }

    #[test]
    fn test_failing_command_runner() {
        let runner = FailingCommandRunner::new("test error");
        let result = runner.run("any", &["args"], None);
        assert!(result.is_err());
    }

    #[test]
    fn test_memory_state_store() {
        let store = MemoryStateStore::new().with_denials("s1", 2);
        assert_eq!(store.denial_count("s1"), Some(2));

        let updated = store.update_session_state("s1", &mut |s| s.denial_count += 1).unwrap();
        assert_eq!(updated.denial_count, 3);

        store.clear_session_state("s1").unwrap();
        assert!(store.get_session_state("s1").is_none());
    }

    #[test]
    fn test_memory_state_store_failing_writes() {
        let store = MemoryStateStore::failing_writes();
        assert!(store.save_session_state("s1", &SessionState::new("s1")).is_err());
    }

    #[test]
    fn test_static_script_registry() {
        let registry = StaticScriptRegistry::new(&["lint", "test"]);
        assert!(registry.has_script("lint"));
        assert!(!registry.has_script("typecheck"));
    }
}
