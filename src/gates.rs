//! Quality gate pipeline.
//!
//! A gate is a named external check (type-check, lint, tests, ...) backed by
//! a script in the project's manifest. Gates run strictly in order and the
//! pipeline stops at the first failure. A gate whose script is not defined is
//! skipped and counts as passed.

use crate::traits::{CommandRunner, ScriptRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default program used to run manifest scripts.
pub const DEFAULT_SCRIPT_RUNNER: &str = "npm";

/// Default manifest holding the script registry.
pub const DEFAULT_MANIFEST: &str = "package.json";

/// One named check in the quality gate pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGate {
    /// Display name of the gate.
    pub name: String,
    /// Manifest script backing the gate. Defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Explicit program and arguments. When set, the registry is not consulted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

impl QualityGate {
    /// A gate backed by the manifest script of the same name.
    #[must_use]
    pub fn script(name: &str) -> Self {
        Self { name: name.to_string(), script: None, command: None }
    }

    /// A gate running an explicit command.
    #[must_use]
    pub fn command(name: &str, argv: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            script: None,
            command: Some(argv.iter().map(|s| (*s).to_string()).collect()),
        }
    }

    /// The manifest script name for this gate.
    #[must_use]
    pub fn script_name(&self) -> &str {
        self.script.as_deref().unwrap_or(&self.name)
    }
}

/// The conventional pipeline: type-check, lint, unused exports, tests.
#[must_use]
pub fn default_gates() -> Vec<QualityGate> {
    ["typecheck", "lint", "knip", "test"].into_iter().map(QualityGate::script).collect()
}

/// Outcome of running a single gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityGateResult {
    /// The gate's name.
    pub name: String,
    /// Whether the gate passed. Skipped gates count as passed.
    pub passed: bool,
    /// Combined stdout and stderr, or an explanation of why it could not run.
    pub output: String,
    /// Whether the gate was skipped because its script is not defined.
    pub skipped: bool,
}

impl QualityGateResult {
    fn skipped(name: &str) -> Self {
        Self { name: name.to_string(), passed: true, output: String::new(), skipped: true }
    }

    /// Whether this result should stop the pipeline.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !self.passed && !self.skipped
    }
}

/// Outcome of running the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Every gate passed or was skipped.
    AllPassed,
    /// The first gate that failed; later gates did not run.
    Failed(QualityGateResult),
}

/// Everything a gate needs to run.
pub struct GateContext<'a> {
    /// Runs the gate commands.
    pub runner: &'a dyn CommandRunner,
    /// Decides whether a script-backed gate is configured.
    pub registry: &'a dyn ScriptRegistry,
    /// Program used to run manifest scripts (`<runner> run <script>`).
    pub script_runner: &'a str,
    /// Per-gate deadline. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Run one gate.
///
/// Never fails: a gate that cannot be run is reported as a failing result
/// whose output explains the error.
pub fn run_quality_gate(gate: &QualityGate, ctx: &GateContext<'_>) -> QualityGateResult {
    let argv: Vec<&str> = match &gate.command {
        Some(command) => command.iter().map(String::as_str).collect(),
        None => {
            let script = gate.script_name();
            if !ctx.registry.has_script(script) {
                tracing::info!(gate = %gate.name, script, "Quality gate skipped: script not defined");
                return QualityGateResult::skipped(&gate.name);
            }
            vec![ctx.script_runner, "run", script]
        }
    };

    let Some((program, args)) = argv.split_first() else {
        tracing::warn!(gate = %gate.name, "Quality gate has an empty command");
        return QualityGateResult {
            name: gate.name.clone(),
            passed: false,
            output: format!("Quality gate `{}` has an empty command.", gate.name),
            skipped: false,
        };
    };

    tracing::info!(gate = %gate.name, command = %argv.join(" "), "Running quality gate");

    let result = match ctx.runner.run(program, args, ctx.timeout) {
        Ok(output) => QualityGateResult {
            name: gate.name.clone(),
            passed: output.success(),
            output: output.combined_output(),
            skipped: false,
        },
        Err(e) => QualityGateResult {
            name: gate.name.clone(),
            passed: false,
            output: format!("Failed to run `{}`: {e}", argv.join(" ")),
            skipped: false,
        },
    };

    if result.passed {
        tracing::info!(gate = %result.name, "Quality gate passed");
    } else {
        tracing::warn!(gate = %result.name, "Quality gate failed");
    }
    result
}

/// Run gates in order, stopping at the first failure.
pub fn run_quality_gates(gates: &[QualityGate], ctx: &GateContext<'_>) -> GateOutcome {
    for gate in gates {
        let result = run_quality_gate(gate, ctx);
        if result.is_failure() {
            return GateOutcome::Failed(result);
        }
    }
    GateOutcome::AllPassed
}

/// Script registry read from the `scripts` object of a `package.json`-style manifest.
#[derive(Debug, Clone)]
pub struct PackageJsonRegistry {
    manifest: PathBuf,
}

impl PackageJsonRegistry {
    /// Create a registry for the manifest at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { manifest: path.into() }
    }

    /// Create a registry for `manifest` inside `base_dir`.
    #[must_use]
    pub fn in_dir(base_dir: &Path, manifest: &str) -> Self {
        Self::new(base_dir.join(manifest))
    }

    /// Read the manifest's script names. A missing or invalid manifest has none.
    fn scripts(&self) -> Option<serde_json::Map<String, serde_json::Value>> {
        let content = std::fs::read_to_string(&self.manifest).ok()?;
        let manifest: serde_json::Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(path = %self.manifest.display(), error = %e, "Invalid manifest");
                return None;
            }
        };
        match manifest.get("scripts") {
            Some(serde_json::Value::Object(scripts)) => Some(scripts.clone()),
            _ => None,
        }
    }
}

impl ScriptRegistry for PackageJsonRegistry {
    fn has_script(&self, name: &str) -> bool {
        self.scripts().is_some_and(|scripts| scripts.contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingCommandRunner, MockCommandRunner, StaticScriptRegistry};
    use crate::traits::CommandOutput;
    use tempfile::TempDir;

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput { exit_code: 0, stdout: stdout.to_string(), stderr: String::new() }
    }

    fn fail(stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput { exit_code: 1, stdout: stdout.to_string(), stderr: stderr.to_string() }
    }

    fn ctx<'a>(
        runner: &'a dyn CommandRunner,
        registry: &'a dyn ScriptRegistry,
    ) -> GateContext<'a> {
        GateContext { runner, registry, script_runner: "npm", timeout: None }
    }

    #[test]
    fn test_default_gates_order() {
        let names: Vec<_> = default_gates().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["typecheck", "lint", "knip", "test"]);
    }

    #[test]
    fn test_unregistered_gate_is_skipped_without_spawning() {
        let runner = MockCommandRunner::new();
        let registry = StaticScriptRegistry::default();

        let result = run_quality_gate(&QualityGate::script("lint"), &ctx(&runner, &registry));
        assert!(result.skipped);
        assert!(result.passed);
        assert!(result.output.is_empty());
        assert_eq!(runner.calls(), 0);
    }

    #[test]
    fn test_registered_gate_runs_script() {
        let mut runner = MockCommandRunner::new();
        runner.expect("npm", &["run", "lint"], fail("2 errors", "  exit 1\n"));
        let registry = StaticScriptRegistry::new(&["lint"]);

        let result = run_quality_gate(&QualityGate::script("lint"), &ctx(&runner, &registry));
        assert!(!result.passed);
        assert!(!result.skipped);
        assert_eq!(result.output, "2 errors\nexit 1");
        runner.verify();
    }

    #[test]
    fn test_gate_uses_custom_script_name() {
        let mut runner = MockCommandRunner::new();
        runner.expect("pnpm", &["run", "check:types"], ok(""));
        let registry = StaticScriptRegistry::new(&["check:types"]);
        let gate = QualityGate {
            name: "typecheck".to_string(),
            script: Some("check:types".to_string()),
            command: None,
        };

        let context = GateContext { script_runner: "pnpm", ..ctx(&runner, &registry) };
        let result = run_quality_gate(&gate, &context);
        assert!(result.passed);
        runner.verify();
    }

    #[test]
    fn test_explicit_command_ignores_registry() {
        let mut runner = MockCommandRunner::new();
        runner.expect("cargo", &["clippy", "--", "-D", "warnings"], ok("clean"));
        let registry = StaticScriptRegistry::default();
        let gate = QualityGate::command("clippy", &["cargo", "clippy", "--", "-D", "warnings"]);

        let result = run_quality_gate(&gate, &ctx(&runner, &registry));
        assert!(result.passed);
        assert!(!result.skipped);
        assert_eq!(result.output, "clean");
    }

    #[test]
    fn test_empty_command_fails() {
        let runner = MockCommandRunner::new();
        let registry = StaticScriptRegistry::default();
        let gate = QualityGate::command("broken", &[]);

        let result = run_quality_gate(&gate, &ctx(&runner, &registry));
        assert!(result.is_failure());
        assert!(result.output.contains("empty command"));
    }

    #[test]
    fn test_spawn_error_is_a_failure() {
        let runner = FailingCommandRunner::new("npm: not found");
        let registry = StaticScriptRegistry::new(&["test"]);

        let result = run_quality_gate(&QualityGate::script("test"), &ctx(&runner, &registry));
        assert!(result.is_failure());
        assert!(result.output.contains("npm run test"));
        assert!(result.output.contains("npm: not found"));
    }

    #[test]
    fn test_pipeline_stops_at_first_failure() {
        let mut runner = MockCommandRunner::new();
        runner.expect("npm", &["run", "a"], ok(""));
        runner.expect("npm", &["run", "b"], fail("b broke", ""));
        // No expectation for "c": running it would panic.
        let registry = StaticScriptRegistry::new(&["a", "b", "c"]);
        let gates: Vec<_> = ["a", "b", "c"].into_iter().map(QualityGate::script).collect();

        let outcome = run_quality_gates(&gates, &ctx(&runner, &registry));
        match outcome {
            GateOutcome::Failed(result) => {
                assert_eq!(result.name, "b");
                assert_eq!(result.output, "b broke");
            }
            GateOutcome::AllPassed => panic!("expected gate b to fail"),
        }
        runner.verify();
    }

    #[test]
    fn test_all_skipped_pipeline_passes() {
        let runner = MockCommandRunner::new();
        let registry = StaticScriptRegistry::default();

        let outcome = run_quality_gates(&default_gates(), &ctx(&runner, &registry));
        assert_eq!(outcome, GateOutcome::AllPassed);
        assert_eq!(runner.calls(), 0);
    }

    #[test]
    fn test_skipped_gates_do_not_mask_later_failures() {
        let mut runner = MockCommandRunner::new();
        runner.expect("npm", &["run", "test"], fail("", "1 failing"));
        let registry = StaticScriptRegistry::new(&["test"]);

        let outcome = run_quality_gates(&default_gates(), &ctx(&runner, &registry));
        assert!(matches!(outcome, GateOutcome::Failed(ref r) if r.name == "test"));
    }

    #[test]
    fn test_package_json_registry() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"name": "demo", "scripts": {"lint": "eslint .", "test": "vitest"}}"#,
        )
        .unwrap();

        let registry = PackageJsonRegistry::in_dir(dir.path(), DEFAULT_MANIFEST);
        assert!(registry.has_script("lint"));
        assert!(registry.has_script("test"));
        assert!(!registry.has_script("typecheck"));
    }

    #[test]
    fn test_package_json_registry_missing_or_invalid() {
        let dir = TempDir::new().unwrap();
        let registry = PackageJsonRegistry::in_dir(dir.path(), DEFAULT_MANIFEST);
        assert!(!registry.has_script("lint"));

        std::fs::write(dir.path().join("package.json"), "{ nope").unwrap();
        assert!(!registry.has_script("lint"));

        std::fs::write(dir.path().join("package.json"), r#"{"scripts": []}"#).unwrap();
        assert!(!registry.has_script("lint"));
    }

    #[test]
    fn test_gate_yaml_shape() {
        let gates: Vec<QualityGate> = serde_yaml::from_str(
            "- name: lint\n- name: types\n  script: typecheck\n- name: fmt\n  command: [cargo, fmt, --check]\n",
        )
        .unwrap();
        assert_eq!(gates[0], QualityGate::script("lint"));
        assert_eq!(gates[1].script_name(), "typecheck");
        assert_eq!(gates[2], QualityGate::command("fmt", &["cargo", "fmt", "--check"]));
    }
}
