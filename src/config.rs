//! Configuration management for session-hooks.
//!
//! This module handles the `.claude/session-hooks.yaml` file which stores
//! project-specific settings for the hooks. Every key is optional.

use crate::error::{Error, Result};
use crate::gates::{self, QualityGate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file path relative to project root.
pub const CONFIG_FILE_PATH: &str = ".claude/session-hooks.yaml";

/// Default ceiling on consecutive blocked stops per session.
pub const DEFAULT_MAX_STOP_DENIALS: u32 = 5;

const fn default_max_stop_denials() -> u32 {
    DEFAULT_MAX_STOP_DENIALS
}

fn default_script_runner() -> String {
    gates::DEFAULT_SCRIPT_RUNNER.to_string()
}

fn default_manifest() -> String {
    gates::DEFAULT_MANIFEST.to_string()
}

/// Project configuration for the hooks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Blocked stops allowed per session before the stop hook gives up.
    #[serde(default = "default_max_stop_denials")]
    pub max_stop_denials: u32,

    /// Program used to run manifest scripts (`npm`, `pnpm`, `bun`, ...).
    #[serde(default = "default_script_runner")]
    pub script_runner: String,

    /// Manifest file holding the script registry, relative to the project root.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Ordered quality gate pipeline.
    #[serde(default = "gates::default_gates")]
    pub gates: Vec<QualityGate>,

    /// Per-gate timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_timeout_secs: Option<u64>,

    /// Run the gates even when the working-tree status cannot be determined.
    #[serde(default)]
    pub strict_change_detection: bool,

    /// Directory for session state files. Unset means the system temp directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,

    /// Append every hook invocation to the debug event log.
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            max_stop_denials: DEFAULT_MAX_STOP_DENIALS,
            script_runner: default_script_runner(),
            manifest: default_manifest(),
            gates: gates::default_gates(),
            gate_timeout_secs: None,
            strict_change_detection: false,
            state_dir: None,
            debug_logging: false,
        }
    }
}

impl ProjectConfig {
    /// Load config from a specific base directory, returning None if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or validated.
    pub fn load_from(base_dir: &Path) -> Result<Option<Self>> {
        let config_path = Self::config_path(base_dir);
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)?;
        // An empty file parses as YAML null; treat it as all defaults.
        if content.trim().is_empty() {
            return Ok(Some(Self::default()));
        }
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Load config, falling back to defaults if it is missing or broken.
    pub fn load_or_default(base_dir: &Path) -> Self {
        match Self::load_from(base_dir) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not load config; using defaults");
                Self::default()
            }
        }
    }

    /// Save config to a specific base directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, base_dir: &Path) -> Result<()> {
        let config_path = Self::config_path(base_dir);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the config file path for a base directory.
    pub fn config_path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE_PATH)
    }

    /// The per-gate timeout, if configured.
    #[must_use]
    pub fn gate_timeout(&self) -> Option<Duration> {
        self.gate_timeout_secs.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<()> {
        if let Some(gate) = self.gates.iter().find(|g| g.name.trim().is_empty()) {
            return Err(Error::Config(format!("quality gate with empty name: {gate:?}")));
        }
        if self.script_runner.trim().is_empty() {
            return Err(Error::Config("script_runner must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Ensure config exists in a specific directory, writing defaults if not.
///
/// Returns the config (either loaded or newly created).
///
/// # Errors
///
/// Returns an error if config cannot be loaded or saved.
pub fn ensure_config_in(base_dir: &Path) -> Result<ProjectConfig> {
    if let Some(config) = ProjectConfig::load_from(base_dir)? {
        return Ok(config);
    }

    let config = ProjectConfig::default();
    config.save_to(base_dir)?;
    Ok(config)
}
