//! Error types for `session_hooks`.

/// Errors that can occur in the session hooks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A command was killed after running past its deadline.
    #[error("Command '{command}' timed out after {timeout:?}")]
    CommandTimeout {
        /// The command that was run.
        command: String,
        /// The deadline it ran past.
        timeout: std::time::Duration,
    },

    /// A command exited unsuccessfully where success was required.
    #[error("Command '{command}' failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        /// The command that was run.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// The stderr output.
        stderr: String,
    },

    /// A template error occurred.
    #[error("Template error: {0}")]
    Template(String),

    /// The project configuration is invalid.
    #[error("Config error: {0}")]
    Config(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
