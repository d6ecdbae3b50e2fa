//! # `session_hooks`
//!
//! Session lifecycle hooks for Claude. The stop hook refuses to let the
//! agent finish while uncommitted changes fail a quality gate, up to a
//! per-session ceiling; the remaining hooks add guard rails and context.

#[cfg(feature = "cli")]
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod gates;
pub mod git;
pub mod hook_logging;
pub mod hooks;
pub mod logging;
pub mod paths;
pub mod state;
pub mod templates;
pub mod testing;
pub mod traits;

pub use command::RealCommandRunner;
pub use config::ProjectConfig;
pub use error::{Error, Result};
pub use state::{FileStateStore, SessionState};
pub use traits::{CommandOutput, CommandRunner, ScriptRegistry, StateStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
