//! Git operations module.

mod status;

pub use status::{changed_files, list_changed_files, parse_porcelain};

use crate::traits::CommandRunner;

/// Check if we're in a git repository.
pub fn is_git_repo(runner: &dyn CommandRunner) -> bool {
    runner.run("git", &["rev-parse", "--git-dir"], None).map(|o| o.success()).unwrap_or(false)
}
