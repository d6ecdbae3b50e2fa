//! `PostToolUse` hook.
//!
//! Never blocks. When the agent edits the script manifest, it is told that
//! the set of runnable quality gates may have changed.

use crate::hooks::{HookInput, HookOutput};
use std::path::Path;

/// Tools that write files.
const WRITE_TOOLS: [&str; 4] = ["Write", "Edit", "MultiEdit", "NotebookEdit"];

/// Run the post tool use hook.
pub fn run_post_tool_use_hook(input: &HookInput, manifest: &str) -> HookOutput {
    let tool_name = input.tool_name.as_deref().unwrap_or("");
    if !WRITE_TOOLS.contains(&tool_name) {
        return HookOutput::proceed();
    }

    let touches_manifest = input
        .file_path()
        .and_then(|p| Path::new(p).file_name())
        .is_some_and(|name| Some(name) == Path::new(manifest).file_name());
    if !touches_manifest {
        return HookOutput::proceed();
    }

    HookOutput::with_context(
        "PostToolUse",
        format!(
            "`{manifest}` changed. Quality gates only run for scripts it defines, \
             so removing or renaming a script disables that gate."
        ),
    )
}
