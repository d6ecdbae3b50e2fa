//! Hook implementations for Claude Code.
//!
//! Every hook reads one JSON document from stdin and answers with exactly one
//! JSON document on stdout.

mod no_verify;
mod post_tool_use;
mod pre_tool_use;
mod protect_config;
mod session_start;
mod stop;
mod user_prompt_submit;

pub use post_tool_use::run_post_tool_use_hook;
pub use pre_tool_use::run_pre_tool_use;
pub use session_start::run_session_start_hook;
pub use stop::{
    run_stop_hook, truncate_output, StopDecision, StopHookConfig, StopHookOutput,
    MAX_OUTPUT_CHARS, TRUNCATION_MARKER,
};
pub use user_prompt_submit::run_user_prompt_submit_hook;

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Input provided to hooks by Claude Code.
///
/// One shape covers every lifecycle point; fields a hook does not use are
/// simply absent in its payload. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HookInput {
    /// The session this invocation belongs to.
    #[serde(default)]
    pub session_id: String,
    /// Set when a stop hook already blocked this stop attempt.
    #[serde(default)]
    pub stop_hook_active: bool,
    /// How the session started (`startup`, `resume`, `clear`, `compact`).
    #[serde(default)]
    pub source: Option<String>,
    /// The tool being called (for tool-use hooks).
    #[serde(default)]
    pub tool_name: Option<String>,
    /// The tool input (for tool-use hooks).
    #[serde(default)]
    pub tool_input: Option<ToolInput>,
}

impl HookInput {
    /// The Bash command of the tool call, or `""`.
    #[must_use]
    pub fn command(&self) -> &str {
        self.tool_input.as_ref().and_then(|t| t.command.as_deref()).unwrap_or("")
    }

    /// The file path of the tool call, if any.
    #[must_use]
    pub fn file_path(&self) -> Option<&str> {
        self.tool_input.as_ref().and_then(|t| t.file_path.as_deref())
    }
}

/// Tool input for various tool types.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ToolInput {
    /// The command being executed (for Bash tool).
    #[serde(default)]
    pub command: Option<String>,
    /// The file path being written/edited (for Write/Edit tools).
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Output of the hooks that never block: `{"continue": true}` plus optional context.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HookOutput {
    /// Always true: these hooks let the session continue.
    #[serde(rename = "continue")]
    pub continue_: bool,
    /// Extra context for the agent.
    #[serde(rename = "hookSpecificOutput", skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<ContextOutput>,
}

/// Hook-specific context block.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContextOutput {
    /// The hook event name.
    #[serde(rename = "hookEventName")]
    pub hook_event_name: String,
    /// Context added to the conversation.
    #[serde(rename = "additionalContext")]
    pub additional_context: String,
}

impl HookOutput {
    /// Continue with nothing to add. Also the fallback document on faults.
    #[must_use]
    pub const fn proceed() -> Self {
        Self { continue_: true, hook_specific_output: None }
    }

    /// Continue and add context for the agent.
    #[must_use]
    pub fn with_context(event: &str, context: impl Into<String>) -> Self {
        Self {
            continue_: true,
            hook_specific_output: Some(ContextOutput {
                hook_event_name: event.to_string(),
                additional_context: context.into(),
            }),
        }
    }

    /// The added context, if any.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.hook_specific_output.as_ref().map(|o| o.additional_context.as_str())
    }
}

/// Output from a `PreToolUse` hook.
#[derive(Debug, Clone, Serialize)]
pub struct PreToolUseOutput {
    /// Hook-specific output.
    #[serde(rename = "hookSpecificOutput")]
    pub hook_specific_output: PermissionOutput,
}

/// Hook-specific output for `PreToolUse`.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionOutput {
    /// The hook event name.
    #[serde(rename = "hookEventName")]
    pub hook_event_name: String,
    /// The permission decision (`allow` or `deny`).
    #[serde(rename = "permissionDecision")]
    pub permission_decision: String,
    /// Why the decision was made.
    #[serde(rename = "permissionDecisionReason", skip_serializing_if = "Option::is_none")]
    pub permission_decision_reason: Option<String>,
}

impl PreToolUseOutput {
    fn new(decision: &str, reason: Option<String>) -> Self {
        Self {
            hook_specific_output: PermissionOutput {
                hook_event_name: "PreToolUse".to_string(),
                permission_decision: decision.to_string(),
                permission_decision_reason: reason,
            },
        }
    }

    /// Create an "allow" response.
    #[must_use]
    pub fn allow() -> Self {
        Self::new("allow", None)
    }

    /// Create a "deny" response.
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::new("deny", Some(reason.into()))
    }

    /// Check if this is a deny decision.
    #[must_use]
    pub fn is_deny(&self) -> bool {
        self.hook_specific_output.permission_decision == "deny"
    }

    /// The reason attached to the decision, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.hook_specific_output.permission_decision_reason.as_deref()
    }
}

/// Parse hook input from stdin.
///
/// # Errors
///
/// Returns an error if the input is empty or cannot be parsed as JSON.
pub fn parse_hook_input(input: &str) -> Result<HookInput> {
    let parsed: HookInput = serde_json::from_str(input)?;
    Ok(parsed)
}
