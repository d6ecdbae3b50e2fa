//! Template rendering using Tera.
//!
//! User-facing messages are kept as Tera templates embedded in the binary.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use tera::{Context, Tera};

/// Embedded templates, keyed by name.
const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    ("messages/stop/gate_failed.tera", include_str!("../templates/messages/stop/gate_failed.tera")),
    ("messages/session_start.tera", include_str!("../templates/messages/session_start.tera")),
    ("messages/stop_denied_reminder.tera", include_str!("../templates/messages/stop_denied_reminder.tera")),
    ("messages/no_verify_block.tera", include_str!("../templates/messages/no_verify_block.tera")),
    ("messages/protect_config.tera", include_str!("../templates/messages/protect_config.tera")),
    ("messages/dangerous_command.tera", include_str!("../templates/messages/dangerous_command.tera")),
];

/// Template engine built once from the embedded templates.
static TERA: Lazy<std::result::Result<Tera, String>> = Lazy::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_templates(EMBEDDED_TEMPLATES.iter().copied()).map_err(|e| e.to_string())?;
    Ok(tera)
});

/// Render an embedded template.
///
/// # Errors
///
/// Returns an error if the template is unknown or fails to render.
pub fn render(name: &str, context: &Context) -> Result<String> {
    let tera = TERA.as_ref().map_err(|e| Error::Template(e.clone()))?;
    tera.render(name, context).map_err(|e| {
        // Tera's top-level message omits the cause; include the chain.
        let mut msg = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            msg.push_str(": ");
            msg.push_str(&cause.to_string());
            source = cause.source();
        }
        Error::Template(msg)
    })
}
