//! Format selection and template rendering.
//!
//! - `priority`: picks the format for a sender and channel
//! - `formatter`: fills a template with message fields

pub mod formatter;
pub mod priority;

use crate::user::ChatUser;

pub use formatter::{FormatContext, MessageFormatter};
pub use priority::{FormatResolver, PriorityFormat};

/// Expands host-specific placeholders in a template before the built-in
/// ones are substituted.
pub trait PlaceholderExpander: Send + Sync {
    fn expand(&self, template: &str, sender: &ChatUser) -> String;
}

/// Leaves templates unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPlaceholders;

impl PlaceholderExpander for NoPlaceholders {
    fn expand(&self, template: &str, _sender: &ChatUser) -> String {
        template.to_string()
    }
}
