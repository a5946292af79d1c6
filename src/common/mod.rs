//! Common utilities and types shared across the crate.

pub mod error;
pub mod permissions;
pub mod regex;
pub mod types;

pub use error::{ChatError, ChatResult, ConfigError};
pub use types::{Location, PlayerHandle, UserId};
