//! Message routing.
//!
//! ## Module Structure
//!
//! - `orchestrator`: [`ChatCore`], the entry point for every chat operation
//! - `state`: the configuration snapshot swapped on reload
//! - `target`: audience resolution
//! - `sink`: handing rendered messages to the host

pub mod orchestrator;
pub mod sink;
pub mod state;
pub mod target;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::{ChatCore, DeliveryOutcome, DeliveryReport, MuteSource};
pub use sink::{channel_sink, ChannelSink, MessageKind, MessageSink, OutgoingMessage};
pub use state::{ChatState, PrivateMessages};
pub use target::{Audience, TargetResolver};
