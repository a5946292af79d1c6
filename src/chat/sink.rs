//! Outgoing message delivery.
//!
//! The core never waits on delivery: a sink takes each rendered message and
//! returns immediately.

use tokio::sync::mpsc;
use tracing::warn;

use crate::common::types::UserId;

/// What produced an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Channel,
    Private,
    SocialSpy,
}

/// A rendered message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub recipient: UserId,
    pub recipient_name: String,
    pub text: String,
    /// The recipient was mentioned in this message.
    pub mentioned: bool,
    pub kind: MessageKind,
}

/// Receives rendered messages. Fire-and-forget.
pub trait MessageSink: Send + Sync {
    fn send(&self, message: OutgoingMessage);
}

/// Sink that forwards into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutgoingMessage>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<OutgoingMessage>) -> Self {
        Self { tx }
    }
}

impl MessageSink for ChannelSink {
    fn send(&self, message: OutgoingMessage) {
        if let Err(e) = self.tx.send(message) {
            warn!(recipient = %e.0.recipient_name, "Dropping message, receiver closed");
        }
    }
}

/// Create a [`ChannelSink`] and the receiver draining it.
pub fn channel_sink() -> (ChannelSink, mpsc::UnboundedReceiver<OutgoingMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink::new(tx), rx)
}
