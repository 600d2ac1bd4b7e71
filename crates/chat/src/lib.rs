//! Helpdesk real-time chat synchronization core
//!
//! Reconciles optimistic local sends with the authoritative message
//! store and a live event channel, presenting one coherent ordered
//! transcript per support ticket.
//!
//! # Architecture
//!
//! - **Transcript**: ordered, deduplicated message collection for one ticket
//! - **SendPipeline**: optimistic insert, then promote or roll back
//! - **EventBridge**: single shared reconnecting channel, room fan-out
//! - **TypingTracker**: per-ticket "who is typing" set
//! - **ChatSession**: lifecycle of one open conversation view

pub mod bridge;
pub mod config;
pub mod send;
pub mod session;
pub mod store;
pub mod transcript;
pub mod typing;

#[cfg(test)]
pub(crate) mod testutil;

pub use bridge::{
    BridgeEvent, ChannelTransport, ClientEvent, ConnectionState, EventBridge, ReconnectPolicy,
    ServerEvent,
};
pub use config::ChatConfig;
pub use send::{SendOutcome, SendPipeline};
pub use session::ChatSession;
pub use store::{HttpMessageStore, MessageStore};
pub use transcript::{Transcript, TranscriptEntry};
pub use typing::TypingTracker;
