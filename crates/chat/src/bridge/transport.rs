//! Live channel transport seam
//!
//! The concrete socket implementation lives with the embedding
//! platform; the bridge only needs connect/emit/recv. Tests drive the
//! bridge through a scriptable fake.

use async_trait::async_trait;
use helpdesk_shared::ChatResult;

use super::events::{ClientEvent, ServerEvent};

/// Bidirectional transport underneath the [`EventBridge`](super::EventBridge)
///
/// One instance backs the whole process; room scoping happens at the
/// event level, not by opening multiple transports.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Establish (or re-establish) the underlying connection
    ///
    /// Called once at startup and again after every transport loss.
    /// Each call is a single attempt; the bridge owns the retry policy.
    async fn connect(&self) -> ChatResult<()>;

    /// Emit a client event over the live channel
    ///
    /// Fails while disconnected; callers treat emission as best-effort
    /// because room membership is re-announced on reconnect.
    async fn emit(&self, event: ClientEvent) -> ChatResult<()>;

    /// Receive the next inbound event in arrival order
    ///
    /// Returns `None` when the transport is lost; the bridge then runs
    /// its reconnect policy and resumes receiving on success.
    async fn recv(&self) -> Option<ServerEvent>;
}
