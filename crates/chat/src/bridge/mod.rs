//! Live event bridge
//!
//! One shared, reconnecting channel per client process. Conversation
//! sessions attach and detach interest; the bridge multiplexes room
//! membership outward and fans inbound events out to every subscribed
//! session in arrival order.
//!
//! # Architecture
//!
//! - **Events**: type-safe client/server event definitions
//! - **Transport**: the seam to the concrete socket implementation
//! - **EventBridge**: connection state machine, room set, listener registry

pub mod events;
pub mod transport;

pub use events::{BridgeEvent, ClientEvent, ConnectionState, ServerEvent};
pub use transport::ChannelTransport;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use helpdesk_shared::{ChatMessage, ChatResult, UserRef};
use tokio::sync::{mpsc, RwLock};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use uuid::Uuid;

/// Bounded fixed-delay reconnection policy
///
/// Defaults mirror the original channel collaborator's settings:
/// five attempts, one second apart.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

/// Process-scoped bridge between the live channel and open sessions
///
/// Constructed once at application start and injected into each
/// session; never torn down by the chat core. Room membership, not
/// connection identity, is what scopes events to a session.
pub struct EventBridge {
    transport: Arc<dyn ChannelTransport>,
    policy: ReconnectPolicy,
    state: RwLock<ConnectionState>,
    /// Rooms to re-announce after every reconnect
    rooms: RwLock<HashSet<Uuid>>,
    /// Subscribed session listeners indexed by listener id
    listeners: RwLock<HashMap<Uuid, mpsc::UnboundedSender<BridgeEvent>>>,
}

impl EventBridge {
    pub fn new(transport: Arc<dyn ChannelTransport>, policy: ReconnectPolicy) -> Arc<Self> {
        Arc::new(Self {
            transport,
            policy,
            state: RwLock::new(ConnectionState::Connecting),
            rooms: RwLock::new(HashSet::new()),
            listeners: RwLock::new(HashMap::new()),
        })
    }

    /// Establish the connection and start dispatching inbound events
    ///
    /// Runs the bounded retry policy; on success the pump task owns the
    /// transport's inbound side for the life of the process.
    pub async fn connect(self: &Arc<Self>) -> ChatResult<()> {
        match self.connect_with_retry().await {
            Ok(()) => {
                self.set_state(ConnectionState::Connected).await;
                self.rejoin_rooms().await;

                let bridge = Arc::clone(self);
                tokio::spawn(async move { bridge.pump().await });
                Ok(())
            }
            Err(e) => {
                self.set_state(ConnectionState::Disconnected).await;
                tracing::error!(error = %e, "Failed to connect live channel");
                Err(e)
            }
        }
    }

    async fn connect_with_retry(&self) -> ChatResult<()> {
        let strategy = FixedInterval::new(self.policy.delay).take(self.policy.max_attempts);
        Retry::spawn(strategy, || self.transport.connect()).await
    }

    /// Inbound loop: dispatch events, reconnect on transport loss
    async fn pump(self: Arc<Self>) {
        loop {
            match self.transport.recv().await {
                Some(event) => self.fan_out(BridgeEvent::Server(event)).await,
                None => {
                    tracing::warn!("Live channel transport lost");
                    self.set_state(ConnectionState::Disconnected).await;

                    match self.connect_with_retry().await {
                        Ok(()) => {
                            self.set_state(ConnectionState::Connected).await;
                            self.rejoin_rooms().await;
                        }
                        Err(e) => {
                            // Retry budget exhausted; stay disconnected.
                            tracing::error!(error = %e, "Gave up reconnecting live channel");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Current connection state
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    async fn set_state(&self, next: ConnectionState) {
        {
            let mut state = self.state.write().await;
            if *state == next {
                return;
            }
            tracing::info!(from = %state, to = %next, "Live channel state changed");
            *state = next;
        }
        self.fan_out(BridgeEvent::ConnectionStateChanged(next)).await;
    }

    /// Announce interest in a ticket room
    ///
    /// Idempotent; the room is tracked locally so membership survives
    /// reconnects even when the emit itself fails.
    pub async fn join_room(&self, ticket_id: Uuid) {
        self.rooms.write().await.insert(ticket_id);

        if let Err(e) = self.transport.emit(ClientEvent::JoinRoom { ticket_id }).await {
            tracing::debug!(
                ticket_id = %ticket_id,
                error = %e,
                "Join not delivered; will re-announce on reconnect"
            );
        }
    }

    /// Withdraw interest in a ticket room
    pub async fn leave_room(&self, ticket_id: Uuid) {
        self.rooms.write().await.remove(&ticket_id);

        if let Err(e) = self.transport.emit(ClientEvent::LeaveRoom { ticket_id }).await {
            tracing::debug!(ticket_id = %ticket_id, error = %e, "Leave not delivered");
        }
    }

    /// Re-announce membership for every open room after a (re)connect
    ///
    /// The server is not assumed to remember rooms across a reconnect.
    async fn rejoin_rooms(&self) {
        let rooms: Vec<Uuid> = self.rooms.read().await.iter().copied().collect();
        for ticket_id in rooms {
            if let Err(e) = self.transport.emit(ClientEvent::JoinRoom { ticket_id }).await {
                tracing::warn!(ticket_id = %ticket_id, error = %e, "Failed to re-join room");
            } else {
                tracing::debug!(ticket_id = %ticket_id, "Re-joined room after reconnect");
            }
        }
    }

    /// Broadcast a persisted message to other participants
    ///
    /// Announce-after-persist: the store has already accepted the
    /// message, so a delivery failure here is logged, not fatal.
    pub async fn announce_message(&self, message: ChatMessage) {
        let message_id = message.id;
        if let Err(e) = self.transport.emit(ClientEvent::SendMessage { message }).await {
            tracing::warn!(message_id = %message_id, error = %e, "Failed to announce message");
        }
    }

    /// Best-effort typing indicator, scoped to one ticket
    pub async fn typing_started(&self, ticket_id: Uuid, user: &UserRef) {
        let event = ClientEvent::Typing {
            ticket_id,
            user_id: user.id,
            name: user.name.clone(),
        };
        if let Err(e) = self.transport.emit(event).await {
            tracing::debug!(ticket_id = %ticket_id, error = %e, "Typing event not delivered");
        }
    }

    /// Best-effort stop-typing indicator, scoped to one ticket
    pub async fn typing_stopped(&self, ticket_id: Uuid, user: &UserRef) {
        let event = ClientEvent::StopTyping {
            ticket_id,
            user_id: user.id,
            name: user.name.clone(),
        };
        if let Err(e) = self.transport.emit(event).await {
            tracing::debug!(ticket_id = %ticket_id, error = %e, "Stop-typing event not delivered");
        }
    }

    /// Register a session listener; returns its id and event stream
    pub async fn subscribe(&self) -> (Uuid, mpsc::UnboundedReceiver<BridgeEvent>) {
        let listener_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut listeners = self.listeners.write().await;
        listeners.insert(listener_id, tx);
        tracing::debug!(
            listener_id = %listener_id,
            listener_count = listeners.len(),
            "Bridge listener subscribed"
        );

        (listener_id, rx)
    }

    /// Remove a session listener
    pub async fn unsubscribe(&self, listener_id: Uuid) {
        let mut listeners = self.listeners.write().await;
        if listeners.remove(&listener_id).is_some() {
            tracing::debug!(
                listener_id = %listener_id,
                listener_count = listeners.len(),
                "Bridge listener unsubscribed"
            );
        }
    }

    async fn fan_out(&self, event: BridgeEvent) {
        let mut listeners = self.listeners.write().await;
        // Drop listeners whose receiving session is gone
        listeners.retain(|listener_id, tx| {
            let alive = tx.send(event.clone()).is_ok();
            if !alive {
                tracing::debug!(listener_id = %listener_id, "Dropped closed bridge listener");
            }
            alive
        });
    }

    /// Number of rooms currently joined
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Number of subscribed listeners
    pub async fn listener_count(&self) -> usize {
        self.listeners.read().await.len()
    }
}
