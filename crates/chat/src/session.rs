//! Conversation session controller
//!
//! Owns the lifecycle of one open conversation: mounts by subscribing
//! to the bridge, joining the ticket room and fetching history; tears
//! down by leaving the room and releasing its listener. Every `open`
//! pairs with exactly one `close`, so rapid conversation switching
//! never leaks listeners.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use helpdesk_shared::{ChatMessage, UserRef};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::bridge::{BridgeEvent, ConnectionState, EventBridge, ServerEvent};
use crate::send::{SendOutcome, SendPipeline};
use crate::store::MessageStore;
use crate::transcript::{Transcript, TranscriptEntry};
use crate::typing::TypingTracker;

const HISTORY_ERROR: &str = "Failed to load chat messages. Please try refreshing.";
const SEND_ERROR: &str = "Failed to send message. Please try again.";

/// UI-facing session state: loading flag, dismissible error, draft text
#[derive(Debug, Default)]
struct ViewState {
    loading: bool,
    error: Option<String>,
    draft: String,
}

struct ListenerGuard {
    listener_id: Uuid,
    task: JoinHandle<()>,
}

/// One open conversation view over the shared bridge
///
/// The transcript is exclusively owned by this session; cross-session
/// sharing happens only through the injected [`EventBridge`].
pub struct ChatSession {
    ticket_id: Uuid,
    identity: UserRef,
    store: Arc<dyn MessageStore>,
    bridge: Arc<EventBridge>,
    transcript: Arc<RwLock<Transcript>>,
    typing: Arc<RwLock<TypingTracker>>,
    pipeline: SendPipeline,
    view: RwLock<ViewState>,
    connection: Arc<RwLock<ConnectionState>>,
    initialized: AtomicBool,
    listener: Mutex<Option<ListenerGuard>>,
}

impl ChatSession {
    pub fn new(
        ticket_id: Uuid,
        identity: UserRef,
        store: Arc<dyn MessageStore>,
        bridge: Arc<EventBridge>,
    ) -> Self {
        let transcript = Arc::new(RwLock::new(Transcript::new(ticket_id)));
        let typing = Arc::new(RwLock::new(TypingTracker::new(identity.id)));
        let pipeline = SendPipeline::new(
            ticket_id,
            identity.clone(),
            Arc::clone(&transcript),
            Arc::clone(&store),
            Arc::clone(&bridge),
        );

        Self {
            ticket_id,
            identity,
            store,
            bridge,
            transcript,
            typing,
            pipeline,
            view: RwLock::new(ViewState::default()),
            connection: Arc::new(RwLock::new(ConnectionState::Connecting)),
            initialized: AtomicBool::new(false),
            listener: Mutex::new(None),
        }
    }

    pub fn ticket_id(&self) -> Uuid {
        self.ticket_id
    }

    /// Mount the session: join the room, attach a listener, load history
    ///
    /// Guarded: re-opening an already-open session is a no-op. A fetch
    /// failure is surfaced as a dismissible error while the room stays
    /// joined, so live messages keep arriving.
    pub async fn open(&self) {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(ticket_id = %self.ticket_id, "Session already open");
            return;
        }

        tracing::info!(ticket_id = %self.ticket_id, "Opening conversation session");
        {
            let mut view = self.view.write().await;
            view.loading = true;
            view.error = None;
        }

        // Listener attaches before the fetch so messages pushed while
        // history is in flight land in the transcript; the merge below
        // tolerates the overlap.
        let (listener_id, rx) = self.bridge.subscribe().await;
        let task = tokio::spawn(listen(
            rx,
            self.ticket_id,
            self.identity.id,
            Arc::clone(&self.transcript),
            Arc::clone(&self.typing),
            Arc::clone(&self.connection),
        ));
        *self.listener.lock().await = Some(ListenerGuard { listener_id, task });

        self.bridge.join_room(self.ticket_id).await;
        // Optimistic: the join has been announced.
        *self.connection.write().await = ConnectionState::Connected;

        match self.store.fetch_history(self.ticket_id).await {
            Ok(history) => {
                let count = history.len();
                {
                    let mut transcript = self.transcript.write().await;
                    for message in history {
                        transcript.insert_or_merge(TranscriptEntry::confirmed(message));
                    }
                }
                tracing::debug!(
                    ticket_id = %self.ticket_id,
                    fetched = count,
                    "History merged into transcript"
                );
                self.view.write().await.loading = false;
            }
            Err(e) => {
                // Stay in the room: live messages still arrive even
                // though history failed to load.
                tracing::warn!(ticket_id = %self.ticket_id, error = %e, "History fetch failed");
                let mut view = self.view.write().await;
                view.loading = false;
                view.error = Some(HISTORY_ERROR.to_string());
            }
        }
    }

    /// Tear down: leave the room, detach the listener, reset the guard
    pub async fn close(&self) {
        if self
            .initialized
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        tracing::info!(ticket_id = %self.ticket_id, "Closing conversation session");
        self.bridge.leave_room(self.ticket_id).await;

        if let Some(guard) = self.listener.lock().await.take() {
            self.bridge.unsubscribe(guard.listener_id).await;
            guard.task.abort();
        }

        self.typing.write().await.clear();
    }

    /// Update the draft text; transitions drive typing indicators
    pub async fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        let typing_now = !text.is_empty();
        self.view.write().await.draft = text;

        if self.typing.write().await.set_local_typing(typing_now) {
            if typing_now {
                self.bridge.typing_started(self.ticket_id, &self.identity).await;
            } else {
                self.bridge.typing_stopped(self.ticket_id, &self.identity).await;
            }
        }
    }

    /// Send the current draft through the optimistic pipeline
    ///
    /// On success the draft clears; on failure it is left untouched so
    /// no typed text is lost, and a dismissible error is surfaced.
    pub async fn send(&self) {
        let draft = self.view.read().await.draft.clone();

        // Typing stops at send time, success or failure.
        if self.typing.write().await.set_local_typing(false) {
            self.bridge.typing_stopped(self.ticket_id, &self.identity).await;
        }

        match self.pipeline.send(&draft).await {
            Ok(SendOutcome::Sent(_)) => {
                let mut view = self.view.write().await;
                view.draft.clear();
                view.error = None;
            }
            Ok(SendOutcome::Skipped) => {}
            Err(e) => {
                tracing::warn!(ticket_id = %self.ticket_id, error = %e, "Send surfaced to session");
                self.view.write().await.error = Some(SEND_ERROR.to_string());
            }
        }
    }

    /// Transcript snapshot in display order
    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.transcript.read().await.ordered().cloned().collect()
    }

    /// Display names currently typing, excluding self
    pub async fn typing_identities(&self) -> Vec<String> {
        self.typing.read().await.identities().to_vec()
    }

    pub async fn connection_state(&self) -> ConnectionState {
        *self.connection.read().await
    }

    /// Whether the shell should enable the send control
    pub async fn can_send(&self) -> bool {
        self.connection_state().await == ConnectionState::Connected
            && !self.pipeline.is_sending()
            && !self.view.read().await.draft.trim().is_empty()
    }

    pub fn is_open(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub async fn is_loading(&self) -> bool {
        self.view.read().await.loading
    }

    pub async fn draft(&self) -> String {
        self.view.read().await.draft.clone()
    }

    /// Current advisory error banner, if any
    pub async fn error(&self) -> Option<String> {
        self.view.read().await.error.clone()
    }

    /// Dismiss the error banner
    pub async fn clear_error(&self) {
        self.view.write().await.error = None;
    }
}

/// Session-side event loop: filter by ticket, drop self-echoes, apply
///
/// Self-originated `NewMessage` echoes are always skipped by sender
/// id — the direct promote path already holds the confirmed copy.
async fn listen(
    mut rx: mpsc::UnboundedReceiver<BridgeEvent>,
    ticket_id: Uuid,
    local_user_id: Uuid,
    transcript: Arc<RwLock<Transcript>>,
    typing: Arc<RwLock<TypingTracker>>,
    connection: Arc<RwLock<ConnectionState>>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            BridgeEvent::Server(ServerEvent::NewMessage { message }) => {
                if message.ticket_id != ticket_id || message.sender.id == local_user_id {
                    continue;
                }
                transcript
                    .write()
                    .await
                    .insert_or_merge(TranscriptEntry::confirmed(message));
            }
            BridgeEvent::Server(ServerEvent::Typing {
                ticket_id: t,
                user_id,
                name,
            }) => {
                if t == ticket_id {
                    typing.write().await.remote_started(user_id, &name);
                }
            }
            BridgeEvent::Server(ServerEvent::StopTyping {
                ticket_id: t, name, ..
            }) => {
                if t == ticket_id {
                    typing.write().await.remote_stopped(&name);
                }
            }
            BridgeEvent::ConnectionStateChanged(state) => {
                *connection.write().await = state;
            }
        }
    }
}
