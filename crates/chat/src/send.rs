//! Optimistic send pipeline
//!
//! Turns typed text into a provisional transcript entry immediately,
//! then reconciles it against the store's authoritative reply: promote
//! on success, discard on failure. One send in flight per conversation;
//! a second call while one is outstanding is rejected, not queued, so
//! provisional ordering stays unambiguous.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use helpdesk_shared::{ChatMessage, ChatResult, UserRef};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::bridge::EventBridge;
use crate::store::MessageStore;
use crate::transcript::{Transcript, TranscriptEntry};

/// What a call to [`SendPipeline::send`] did
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Message persisted, promoted, and announced
    Sent(ChatMessage),
    /// Empty text or a send already in flight; nothing happened
    Skipped,
}

/// Per-conversation optimistic send path
pub struct SendPipeline {
    ticket_id: Uuid,
    identity: UserRef,
    transcript: Arc<RwLock<Transcript>>,
    store: Arc<dyn MessageStore>,
    bridge: Arc<EventBridge>,
    /// Single-flight guard: idle (false) -> sending (true) -> idle
    in_flight: AtomicBool,
}

impl SendPipeline {
    pub fn new(
        ticket_id: Uuid,
        identity: UserRef,
        transcript: Arc<RwLock<Transcript>>,
        store: Arc<dyn MessageStore>,
        bridge: Arc<EventBridge>,
    ) -> Self {
        Self {
            ticket_id,
            identity,
            transcript,
            store,
            bridge,
            in_flight: AtomicBool::new(false),
        }
    }

    /// True while a send awaits its authoritative reply
    pub fn is_sending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Send trimmed text through the optimistic path
    ///
    /// Silently skips when the trimmed text is empty or a send is
    /// already outstanding. Otherwise the provisional entry is visible
    /// in the transcript before this future first suspends; the caller
    /// restores the typed text on `Err`.
    pub async fn send(&self, text: &str) -> ChatResult<SendOutcome> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(SendOutcome::Skipped);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(ticket_id = %self.ticket_id, "Send already in flight; rejected");
            return Ok(SendOutcome::Skipped);
        }

        let result = self.dispatch(trimmed).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result.map(SendOutcome::Sent)
    }

    async fn dispatch(&self, trimmed: &str) -> ChatResult<ChatMessage> {
        // Fresh per send, never reused; v4 collisions are effectively
        // impossible for the lifetime of a session.
        let provisional_id = Uuid::new_v4();
        let draft = ChatMessage {
            id: provisional_id,
            ticket_id: self.ticket_id,
            sender: self.identity.clone(),
            body: trimmed.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };

        self.transcript
            .write()
            .await
            .insert_or_merge(TranscriptEntry::provisional(provisional_id, draft));

        match self.store.create_message(self.ticket_id, trimmed).await {
            Ok(confirmed) => {
                self.transcript
                    .write()
                    .await
                    .promote(provisional_id, confirmed.clone());

                // Announce after persist so other participants see the
                // authoritative copy; our own session skips the echo.
                self.bridge.announce_message(confirmed.clone()).await;
                Ok(confirmed)
            }
            Err(e) => {
                self.transcript.write().await.discard(provisional_id);
                tracing::warn!(
                    ticket_id = %self.ticket_id,
                    error = %e,
                    "Send failed; provisional message rolled back"
                );
                Err(e)
            }
        }
    }
}
