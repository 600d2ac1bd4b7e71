//! Shared test fakes for the chat core
//!
//! A scriptable transport and message store so bridge, send, and
//! session tests can drive every success/failure path without network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use std::sync::Arc;

use async_trait::async_trait;
use helpdesk_shared::{ChatError, ChatMessage, ChatResult, UserRef, UserRole};
use time::OffsetDateTime;
use tokio::sync::{mpsc, oneshot, Mutex};
use uuid::Uuid;

use crate::bridge::{ChannelTransport, ClientEvent, ServerEvent};
use crate::store::MessageStore;

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) fn user(name: &str, role: UserRole) -> UserRef {
    UserRef {
        id: Uuid::new_v4(),
        name: name.to_string(),
        role,
    }
}

pub(crate) fn message_at(ticket_id: Uuid, sender: &UserRef, body: &str, at: i64) -> ChatMessage {
    ChatMessage {
        id: Uuid::new_v4(),
        ticket_id,
        sender: sender.clone(),
        body: body.to_string(),
        created_at: OffsetDateTime::from_unix_timestamp(at).unwrap(),
    }
}

/// Scriptable transport: inbound events arrive over a channel (`None`
/// simulates transport loss), emits are recorded, connect attempts
/// consume scripted results (default `Ok`).
pub(crate) struct FakeTransport {
    inbound: Mutex<mpsc::UnboundedReceiver<Option<ServerEvent>>>,
    emitted: StdMutex<Vec<ClientEvent>>,
    connect_results: StdMutex<VecDeque<ChatResult<()>>>,
    connect_calls: AtomicUsize,
}

impl FakeTransport {
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedSender<Option<ServerEvent>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            inbound: Mutex::new(rx),
            emitted: StdMutex::new(Vec::new()),
            connect_results: StdMutex::new(VecDeque::new()),
            connect_calls: AtomicUsize::new(0),
        });
        (transport, tx)
    }

    pub(crate) fn script_connect_failures(&self, count: usize) {
        let mut results = self.connect_results.lock().unwrap();
        for _ in 0..count {
            results.push_back(Err(ChatError::Channel("connect refused".to_string())));
        }
    }

    pub(crate) fn emitted(&self) -> Vec<ClientEvent> {
        self.emitted.lock().unwrap().clone()
    }

    pub(crate) fn join_count(&self, ticket_id: Uuid) -> usize {
        self.emitted()
            .iter()
            .filter(|e| matches!(e, ClientEvent::JoinRoom { ticket_id: t } if *t == ticket_id))
            .count()
    }

    pub(crate) fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelTransport for FakeTransport {
    async fn connect(&self) -> ChatResult<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.connect_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn emit(&self, event: ClientEvent) -> ChatResult<()> {
        self.emitted.lock().unwrap().push(event);
        Ok(())
    }

    async fn recv(&self) -> Option<ServerEvent> {
        self.inbound.lock().await.recv().await.flatten()
    }
}

/// Scriptable message store
///
/// `create_message` replies from a queue of scripted results; an
/// optional gate makes a call block until released, for single-flight
/// tests. `fetch_history` replies from its own scripted queue.
pub(crate) struct FakeStore {
    history: StdMutex<VecDeque<ChatResult<Vec<ChatMessage>>>>,
    replies: StdMutex<VecDeque<ChatResult<ChatMessage>>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    history_gate: Mutex<Option<oneshot::Receiver<()>>>,
    create_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl FakeStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            history: StdMutex::new(VecDeque::new()),
            replies: StdMutex::new(VecDeque::new()),
            gate: Mutex::new(None),
            history_gate: Mutex::new(None),
            create_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn script_history(&self, result: ChatResult<Vec<ChatMessage>>) {
        self.history.lock().unwrap().push_back(result);
    }

    pub(crate) fn script_reply(&self, result: ChatResult<ChatMessage>) {
        self.replies.lock().unwrap().push_back(result);
    }

    /// Make the next `create_message` call wait until the returned
    /// sender fires
    pub(crate) async fn gate_next_create(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().await = Some(rx);
        tx
    }

    /// Make the next `fetch_history` call wait until the returned
    /// sender fires
    pub(crate) async fn gate_next_fetch(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.history_gate.lock().await = Some(rx);
        tx
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageStore for FakeStore {
    async fn fetch_history(&self, _ticket_id: Uuid) -> ChatResult<Vec<ChatMessage>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.history_gate.lock().await.take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        self.history
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn create_message(&self, _ticket_id: Uuid, _body: &str) -> ChatResult<ChatMessage> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().await.take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::SendMessage("no scripted reply".to_string())))
    }
}
