//! Live channel event types and serialization
//!
//! Defines all client-to-server and server-to-client event types
//! with type-safe serde serialization. Malformed inbound payloads fail
//! deserialization at the transport boundary instead of being trusted.

use helpdesk_shared::ChatMessage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Client-to-Server Events
// =============================================================================

/// Events sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Join a ticket room to receive its events
    JoinRoom { ticket_id: Uuid },

    /// Leave a ticket room
    LeaveRoom { ticket_id: Uuid },

    /// Announce a message already persisted by the store
    SendMessage { message: ChatMessage },

    /// Local user started typing in a ticket
    Typing {
        ticket_id: Uuid,
        user_id: Uuid,
        name: String,
    },

    /// Local user stopped typing in a ticket
    StopTyping {
        ticket_id: Uuid,
        user_id: Uuid,
        name: String,
    },
}

// =============================================================================
// Server-to-Client Events
// =============================================================================

/// Events pushed from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// New message added to a ticket
    NewMessage { message: ChatMessage },

    /// A user started typing in a ticket
    Typing {
        ticket_id: Uuid,
        user_id: Uuid,
        name: String,
    },

    /// A user stopped typing in a ticket
    StopTyping {
        ticket_id: Uuid,
        user_id: Uuid,
        name: String,
    },
}

// =============================================================================
// Bridge Fan-out
// =============================================================================

/// Transport connection state
///
/// `Connecting` only appears before the first successful connect;
/// automatic reconnects move straight from `Disconnected` back to
/// `Connected`. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// What the bridge delivers to each subscribed session
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// An application event pushed by the server
    Server(ServerEvent),

    /// The shared connection changed state
    ConnectionStateChanged(ConnectionState),
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_shared::{UserRef, UserRole};
    use time::OffsetDateTime;

    #[test]
    fn test_client_event_serialization() {
        let ticket_id = Uuid::new_v4();
        let event = ClientEvent::JoinRoom { ticket_id };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"join_room""#));
        assert!(json.contains(&ticket_id.to_string()));
    }

    #[test]
    fn test_server_event_deserialization() {
        let json = r#"{
            "type": "typing",
            "ticket_id": "550e8400-e29b-41d4-a716-446655440000",
            "user_id": "550e8400-e29b-41d4-a716-446655440001",
            "name": "Bob"
        }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        match event {
            ServerEvent::Typing { name, .. } => assert_eq!(name, "Bob"),
            _ => panic!("Expected Typing event"),
        }
    }

    #[test]
    fn test_new_message_round_trip() {
        let event = ServerEvent::NewMessage {
            message: ChatMessage {
                id: Uuid::new_v4(),
                ticket_id: Uuid::new_v4(),
                sender: UserRef {
                    id: Uuid::new_v4(),
                    name: "Alice".to_string(),
                    role: UserRole::Agent,
                },
                body: "hi".to_string(),
                created_at: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: ServerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        let json = r#"{"type":"new_message","message":{"body":"missing fields"}}"#;
        assert!(serde_json::from_str::<ServerEvent>(json).is_err());
    }
}
