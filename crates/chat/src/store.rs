//! Message store collaborator
//!
//! REST-style access to the authoritative message store: history
//! fetch on session open, message creation on send. The trait is the
//! seam tests use to script success and failure.

use async_trait::async_trait;
use helpdesk_shared::{ChatError, ChatMessage, ChatResult};
use serde::Serialize;
use uuid::Uuid;

/// Authoritative message persistence, as seen by the chat core
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// All messages for a ticket, in whatever order the store returns
    /// them (the transcript re-sorts on read)
    async fn fetch_history(&self, ticket_id: Uuid) -> ChatResult<Vec<ChatMessage>>;

    /// Persist a message; the returned copy carries the assigned id,
    /// server timestamp, and sender
    async fn create_message(&self, ticket_id: Uuid, body: &str) -> ChatResult<ChatMessage>;
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    ticket_id: Uuid,
    body: &'a str,
}

/// HTTP implementation of [`MessageStore`]
///
/// Talks to `GET {base}/messages/{ticket_id}` and
/// `POST {base}/messages`.
pub struct HttpMessageStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMessageStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Use a pre-configured client (timeouts, proxies, auth headers)
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn check_status(response: reqwest::Response) -> ChatResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, message = %message, "Message store request failed");
        Err(ChatError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl MessageStore for HttpMessageStore {
    async fn fetch_history(&self, ticket_id: Uuid) -> ChatResult<Vec<ChatMessage>> {
        let url = format!("{}/messages/{}", self.base_url, ticket_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::HistoryFetch(e.to_string()))?;

        let response = Self::check_status(response).await?;
        let messages: Vec<ChatMessage> = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidPayload(e.to_string()))?;

        tracing::debug!(
            ticket_id = %ticket_id,
            count = messages.len(),
            "Fetched message history"
        );
        Ok(messages)
    }

    async fn create_message(&self, ticket_id: Uuid, body: &str) -> ChatResult<ChatMessage> {
        let url = format!("{}/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&CreateMessageRequest { ticket_id, body })
            .send()
            .await
            .map_err(|e| ChatError::SendMessage(e.to_string()))?;

        let response = Self::check_status(response).await?;
        let message: ChatMessage = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidPayload(e.to_string()))?;

        tracing::debug!(
            ticket_id = %ticket_id,
            message_id = %message.id,
            "Message persisted"
        );
        Ok(message)
    }
}
