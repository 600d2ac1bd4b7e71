//! Error types for the helpdesk chat core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Failed to load chat history: {0}")]
    HistoryFetch(String),

    #[error("Failed to send message: {0}")]
    SendMessage(String),

    #[error("Live channel error: {0}")]
    Channel(String),

    #[error("Invalid event payload: {0}")]
    InvalidPayload(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Result alias used throughout the chat core
pub type ChatResult<T> = Result<T, ChatError>;
