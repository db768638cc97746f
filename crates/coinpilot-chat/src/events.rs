//! Session event types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No exchange in flight
    Idle,
    /// Encoding attachments and waiting for the response head
    Submitting,
    /// Consuming reply fragments
    Streaming,
    /// Finalizing the reply and appending it to the conversation
    Committing,
    /// The in-flight exchange failed
    Failed,
}

/// Events emitted by a chat session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Session moved to a new state
    StateChanged { state: SessionState },

    /// A new exchange was submitted
    ExchangeStarted { id: Uuid, user_text: String },

    /// Reply text grew; `text` is everything received so far
    ExchangeUpdated { id: Uuid, text: String },

    /// Reply completed and was added to the conversation
    ExchangeCommitted { id: Uuid, text: String },

    /// Exchange failed; it stays visible and can be retried.
    /// `retryable` tells whether the failure looks transient.
    ExchangeFailed {
        id: Uuid,
        error: String,
        retryable: bool,
    },

    /// Exchange was cancelled; `kept` tells whether its partial text stays visible
    ExchangeCancelled { id: Uuid, kept: bool },
}

impl ChatEvent {
    /// Check if this event ends an exchange
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChatEvent::ExchangeCommitted { .. }
                | ChatEvent::ExchangeFailed { .. }
                | ChatEvent::ExchangeCancelled { .. }
        )
    }
}
