//! One user turn and the assistant reply to it

use coinpilot_ai::EncodedImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user message and its (possibly partial) reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: Uuid,
    pub user_text: String,
    /// Attachments as encoded at submission time
    pub user_attachments: Vec<EncodedImage>,
    /// Grows while streaming; trimmed once when the reply completes
    pub response_text: String,
    pub is_streaming: bool,
    /// Set only when the exchange failed; partial text is kept alongside it
    pub error: Option<String>,
    /// Unix millis
    pub created_at: i64,
}

impl Exchange {
    /// Start a new in-flight exchange
    pub fn new(user_text: impl Into<String>, user_attachments: Vec<EncodedImage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_text: user_text.into(),
            user_attachments,
            response_text: String::new(),
            is_streaming: true,
            error: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Whether the exchange ended in failure
    pub fn is_failed(&self) -> bool {
        !self.is_streaming && self.error.is_some()
    }

    /// Whether the exchange finished without error
    pub fn is_complete(&self) -> bool {
        !self.is_streaming && self.error.is_none()
    }
}
