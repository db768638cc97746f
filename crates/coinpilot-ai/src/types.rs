//! Core types for chat completion requests

use serde::{Deserialize, Serialize};

/// Default stop sequences sent with chat requests
pub const DEFAULT_STOP_SEQUENCES: [&str; 2] = ["\n\n\n", "<|im_end|>"];

/// Model definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Model identifier (e.g., "gpt-4o-mini")
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Base URL for API calls (without the `/chat/completions` suffix)
    pub base_url: String,
    /// Maximum output tokens per reply
    pub max_tokens: u32,
    /// Whether image attachments are accepted
    #[serde(default)]
    pub vision: bool,
    /// Stop sequences for streamed chat replies
    #[serde(default)]
    pub stop: Vec<String>,
}

impl Model {
    /// Completions endpoint for this model
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Message roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A role-tagged text message, as replayed from conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// A base64-encoded image ready to be embedded in a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub mime_type: String,
    /// Standard base64, no line breaks
    pub data: String,
}

impl EncodedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// `data:` URL form used in `image_url` content parts
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// The new user turn of a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTurn {
    pub text: String,
    #[serde(default)]
    pub images: Vec<EncodedImage>,
}

impl UserTurn {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            images: vec![],
        }
    }

    pub fn with_images(text: impl Into<String>, images: Vec<EncodedImage>) -> Self {
        Self {
            text: text.into(),
            images,
        }
    }
}

/// Everything needed to ask the completion service for a reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Instruction prepended to every request
    pub system_prompt: Option<String>,
    /// Prior turns, oldest first
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// The turn being asked about
    pub user: UserTurn,
}

impl ChatRequest {
    pub fn new(user: UserTurn) -> Self {
        Self {
            system_prompt: None,
            history: vec![],
            user,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url_trims_trailing_slash() {
        let model = Model {
            id: "m".into(),
            name: "m".into(),
            base_url: "http://localhost:8080/v1/".into(),
            max_tokens: 16,
            vision: false,
            stop: vec![],
        };
        assert_eq!(model.completions_url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_data_url() {
        let image = EncodedImage::new("image/png", "aGVsbG8=");
        assert_eq!(image.data_url(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
