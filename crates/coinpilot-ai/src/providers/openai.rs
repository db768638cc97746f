//! OpenAI-compatible Chat Completions provider

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use super::ChatProvider;
use crate::{
    error::{Error, Result},
    stream::{FragmentStream, fragment_stream},
    types::{ChatRequest, Model, Role},
};

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// OpenAI API client
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Create from environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = super::get_api_key(None, API_KEY_ENV)?;
        Ok(Self::new(api_key))
    }

    async fn send(&self, model: &Model, body: &OpenAIRequest) -> Result<reqwest::Response> {
        let url = model.completions_url();
        tracing::debug!(model = %model.id, stream = body.stream.is_some(), "POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::api(status.as_u16(), error_message(&text)));
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatProvider for OpenAIProvider {
    async fn stream(&self, model: &Model, request: &ChatRequest) -> Result<FragmentStream> {
        let body = build_request(model, request, true);
        let response = self.send(model, &body).await?;
        let chunks = response.bytes_stream().map(|chunk| chunk.map_err(Error::from));
        Ok(fragment_stream(chunks))
    }

    async fn complete(&self, model: &Model, request: &ChatRequest) -> Result<String> {
        let body = build_request(model, request, false);
        let response = self.send(model, &body).await?;
        let completion: CompletionResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                Error::UnexpectedResponse("completion has no message content".into())
            })
    }
}

/// Pull `error.message` out of an error body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn build_request(model: &Model, request: &ChatRequest, stream: bool) -> OpenAIRequest {
    let mut messages = Vec::with_capacity(request.history.len() + 2);

    if let Some(ref system_prompt) = request.system_prompt {
        messages.push(OpenAIMessage {
            role: Role::System.as_str(),
            content: MessageContent::Text(system_prompt.clone()),
        });
    }

    for turn in &request.history {
        messages.push(OpenAIMessage {
            role: turn.role.as_str(),
            content: MessageContent::Text(turn.content.clone()),
        });
    }

    let user = &request.user;
    let content = if user.images.is_empty() {
        MessageContent::Text(user.text.clone())
    } else {
        let mut parts = vec![ContentPart::Text {
            text: user.text.clone(),
        }];
        parts.extend(user.images.iter().map(|image| ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: image.data_url(),
            },
        }));
        MessageContent::Parts(parts)
    };
    messages.push(OpenAIMessage {
        role: Role::User.as_str(),
        content,
    });

    OpenAIRequest {
        model: model.id.clone(),
        messages,
        max_tokens: Some(model.max_tokens),
        stop: if stream && !model.stop.is_empty() {
            Some(model.stop.clone())
        } else {
            None
        },
        stream: if stream { Some(true) } else { None },
    }
}

// Request types

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

// Response types

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}
