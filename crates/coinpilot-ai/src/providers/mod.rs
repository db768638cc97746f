//! Completion service providers

pub mod openai;

use crate::{ChatRequest, Error, Model, Result, stream::FragmentStream};
use async_trait::async_trait;

/// Trait for chat completion services
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Open a streamed reply.
    ///
    /// Resolves once the response head has arrived with a success status;
    /// the returned stream then yields sanitized fragments.
    async fn stream(&self, model: &Model, request: &ChatRequest) -> Result<FragmentStream>;

    /// Ask for a complete, non-streamed reply
    async fn complete(&self, model: &Model, request: &ChatRequest) -> Result<String>;
}

/// Get an API key from the provided value or the environment
pub fn get_api_key(provided: Option<&str>, env_var: &str) -> Result<String> {
    if let Some(key) = provided {
        return Ok(key.to_string());
    }

    std::env::var(env_var).map_err(|_| Error::InvalidApiKey)
}
