//! Transport abstraction for opening reply streams

use std::sync::Arc;

use async_trait::async_trait;
use coinpilot_ai::{
    ChatRequest, Model, Result,
    providers::{ChatProvider, openai::OpenAIProvider},
    stream::FragmentStream,
};

/// Opens the fragment stream for one request
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request; resolves once the response head has been accepted.
    async fn open(&self, model: &Model, request: &ChatRequest) -> Result<FragmentStream>;
}

/// Direct provider transport - calls the completion service
pub struct ProviderTransport {
    provider: Arc<dyn ChatProvider>,
}

impl ProviderTransport {
    /// Wrap an existing provider
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// OpenAI-compatible provider with a specific API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::new(Arc::new(OpenAIProvider::new(api_key)))
    }

    /// OpenAI-compatible provider keyed from the environment
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Arc::new(OpenAIProvider::from_env()?)))
    }

    /// The wrapped provider, for one-shot requests
    pub fn provider(&self) -> Arc<dyn ChatProvider> {
        Arc::clone(&self.provider)
    }
}

#[async_trait]
impl Transport for ProviderTransport {
    async fn open(&self, model: &Model, request: &ChatRequest) -> Result<FragmentStream> {
        tracing::debug!(
            history = request.history.len(),
            images = request.user.images.len(),
            "opening reply stream"
        );
        self.provider.stream(model, request).await
    }
}
