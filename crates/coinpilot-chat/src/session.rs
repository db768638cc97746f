//! Chat session state machine and reply streaming

use std::sync::Arc;

use coinpilot_ai::{
    Attachment, ChatRequest, EncodedImage, Model, StreamAccumulator, UserTurn,
    analysis::ANALYST_SYSTEM_PROMPT, attachment::encode_all,
};
use futures::StreamExt;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    conversation::ConversationContext,
    error::{Error, Result},
    events::{ChatEvent, SessionState},
    exchange::Exchange,
    handle::SessionHandle,
    transport::Transport,
};

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Model to use
    pub model: Model,
    /// System prompt sent ahead of the replayed history
    pub system_prompt: Option<String>,
    /// Replay at most this many recent exchanges per request
    pub replay_limit: Option<usize>,
    /// Keep a cancelled exchange visible with its partial text
    pub keep_partial_on_cancel: bool,
    /// Resend the original attachments when retrying a failed exchange
    pub retry_with_attachments: bool,
}

impl SessionConfig {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            system_prompt: Some(ANALYST_SYSTEM_PROMPT.to_string()),
            replay_limit: None,
            keep_partial_on_cancel: false,
            retry_with_attachments: false,
        }
    }
}

/// How the read loop ended
enum Outcome {
    Completed,
    Failed(coinpilot_ai::Error),
    Cancelled,
}

/// A conversation with the completion service.
///
/// Owns the visible exchange list and the conversation memory. At most one
/// exchange is in flight at a time.
pub struct ChatSession {
    config: SessionConfig,
    context: ConversationContext,
    exchanges: Vec<Exchange>,
    state: SessionState,
    transport: Arc<dyn Transport>,
    event_tx: broadcast::Sender<ChatEvent>,
    handle: SessionHandle,
}

impl ChatSession {
    /// Create a new session
    pub fn new(config: SessionConfig, transport: Arc<dyn Transport>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            context: ConversationContext::with_replay_limit(config.replay_limit),
            config,
            exchanges: Vec::new(),
            state: SessionState::Idle,
            transport,
            event_tx,
            handle: SessionHandle::new(),
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.event_tx.subscribe()
    }

    /// Get a cloneable handle for cancelling from other tasks
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Visible exchanges in submission order
    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Look up a visible exchange
    pub fn exchange(&self, id: Uuid) -> Option<&Exchange> {
        self.exchanges.iter().find(|e| e.id == id)
    }

    /// Completed exchanges replayed into new requests
    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// Set the system prompt
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.config.system_prompt = Some(prompt.into());
    }

    /// Set the model
    pub fn set_model(&mut self, model: Model) {
        self.config.model = model;
    }

    /// Send a user message and stream the reply into a new exchange.
    ///
    /// Returns the exchange id whatever the outcome; a failure is recorded
    /// on the exchange, not returned.
    pub async fn submit(
        &mut self,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> Result<Uuid> {
        self.ensure_idle()?;
        self.set_state(SessionState::Submitting);
        let images = encode_all(&attachments).await;
        Ok(self.run_exchange(text.into(), images).await)
    }

    /// Resubmit a failed exchange as a new one.
    pub async fn retry(&mut self, id: Uuid) -> Result<Uuid> {
        self.ensure_idle()?;
        let index = self
            .exchanges
            .iter()
            .position(|e| e.id == id)
            .ok_or(Error::UnknownExchange(id))?;
        if !self.exchanges[index].is_failed() {
            return Err(Error::NotRetryable(id));
        }

        let failed = self.exchanges.remove(index);
        let images = if self.config.retry_with_attachments {
            failed.user_attachments
        } else {
            Vec::new()
        };
        tracing::debug!(%id, "retrying failed exchange");

        self.set_state(SessionState::Submitting);
        Ok(self.run_exchange(failed.user_text, images).await)
    }

    /// Settle an exchange left in flight by a dropped `submit` or `retry`
    /// future. Returns the id of the settled exchange, if there was one.
    pub fn abandon_in_flight(&mut self) -> Option<Uuid> {
        if self.state == SessionState::Idle {
            return None;
        }

        let id = self
            .exchanges
            .iter()
            .rev()
            .find(|e| e.is_streaming)
            .map(|e| e.id);
        if let Some(id) = id {
            tracing::debug!(%id, "abandoning in-flight exchange");
            self.settle_cancelled(id);
        }
        self.handle.finish();
        self.set_state(SessionState::Idle);
        id
    }

    /// Forget all exchanges and conversation memory
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.exchanges.clear();
        self.context.clear();
        Ok(())
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.state == SessionState::Idle {
            Ok(())
        } else {
            Err(Error::Busy)
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "session state");
            self.state = state;
            let _ = self.event_tx.send(ChatEvent::StateChanged { state });
        }
    }

    fn exchange_mut(&mut self, id: Uuid) -> Option<&mut Exchange> {
        self.exchanges.iter_mut().find(|e| e.id == id)
    }

    fn build_request(&self, text: &str, images: Vec<EncodedImage>) -> ChatRequest {
        let request = ChatRequest::new(UserTurn::with_images(text, images))
            .with_history(self.context.as_request_turns());
        match &self.config.system_prompt {
            Some(prompt) => request.with_system_prompt(prompt.clone()),
            None => request,
        }
    }

    /// Drive one exchange from request to settlement. Expects `Submitting`.
    async fn run_exchange(&mut self, text: String, images: Vec<EncodedImage>) -> Uuid {
        let request = self.build_request(&text, images.clone());
        let exchange = Exchange::new(text, images);
        let id = exchange.id;
        let _ = self.event_tx.send(ChatEvent::ExchangeStarted {
            id,
            user_text: exchange.user_text.clone(),
        });
        self.exchanges.push(exchange);

        let token = self.handle.begin();
        let transport = Arc::clone(&self.transport);
        let model = self.config.model.clone();

        let opened = tokio::select! {
            _ = token.cancelled() => None,
            result = transport.open(&model, &request) => Some(result),
        };

        let mut accumulator = StreamAccumulator::new();
        let outcome = match opened {
            None => Outcome::Cancelled,
            Some(Err(e)) => Outcome::Failed(e),
            Some(Ok(mut stream)) => {
                self.set_state(SessionState::Streaming);
                loop {
                    let next = tokio::select! {
                        biased;
                        _ = token.cancelled() => break Outcome::Cancelled,
                        next = stream.next() => next,
                    };
                    match next {
                        Some(Ok(fragment)) => {
                            let text = accumulator.append(&fragment).to_string();
                            if let Some(exchange) = self.exchange_mut(id) {
                                exchange.response_text.clone_from(&text);
                            }
                            let _ = self.event_tx.send(ChatEvent::ExchangeUpdated { id, text });
                        }
                        Some(Err(e)) => break Outcome::Failed(e),
                        None => break Outcome::Completed,
                    }
                }
            }
        };

        match outcome {
            Outcome::Completed => self.commit(id, accumulator.finalize()),
            Outcome::Failed(error) => self.fail(id, error),
            Outcome::Cancelled => self.settle_cancelled(id),
        }

        self.handle.finish();
        self.set_state(SessionState::Idle);
        id
    }

    fn commit(&mut self, id: Uuid, text: String) {
        self.set_state(SessionState::Committing);
        let Some(exchange) = self.exchange_mut(id) else {
            return;
        };
        exchange.response_text.clone_from(&text);
        exchange.is_streaming = false;
        let committed = exchange.clone();
        self.context.append(committed);
        tracing::debug!(%id, chars = text.len(), "exchange committed");
        let _ = self.event_tx.send(ChatEvent::ExchangeCommitted { id, text });
    }

    fn fail(&mut self, id: Uuid, failure: coinpilot_ai::Error) {
        let retryable = failure.is_retryable();
        let error = failure.to_string();
        tracing::debug!(%id, %error, retryable, "exchange failed");
        if let Some(exchange) = self.exchange_mut(id) {
            exchange.is_streaming = false;
            exchange.error = Some(error.clone());
        }
        self.set_state(SessionState::Failed);
        let _ = self.event_tx.send(ChatEvent::ExchangeFailed {
            id,
            error,
            retryable,
        });
    }

    fn settle_cancelled(&mut self, id: Uuid) {
        let kept = self.config.keep_partial_on_cancel;
        if kept {
            if let Some(exchange) = self.exchange_mut(id) {
                exchange.is_streaming = false;
            }
        } else {
            self.exchanges.retain(|e| e.id != id);
        }
        tracing::debug!(%id, kept, "exchange cancelled");
        let _ = self.event_tx.send(ChatEvent::ExchangeCancelled { id, kept });
    }
}
