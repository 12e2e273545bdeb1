//! Chat-completion service abstraction
//!
//! The external chat-completion service is consumed through [`LlmService`]:
//! a one-shot `complete` call and a token-by-token `stream` call.

mod error;
mod openai;
mod provider;
mod types;

#[cfg(test)]
mod proptests;

pub use error::{LlmError, LlmErrorKind};
pub use openai::{Endpoint, OpenAIService};
pub use provider::{connect, LlmConfig};
pub use types::*;

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

/// Common interface for chat-completion providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request and wait for the whole reply
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Make a completion request and receive the reply token by token
    async fn stream(&self, request: &LlmRequest) -> Result<TokenStream, LlmError>;

    /// Get the model (or deployment) ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for chat-completion services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    transient = e.kind.is_transient(),
                    "LLM request failed"
                );
            }
        }

        result
    }

    async fn stream(&self, request: &LlmRequest) -> Result<TokenStream, LlmError> {
        let start = std::time::Instant::now();
        match self.inner.stream(request).await {
            Ok(stream) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %start.elapsed().as_millis(),
                    "LLM stream opened"
                );
                let model_id = self.model_id.clone();
                Ok(Box::pin(stream.inspect(move |item| {
                    if let Err(e) = item {
                        tracing::error!(model = %model_id, error = %e.message, "LLM stream failed");
                    }
                })))
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %start.elapsed().as_millis(),
                    error = %e.message,
                    transient = e.kind.is_transient(),
                    "LLM stream request failed"
                );
                Err(e)
            }
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
