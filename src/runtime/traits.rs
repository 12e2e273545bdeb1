//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::agent::{AgentThread, ChatCompletionAgent};
use crate::llm::{LlmError, TokenStream};
use async_trait::async_trait;
use std::sync::Arc;

/// Client for the chat-completion calls a session makes
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Stream a reply to `prompt` in the context of `thread`
    async fn stream_reply(&self, thread: &AgentThread, prompt: &str)
        -> Result<TokenStream, LlmError>;

    /// Wait for a whole reply to `prompt` in the context of `thread`
    async fn complete(&self, thread: &AgentThread, prompt: &str) -> Result<String, LlmError>;

    /// Author shown on streamed replies
    fn agent_name(&self) -> &str;

    fn model_id(&self) -> &str;
}

// ============================================================================
// Arc implementation for shared clients
// ============================================================================

#[async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for Arc<T> {
    async fn stream_reply(
        &self,
        thread: &AgentThread,
        prompt: &str,
    ) -> Result<TokenStream, LlmError> {
        (**self).stream_reply(thread, prompt).await
    }

    async fn complete(&self, thread: &AgentThread, prompt: &str) -> Result<String, LlmError> {
        (**self).complete(thread, prompt).await
    }

    fn agent_name(&self) -> &str {
        (**self).agent_name()
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

// ============================================================================
// Production Adapter
// ============================================================================

#[async_trait]
impl CompletionClient for ChatCompletionAgent {
    async fn stream_reply(
        &self,
        thread: &AgentThread,
        prompt: &str,
    ) -> Result<TokenStream, LlmError> {
        self.invoke_stream(thread, prompt).await
    }

    async fn complete(&self, thread: &AgentThread, prompt: &str) -> Result<String, LlmError> {
        self.get_response(thread, prompt).await
    }

    fn agent_name(&self) -> &str {
        self.name()
    }

    fn model_id(&self) -> &str {
        ChatCompletionAgent::model_id(self)
    }
}
