//! Chat-completion agent: a named persona with instructions over an
//! [`LlmService`], plus the per-session thread of past exchanges.

use crate::llm::{LlmError, LlmMessage, LlmRequest, LlmService, TokenStream};
use std::sync::Arc;

const MAX_REPLY_TOKENS: u32 = 1024;

/// Agent that answers prompts in the context of an [`AgentThread`]
#[derive(Clone)]
pub struct ChatCompletionAgent {
    name: String,
    instructions: String,
    service: Arc<dyn LlmService>,
}

impl ChatCompletionAgent {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        service: Arc<dyn LlmService>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            service,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model_id(&self) -> &str {
        self.service.model_id()
    }

    /// The prompt is appended unmodified after the thread's history
    fn build_request(&self, thread: &AgentThread, prompt: &str) -> LlmRequest {
        let mut messages = thread.messages.clone();
        messages.push(LlmMessage::user(prompt));
        LlmRequest {
            system: Some(self.instructions.clone()),
            messages,
            max_tokens: Some(MAX_REPLY_TOKENS),
        }
    }

    /// Wait for the whole reply
    pub async fn get_response(&self, thread: &AgentThread, prompt: &str) -> Result<String, LlmError> {
        let request = self.build_request(thread, prompt);
        let response = self.service.complete(&request).await?;
        Ok(response.content)
    }

    /// Receive the reply token by token
    pub async fn invoke_stream(
        &self,
        thread: &AgentThread,
        prompt: &str,
    ) -> Result<TokenStream, LlmError> {
        let request = self.build_request(thread, prompt);
        self.service.stream(&request).await
    }
}

/// Prior prompt/reply exchanges of one session
#[derive(Debug, Clone)]
pub struct AgentThread {
    id: String,
    messages: Vec<LlmMessage>,
}

impl AgentThread {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[LlmMessage] {
        &self.messages
    }

    pub fn push_exchange(&mut self, prompt: impl Into<String>, reply: impl Into<String>) {
        self.messages.push(LlmMessage::user(prompt));
        self.messages.push(LlmMessage::assistant(reply));
    }
}

impl Default for AgentThread {
    fn default() -> Self {
        Self::new()
    }
}
