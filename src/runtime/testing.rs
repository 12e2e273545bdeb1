//! Mock implementations for testing
//!
//! These mocks enable testing sessions and agents without network I/O.

use super::traits::CompletionClient;
use crate::agent::AgentThread;
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService, TokenStream, Usage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

type ScriptedReply = Result<Vec<Result<String, LlmError>>, LlmError>;

fn token_stream(items: Vec<Result<String, LlmError>>) -> TokenStream {
    Box::pin(futures::stream::iter(items))
}

// ============================================================================
// Mock Completion Client
// ============================================================================

/// Mock completion client that replays queued replies
pub struct MockCompletionClient {
    replies: Mutex<VecDeque<ScriptedReply>>,
    /// Prompts received, in order
    prompts: Mutex<Vec<String>>,
    /// Number of thread messages visible to each call
    thread_lengths: Mutex<Vec<usize>>,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            thread_lengths: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply delivered as the given tokens
    pub fn queue_tokens(&self, tokens: &[&str]) {
        let items = tokens.iter().map(|t| Ok((*t).to_string())).collect();
        self.replies.lock().unwrap().push_back(Ok(items));
    }

    /// Queue a stream that fails after the given tokens
    pub fn queue_broken_stream(&self, tokens: &[&str], error: LlmError) {
        let mut items: Vec<_> = tokens.iter().map(|t| Ok((*t).to_string())).collect();
        items.push(Err(error));
        self.replies.lock().unwrap().push_back(Ok(items));
    }

    /// Queue a failure to even start the call
    pub fn queue_error(&self, error: LlmError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn recorded_thread_lengths(&self) -> Vec<usize> {
        self.thread_lengths.lock().unwrap().clone()
    }

    fn next_reply(&self, thread: &AgentThread, prompt: &str) -> ScriptedReply {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.thread_lengths
            .lock()
            .unwrap()
            .push(thread.messages().len());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock reply queued")))
    }
}

impl Default for MockCompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn stream_reply(
        &self,
        thread: &AgentThread,
        prompt: &str,
    ) -> Result<TokenStream, LlmError> {
        self.next_reply(thread, prompt).map(token_stream)
    }

    async fn complete(&self, thread: &AgentThread, prompt: &str) -> Result<String, LlmError> {
        self.next_reply(thread, prompt)?
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map(|tokens| tokens.concat())
    }

    fn agent_name(&self) -> &str {
        "MockBot"
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

// ============================================================================
// Stub LLM Service
// ============================================================================

/// Service that gives the same reply to every request
pub struct StubLlmService {
    model_id: String,
    reply: Result<String, LlmError>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl StubLlmService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            reply: Ok(String::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(mut self, text: impl Into<String>) -> Self {
        self.reply = Ok(text.into());
        self
    }

    pub fn failing(mut self, error: LlmError) -> Self {
        self.reply = Err(error);
        self
    }

    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for StubLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let content = self.reply.clone()?;
        Ok(LlmResponse {
            content,
            usage: Usage::default(),
        })
    }

    async fn stream(&self, request: &LlmRequest) -> Result<TokenStream, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let text = self.reply.clone()?;
        let tokens = text
            .split_inclusive(' ')
            .map(|t| Ok(t.to_string()))
            .collect();
        Ok(token_stream(tokens))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
