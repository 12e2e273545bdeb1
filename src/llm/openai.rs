//! `OpenAI` and Azure `OpenAI` chat-completions implementation

use super::types::{LlmRequest, LlmResponse, TokenStream, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where chat-completion requests are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Azure `OpenAI` deployment; authenticated with an `api-key` header
    Azure {
        endpoint: String,
        deployment: String,
        api_version: String,
    },
    /// `OpenAI` or an `OpenAI`-compatible server; bearer-token auth
    OpenAI { base_url: String, model: String },
}

impl Endpoint {
    pub fn url(&self) -> String {
        match self {
            Endpoint::Azure {
                endpoint,
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
                endpoint.trim_end_matches('/')
            ),
            Endpoint::OpenAI { base_url, .. } => {
                format!("{}/chat/completions", base_url.trim_end_matches('/'))
            }
        }
    }

    /// Deployment name for Azure, model name otherwise
    pub fn model_id(&self) -> &str {
        match self {
            Endpoint::Azure { deployment, .. } => deployment,
            Endpoint::OpenAI { model, .. } => model,
        }
    }

    /// Azure selects the model through the deployment in the URL
    fn body_model(&self) -> Option<String> {
        match self {
            Endpoint::Azure { .. } => None,
            Endpoint::OpenAI { model, .. } => Some(model.clone()),
        }
    }
}

/// OpenAI-compatible service implementation
pub struct OpenAIService {
    client: Client,
    api_key: String,
    endpoint: Endpoint,
}

impl OpenAIService {
    pub fn new(api_key: impl Into<String>, endpoint: Endpoint) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint,
        })
    }

    pub(super) fn translate_request(&self, request: &LlmRequest, stream: bool) -> OpenAIRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: Some(system.clone()),
            });
        }

        messages.extend(request.messages.iter().map(|m| OpenAIMessage {
            role: m.role.as_str().to_string(),
            content: Some(m.content.clone()),
        }));

        OpenAIRequest {
            model: self.endpoint.body_model(),
            messages,
            max_tokens: request.max_tokens,
            stream,
        }
    }

    /// Send the request, turning non-success statuses into classified errors
    async fn send(&self, body: &OpenAIRequest) -> Result<reqwest::Response, LlmError> {
        let builder = self.client.post(self.endpoint.url()).json(body);
        let builder = match &self.endpoint {
            Endpoint::Azure { .. } => builder.header("api-key", &self.api_key),
            Endpoint::OpenAI { .. } => builder.bearer_auth(&self.api_key),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;
        let message = serde_json::from_str::<OpenAIErrorResponse>(&body)
            .map_or(body, |resp| resp.error.message);
        Err(LlmError::from_status(status, &message))
    }

    fn normalize_response(resp: OpenAIResponse) -> Result<LlmResponse, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::unknown("No choices in response"))?;

        let usage = resp.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u64::from(u.prompt_tokens),
            output_tokens: u64::from(u.completion_tokens),
        });

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
        })
    }

    /// Content token carried by one SSE data payload, if any
    pub(super) fn parse_stream_data(data: &str) -> Option<Result<String, LlmError>> {
        if data == "[DONE]" {
            return None;
        }
        match serde_json::from_str::<OpenAIStreamChunk>(data) {
            // Azure opens the stream with a content-filter chunk that has no choices
            Ok(chunk) => chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .filter(|token| !token.is_empty())
                .map(Ok),
            Err(e) => Some(Err(LlmError::unknown(format!(
                "Failed to parse stream chunk: {e}"
            )))),
        }
    }
}

#[async_trait]
impl LlmService for OpenAIService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = self.translate_request(request, false);
        let response = self.send(&body).await?;

        let text = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        let parsed: OpenAIResponse = serde_json::from_str(&text).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {text}"))
        })?;

        Self::normalize_response(parsed)
    }

    async fn stream(&self, request: &LlmRequest) -> Result<TokenStream, LlmError> {
        let body = self.translate_request(request, true);
        let response = self.send(&body).await?;

        let stream = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                match event {
                    Ok(event) => Self::parse_stream_data(&event.data),
                    Err(e) => Some(Err(LlmError::network(format!("Stream interrupted: {e}")))),
                }
            });

        Ok(Box::pin(stream))
    }

    fn model_id(&self) -> &str {
        self.endpoint.model_id()
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
pub(super) struct OpenAIRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) model: Option<String>,
    pub(super) messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) max_tokens: Option<u32>,
    pub(super) stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct OpenAIMessage {
    pub(super) role: String,
    #[serde(default)]
    pub(super) content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChoice {
    #[serde(default)]
    delta: OpenAIDelta,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}
