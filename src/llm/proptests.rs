//! Property-based tests for the chat-completion wire translation
//!
//! These tests verify that translation between our internal types and the
//! `OpenAI` wire format preserves key invariants:
//! - Every message survives translation, in order, after the system prompt
//! - Prompt text is forwarded unmodified
//! - Streamed chunks reassemble into the original reply
//! - Status classification is total and stable

use super::openai::{Endpoint, OpenAIService};
use super::types::{LlmMessage, LlmRequest, MessageRole};
use super::{LlmError, LlmErrorKind};
use proptest::prelude::*;
use reqwest::StatusCode;
use serde_json::json;

// ============================================================================
// Strategies
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.!?,'\"\\\\\n]{0,80}"
}

fn arb_message() -> impl Strategy<Value = LlmMessage> {
    (any::<bool>(), arb_text()).prop_map(|(user, text)| {
        if user {
            LlmMessage::user(text)
        } else {
            LlmMessage::assistant(text)
        }
    })
}

fn arb_request() -> impl Strategy<Value = LlmRequest> {
    (
        proptest::option::of(arb_text()),
        proptest::collection::vec(arb_message(), 1..8),
        proptest::option::of(1u32..4096),
    )
        .prop_map(|(system, messages, max_tokens)| LlmRequest {
            system,
            messages,
            max_tokens,
        })
}

fn arb_endpoint() -> impl Strategy<Value = Endpoint> {
    prop_oneof![
        "[a-z]{3,10}".prop_map(|deployment| Endpoint::Azure {
            endpoint: "https://acme.openai.azure.com".to_string(),
            deployment,
            api_version: "2024-06-01".to_string(),
        }),
        "[a-z0-9-]{3,10}".prop_map(|model| Endpoint::OpenAI {
            base_url: "https://api.openai.com/v1".to_string(),
            model,
        }),
    ]
}

fn service(endpoint: Endpoint) -> OpenAIService {
    OpenAIService::new("test-key", endpoint).expect("client builds")
}

fn chunk(token: &str) -> String {
    json!({ "choices": [{ "index": 0, "delta": { "content": token } }] }).to_string()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_translate_preserves_messages(request in arb_request(), endpoint in arb_endpoint()) {
        let body = service(endpoint).translate_request(&request, false);

        let offset = usize::from(request.system.is_some());
        prop_assert_eq!(body.messages.len(), request.messages.len() + offset);
        if let Some(system) = &request.system {
            prop_assert_eq!(body.messages[0].role.as_str(), "system");
            prop_assert_eq!(body.messages[0].content.as_deref(), Some(system.as_str()));
        }
        for (wire, original) in body.messages[offset..].iter().zip(&request.messages) {
            prop_assert_eq!(wire.role.as_str(), original.role.as_str());
            prop_assert_eq!(wire.content.as_deref(), Some(original.content.as_str()));
        }
        prop_assert_eq!(body.max_tokens, request.max_tokens);
    }

    #[test]
    fn prop_model_only_in_openai_body(request in arb_request(), endpoint in arb_endpoint()) {
        let is_azure = matches!(endpoint, Endpoint::Azure { .. });
        let body = service(endpoint).translate_request(&request, true);
        prop_assert!(body.stream);
        prop_assert_eq!(body.model.is_none(), is_azure);
        prop_assert!(serde_json::to_string(&body).is_ok());
    }

    #[test]
    fn prop_stream_chunks_reassemble(tokens in proptest::collection::vec("[a-zA-Z0-9 .,!?\n]{1,12}", 0..20)) {
        let mut text = String::new();
        for token in &tokens {
            let parsed = OpenAIService::parse_stream_data(&chunk(token));
            match parsed {
                Some(Ok(t)) => text.push_str(&t),
                other => prop_assert!(false, "chunk not parsed: {:?}", other),
            }
        }
        prop_assert!(OpenAIService::parse_stream_data("[DONE]").is_none());
        prop_assert_eq!(text, tokens.concat());
    }

    #[test]
    fn prop_garbage_chunks_are_errors_not_panics(data in "[^\\[]{1,40}") {
        // Anything that is not a JSON object with choices is rejected or skipped
        if let Some(Ok(token)) = OpenAIService::parse_stream_data(&data) {
            prop_assert!(!token.is_empty());
        }
    }

    #[test]
    fn prop_status_classification(code in 400u16..600, message in arb_text()) {
        let status = StatusCode::from_u16(code).expect("valid status");
        let err = LlmError::from_status(status, &message);
        prop_assert!(err.message.contains(&message));
        let expected = match code {
            401 | 403 => LlmErrorKind::Auth,
            429 => LlmErrorKind::RateLimit,
            400 | 404 => LlmErrorKind::InvalidRequest,
            500..=599 => LlmErrorKind::ServerError,
            _ => LlmErrorKind::Unknown,
        };
        prop_assert_eq!(err.kind, expected);
        prop_assert_eq!(err.kind.is_transient(), code == 429 || code >= 500);
    }
}

#[test]
fn test_roles_map_to_wire_names() {
    assert_eq!(MessageRole::User.as_str(), "user");
    assert_eq!(MessageRole::Assistant.as_str(), "assistant");
}
