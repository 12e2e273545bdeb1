//! API request and response types

use crate::state_machine::{DialogueState, Flow};
use serde::{Deserialize, Serialize};

/// Request to start a chat session
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Script to run; the server default when absent
    #[serde(default)]
    pub flow: Option<Flow>,
}

/// Request to send a typed message
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// Request to click a button, by wire name
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: String,
}

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
    pub flow: Flow,
}

/// Response after a trigger was handled
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub state: DialogueState,
    pub ended: bool,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
