//! Effects produced by state transitions

use super::ActionId;
use crate::llm::MessageRole;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show a bot message, offering the given buttons
    SendMessage {
        text: String,
        actions: Vec<ActionId>,
    },

    /// Append to the session transcript
    RecordHistory { role: MessageRole, text: String },

    /// Forward the prompt verbatim to the chat-completion service and stream
    /// the reply to the UI
    StreamCompletion { prompt: String },

    /// Replace a streamed draft with its final text
    FinishStream { message_id: String, text: String },

    /// Ask the chat-completion service for an onboarding welcome
    GenerateWelcome { prompt: String },

    /// Tell the user the session cannot continue and stop it
    EndSession { message: String },
}

impl Effect {
    pub fn send(text: impl Into<String>, actions: &[ActionId]) -> Self {
        Effect::SendMessage {
            text: text.into(),
            actions: actions.to_vec(),
        }
    }

    pub fn record_user(text: impl Into<String>) -> Self {
        Effect::RecordHistory {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn record_assistant(text: impl Into<String>) -> Self {
        Effect::RecordHistory {
            role: MessageRole::Assistant,
            text: text.into(),
        }
    }

    /// Transcript line for a clicked button
    pub fn record_action(action: ActionId) -> Self {
        Self::record_user(format!("Action: {}", action.label()))
    }

    /// Send a bot message and record it
    pub fn reply(text: impl Into<String>, actions: &[ActionId]) -> [Self; 2] {
        let text = text.into();
        [Self::send(text.clone(), actions), Self::record_assistant(text)]
    }
}
