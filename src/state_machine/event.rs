//! Events that can occur in a session

use super::ActionId;

/// An incoming UI event: a typed message or a button click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Message(String),
    Action(ActionId),
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    UserMessage { text: String },
    ActionClicked { action: ActionId },

    // Chat-completion events
    /// Streamed reply finished; `text` is the concatenation of all tokens
    CompletionFinished { message_id: String, text: String },
    /// One-shot welcome message generated
    WelcomeGenerated { text: String },
    CompletionFailed { message: String },
}

impl From<Trigger> for Event {
    fn from(trigger: Trigger) -> Self {
        match trigger {
            Trigger::Message(text) => Event::UserMessage { text },
            Trigger::Action(action) => Event::ActionClicked { action },
        }
    }
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::UserMessage { .. } => "user_message",
            Event::ActionClicked { .. } => "action_clicked",
            Event::CompletionFinished { .. } => "completion_finished",
            Event::WelcomeGenerated { .. } => "welcome_generated",
            Event::CompletionFailed { .. } => "completion_failed",
        }
    }
}
