//! Dialogue state types

use crate::llm::MessageRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Scripts
// ============================================================================

/// Which scripted conversation a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Pick an issue category, answer follow-ups, then free-form help
    #[default]
    TechSupport,
    /// Ask name, ask company, then a generated welcome
    Onboarding,
}

impl Flow {
    pub fn as_str(self) -> &'static str {
        match self {
            Flow::TechSupport => "tech_support",
            Flow::Onboarding => "onboarding",
        }
    }

    /// Author shown on bot messages
    pub fn agent_name(self) -> &'static str {
        match self {
            Flow::TechSupport => "TechSupportBot",
            Flow::Onboarding => "OnboardingBot",
        }
    }

    /// System instructions for the chat-completion agent. The flow itself is
    /// scripted, so these stay minimal.
    pub fn instructions(self) -> &'static str {
        match self {
            Flow::TechSupport => {
                "You are a friendly and helpful Tech Support Bot. \
                 Follow the conversational flow provided by the system."
            }
            Flow::Onboarding => {
                "You are the onboarding assistant of Acme Software. \
                 Write warm, concise messages."
            }
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tech_support" | "tech-support" | "support" => Ok(Flow::TechSupport),
            "onboarding" => Ok(Flow::Onboarding),
            other => Err(format!("unknown flow '{other}'")),
        }
    }
}

// ============================================================================
// States
// ============================================================================

/// Position in the technical-support script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SupportState {
    /// Waiting for an issue category
    #[default]
    Initial,
    /// Asked whether modem and router were restarted
    InternetAskRestart,
    /// User restarted; waiting for a description
    InternetRestartedYes,
    /// User was told to restart; waiting for feedback
    InternetRestartedNo,
    /// Waiting for the software name
    SoftwareAskName,
    /// Waiting for the problem with the named software
    SoftwareAskProblem { software_name: String },
    /// Waiting for a description of hardware symptoms
    HardwareAskSymptoms,
    /// Script done; free text goes to the chat-completion service
    Final,
}

impl SupportState {
    pub fn name(&self) -> &'static str {
        match self {
            SupportState::Initial => "initial",
            SupportState::InternetAskRestart => "internet_ask_restart",
            SupportState::InternetRestartedYes => "internet_restarted_yes",
            SupportState::InternetRestartedNo => "internet_restarted_no",
            SupportState::SoftwareAskName => "software_ask_name",
            SupportState::SoftwareAskProblem { .. } => "software_ask_problem",
            SupportState::HardwareAskSymptoms => "hardware_ask_symptoms",
            SupportState::Final => "final",
        }
    }
}

/// Position in the onboarding script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OnboardingState {
    #[default]
    AskName,
    AskCompany {
        name: String,
    },
    Complete {
        name: String,
        company: String,
    },
}

impl OnboardingState {
    pub fn name(&self) -> &'static str {
        match self {
            OnboardingState::AskName => "ask_name",
            OnboardingState::AskCompany { .. } => "ask_company",
            OnboardingState::Complete { .. } => "complete",
        }
    }
}

/// Session state: exactly one position in exactly one script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flow", content = "state", rename_all = "snake_case")]
pub enum DialogueState {
    TechSupport(SupportState),
    Onboarding(OnboardingState),
}

impl DialogueState {
    /// Entry state of a script
    pub fn initial(flow: Flow) -> Self {
        match flow {
            Flow::TechSupport => DialogueState::TechSupport(SupportState::Initial),
            Flow::Onboarding => DialogueState::Onboarding(OnboardingState::AskName),
        }
    }

    pub fn flow(&self) -> Flow {
        match self {
            DialogueState::TechSupport(_) => Flow::TechSupport,
            DialogueState::Onboarding(_) => Flow::Onboarding,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DialogueState::TechSupport(s) => s.name(),
            DialogueState::Onboarding(s) => s.name(),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// One line of the session transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// Per-session context (immutable configuration)
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub flow: Flow,
    /// Author of bot messages
    pub agent_name: String,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, flow: Flow) -> Self {
        Self {
            session_id: session_id.into(),
            flow,
            agent_name: flow.agent_name().to_string(),
        }
    }
}
