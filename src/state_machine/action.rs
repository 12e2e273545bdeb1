//! Fixed action identifiers offered as buttons

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A button the user can click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionId {
    #[serde(rename = "internet_issue")]
    InternetIssue,
    #[serde(rename = "software_problem")]
    SoftwareProblem,
    #[serde(rename = "hardware_failure")]
    HardwareFailure,
    #[serde(rename = "internet_restarted_yes")]
    RestartedYes,
    #[serde(rename = "internet_restarted_no")]
    RestartedNo,
    #[serde(rename = "start_over")]
    StartOver,
}

impl ActionId {
    pub const ALL: [ActionId; 6] = [
        ActionId::InternetIssue,
        ActionId::SoftwareProblem,
        ActionId::HardwareFailure,
        ActionId::RestartedYes,
        ActionId::RestartedNo,
        ActionId::StartOver,
    ];

    /// The three issue categories offered at the top of the script
    pub const TOP_LEVEL: [ActionId; 3] = [
        ActionId::InternetIssue,
        ActionId::SoftwareProblem,
        ActionId::HardwareFailure,
    ];

    pub const RESTART_ANSWERS: [ActionId; 2] = [ActionId::RestartedYes, ActionId::RestartedNo];

    /// Wire name used by the UI callbacks
    pub fn name(self) -> &'static str {
        match self {
            ActionId::InternetIssue => "internet_issue",
            ActionId::SoftwareProblem => "software_problem",
            ActionId::HardwareFailure => "hardware_failure",
            ActionId::RestartedYes => "internet_restarted_yes",
            ActionId::RestartedNo => "internet_restarted_no",
            ActionId::StartOver => "start_over",
        }
    }

    /// Button text
    pub fn label(self) -> &'static str {
        match self {
            ActionId::InternetIssue => "Internet Issue",
            ActionId::SoftwareProblem => "Software Problem",
            ActionId::HardwareFailure => "Hardware Failure",
            ActionId::RestartedYes => "Yes, I tried",
            ActionId::RestartedNo => "No, I haven't",
            ActionId::StartOver => "Start Over",
        }
    }

    pub fn value(self) -> &'static str {
        match self {
            ActionId::InternetIssue => "Internet Issue",
            ActionId::SoftwareProblem => "Software Problem",
            ActionId::HardwareFailure => "Hardware Failure",
            ActionId::RestartedYes => "Yes",
            ActionId::RestartedNo => "No",
            ActionId::StartOver => "Start Over",
        }
    }

    pub fn view(self) -> ActionView {
        ActionView {
            name: self.name(),
            label: self.label(),
            value: self.value(),
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for ActionId {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionId::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Button as rendered by the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionView {
    pub name: &'static str,
    pub label: &'static str,
    pub value: &'static str,
}
