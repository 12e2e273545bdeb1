//! Process configuration
//!
//! Values come from the environment, optionally seeded from a `.env` file.

use crate::llm::LlmConfig;
use crate::runtime::DEFAULT_IDLE_TIMEOUT;
use crate::state_machine::Flow;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid HELPDESK_PORT '{0}'")]
    InvalidPort(String),
    #[error("invalid HELPDESK_FLOW: {0}")]
    InvalidFlow(String),
    #[error("invalid HELPDESK_SESSION_IDLE_SECS '{0}'")]
    InvalidIdleTimeout(String),
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Script used when a session does not ask for one
    pub default_flow: Flow,
    /// How long a session with no commands and no stream subscriber is kept
    pub session_idle_timeout: Duration,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match set("HELPDESK_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        let default_flow = match set("HELPDESK_FLOW") {
            Some(raw) => raw.parse().map_err(ConfigError::InvalidFlow)?,
            None => Flow::default(),
        };

        let session_idle_timeout = match set("HELPDESK_SESSION_IDLE_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidIdleTimeout(raw)),
            },
            None => DEFAULT_IDLE_TIMEOUT,
        };

        Ok(Self {
            port,
            default_flow,
            session_idle_timeout,
            llm: LlmConfig::from_lookup(&lookup),
        })
    }
}

/// Load `../.env`, or `.env` when there is none. Variables already set are
/// never overridden. Returns the loaded file; logging is not up yet when
/// this runs.
pub fn load_dotenv() -> Option<PathBuf> {
    load_dotenv_from(Path::new("."))
}

/// Load `<dir>/../.env`, else `<dir>/.env`, without searching further up
fn load_dotenv_from(dir: &Path) -> Option<PathBuf> {
    [dir.join("..").join(".env"), dir.join(".env")]
        .into_iter()
        .find(|path| dotenvy::from_path(path).is_ok())
}
