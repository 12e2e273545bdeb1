//! Runtime for executing dialogue sessions
//!
//! Each session runs in its own task and handles one event at a time.
//! The [`SessionManager`] maps session ids to handles on those tasks.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{RunExit, SessionRuntime};
pub use traits::*;

use crate::agent::ChatCompletionAgent;
use crate::llm::LlmService;
use crate::state_machine::{
    ActionView, DialogueState, Flow, HistoryEntry, SessionContext, TransitionError, Trigger,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch, RwLock};

/// Errors surfaced to callers of the session manager
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Error initializing AI service: {0}")]
    ServiceUnavailable(String),
    #[error("Agent not initialized. Please restart chat.")]
    NotFound,
    #[error("Session has ended. Please restart chat.")]
    Ended,
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// A bot message as shown by the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub author: String,
    pub content: String,
    pub actions: Vec<ActionView>,
}

/// Point-in-time view of a session, republished after every event
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub flow: Flow,
    pub state: DialogueState,
    pub history: Vec<HistoryEntry>,
    /// Buttons offered by the most recent bot message
    pub actions: Vec<ActionView>,
    pub ended: bool,
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum OutboundEvent {
    Init {
        snapshot: SessionSnapshot,
    },
    Message {
        message: ChatMessage,
    },
    StreamStart {
        message_id: String,
        author: String,
    },
    Token {
        message_id: String,
        token: String,
    },
    StateChange {
        state: DialogueState,
    },
    Error {
        message: String,
    },
    SessionEnded,
}

/// A trigger submitted to a session, acknowledged once all its effects ran
#[derive(Debug)]
pub struct SessionCommand {
    pub trigger: Trigger,
    pub reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub command_tx: mpsc::Sender<SessionCommand>,
    pub broadcast_tx: broadcast::Sender<OutboundEvent>,
    pub snapshot_rx: watch::Receiver<SessionSnapshot>,
}

/// How long an unattended session waits for its next command
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

type SessionMap = Arc<RwLock<HashMap<String, SessionHandle>>>;

/// Manager for all session runtimes
pub struct SessionManager {
    /// The chat-completion service, or why it could not be initialized
    service: Result<Arc<dyn LlmService>, String>,
    default_flow: Flow,
    idle_timeout: Duration,
    sessions: SessionMap,
}

impl SessionManager {
    pub fn new(service: Result<Arc<dyn LlmService>, String>, default_flow: Flow) -> Self {
        Self {
            service,
            default_flow,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Discard sessions left without commands or stream subscribers this long
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Create a session, run its greeting, and start its runtime
    pub async fn start_session(&self, flow: Option<Flow>) -> Result<SessionSnapshot, SessionError> {
        let service = self
            .service
            .as_ref()
            .map_err(|e| SessionError::ServiceUnavailable(e.clone()))?;
        let flow = flow.unwrap_or(self.default_flow);
        let agent = ChatCompletionAgent::new(flow.agent_name(), flow.instructions(), service.clone());
        self.launch(flow, agent).await
    }

    async fn launch<C: CompletionClient + 'static>(
        &self,
        flow: Flow,
        client: C,
    ) -> Result<SessionSnapshot, SessionError> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let context = SessionContext::new(&session_id, flow);

        let (command_tx, command_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);

        let mut runtime = SessionRuntime::new(context, client, broadcast_tx.clone());
        runtime.start().await?;
        let snapshot_rx = runtime.watch();
        let snapshot = snapshot_rx.borrow().clone();

        let active = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(
                session_id.clone(),
                SessionHandle {
                    command_tx,
                    broadcast_tx,
                    snapshot_rx,
                },
            );
            sessions.len()
        };

        let sessions = Arc::clone(&self.sessions);
        let idle_timeout = self.idle_timeout;
        let id = session_id.clone();
        tokio::spawn(async move {
            let exit = runtime.run(command_rx, idle_timeout).await;
            if exit == RunExit::Ended {
                // Keep answering 410 for a while before forgetting the session
                tokio::time::sleep(idle_timeout).await;
            }
            if sessions.write().await.remove(&id).is_some() {
                tracing::info!(
                    session_id = %id,
                    exit = ?exit,
                    "Session discarded after runtime stopped"
                );
            }
        });

        tracing::info!(session_id = %session_id, flow = %flow, active, "Session started");
        Ok(snapshot)
    }

    async fn get(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or(SessionError::NotFound)
    }

    /// Drop a session whose runtime has stopped
    async fn evict(&self, session_id: &str) {
        if self.sessions.write().await.remove(session_id).is_some() {
            tracing::info!(session_id = %session_id, "Evicted ended session");
        }
    }

    /// Submit a trigger and wait until the session has handled it
    pub async fn dispatch(
        &self,
        session_id: &str,
        trigger: Trigger,
    ) -> Result<SessionSnapshot, SessionError> {
        let handle = self.get(session_id).await?;
        if handle.snapshot_rx.borrow().ended {
            self.evict(session_id).await;
            return Err(SessionError::Ended);
        }

        let (reply, reply_rx) = oneshot::channel();
        if handle
            .command_tx
            .send(SessionCommand { trigger, reply })
            .await
            .is_err()
        {
            self.evict(session_id).await;
            return Err(SessionError::Ended);
        }

        reply_rx.await.map_err(|_| SessionError::Ended)?
    }

    pub async fn snapshot(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        let handle = self.get(session_id).await?;
        let snapshot = handle.snapshot_rx.borrow().clone();
        Ok(snapshot)
    }

    /// Subscribe to session updates; the snapshot is taken after subscribing
    /// so no event falls between the two
    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<OutboundEvent>), SessionError> {
        let handle = self.get(session_id).await?;
        let rx = handle.broadcast_tx.subscribe();
        let snapshot = handle.snapshot_rx.borrow().clone();
        Ok((snapshot, rx))
    }

    /// Discard a session. Its runtime stops once the command channel closes.
    pub async fn end_session(&self, session_id: &str) -> Result<(), SessionError> {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(_) => {
                tracing::info!(session_id = %session_id, "Session discarded");
                Ok(())
            }
            None => Err(SessionError::NotFound),
        }
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
