//! Session runtime executor

use super::traits::CompletionClient;
use super::{ChatMessage, OutboundEvent, SessionCommand, SessionSnapshot};

use crate::agent::AgentThread;
use crate::state_machine::{
    start, transition, ActionId, DialogueState, Effect, Event, HistoryEntry, SessionContext,
    TransitionError, Trigger,
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};

/// Why a session runtime stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// The script ended the session
    Ended,
    /// No command arrived within the idle timeout and nobody was listening
    Idle,
    /// Every command sender was dropped
    Closed,
}

/// Generic session runtime that can work with any completion client
pub struct SessionRuntime<C>
where
    C: CompletionClient + 'static,
{
    context: SessionContext,
    state: DialogueState,
    history: Vec<HistoryEntry>,
    /// Buttons offered by the most recent bot message
    offered: Vec<ActionId>,
    /// Prior completion exchanges, so follow-up questions have context
    thread: AgentThread,
    client: Arc<C>,
    broadcast_tx: broadcast::Sender<OutboundEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    ended: bool,
}

impl<C> SessionRuntime<C>
where
    C: CompletionClient + 'static,
{
    pub fn new(
        context: SessionContext,
        client: C,
        broadcast_tx: broadcast::Sender<OutboundEvent>,
    ) -> Self {
        let state = DialogueState::initial(context.flow);
        let (snapshot_tx, _) = watch::channel(SessionSnapshot {
            session_id: context.session_id.clone(),
            flow: context.flow,
            state: state.clone(),
            history: Vec::new(),
            actions: Vec::new(),
            ended: false,
        });
        Self {
            context,
            state,
            history: Vec::new(),
            offered: Vec::new(),
            thread: AgentThread::new(),
            client: Arc::new(client),
            broadcast_tx,
            snapshot_tx,
            ended: false,
        }
    }

    /// Receiver for the snapshot published after every event
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.context.session_id.clone(),
            flow: self.context.flow,
            state: self.state.clone(),
            history: self.history.clone(),
            actions: self.offered.iter().map(|a| a.view()).collect(),
            ended: self.ended,
        }
    }

    fn publish(&self) -> SessionSnapshot {
        let snapshot = self.snapshot();
        self.snapshot_tx.send_replace(snapshot.clone());
        snapshot
    }

    /// Run the greeting of the session's script
    pub async fn start(&mut self) -> Result<(), TransitionError> {
        tracing::info!(
            session_id = %self.context.session_id,
            flow = %self.context.flow,
            thread_id = %self.thread.id(),
            model = %self.client.model_id(),
            "Starting session"
        );
        let result = start(self.context.flow, &self.context);
        self.state = result.new_state;
        for effect in result.effects {
            // Greetings only send and record messages
            if let Some(event) = self.execute_effect(effect).await {
                self.process_event(event).await?;
            }
        }
        self.publish();
        Ok(())
    }

    /// Handle commands until the session ends, its handle is dropped, or it
    /// sits idle for `idle_timeout` with no stream subscriber attached
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        idle_timeout: Duration,
    ) -> RunExit {
        tracing::info!(session_id = %self.context.session_id, "Session runtime running");

        let exit = loop {
            let SessionCommand { trigger, reply } =
                match tokio::time::timeout(idle_timeout, commands.recv()).await {
                    Ok(Some(command)) => command,
                    Ok(None) => break RunExit::Closed,
                    Err(_) if self.broadcast_tx.receiver_count() > 0 => continue,
                    Err(_) => break RunExit::Idle,
                };
            let result = self.handle(trigger).await.map_err(Into::into);
            // The caller may have gone away; the session carries on
            let _ = reply.send(result);
            if self.ended {
                break RunExit::Ended;
            }
        };

        tracing::info!(
            session_id = %self.context.session_id,
            exit = ?exit,
            "Session runtime stopped"
        );
        exit
    }

    /// Process one user trigger with all its chained events
    pub(crate) async fn handle(&mut self, trigger: Trigger) -> Result<SessionSnapshot, TransitionError> {
        let outcome = self.process_event(trigger.into()).await;
        let snapshot = self.publish();
        outcome.map(|()| snapshot)
    }

    async fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        // We need to process events in a loop to handle chained effects
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let kind = current_event.kind();
            // Pure state transition
            let result = match transition(&self.state, &self.context, current_event) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(
                        session_id = %self.context.session_id,
                        error = %e,
                        "Transition rejected"
                    );
                    let _ = self.broadcast_tx.send(OutboundEvent::Error {
                        message: e.to_string(),
                    });
                    return Err(e);
                }
            };

            let old_state = std::mem::replace(&mut self.state, result.new_state);
            if old_state != self.state {
                tracing::debug!(
                    session_id = %self.context.session_id,
                    event = kind,
                    from = old_state.name(),
                    to = self.state.name(),
                    "State changed"
                );
                let _ = self.broadcast_tx.send(OutboundEvent::StateChange {
                    state: self.state.clone(),
                });
            }

            // Execute effects and collect generated events
            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    fn author(&self) -> String {
        self.context.agent_name.clone()
    }

    async fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::SendMessage { text, actions } => {
                let message = ChatMessage {
                    id: uuid::Uuid::new_v4().to_string(),
                    author: self.author(),
                    content: text,
                    actions: actions.iter().map(|a| a.view()).collect(),
                };
                self.offered = actions;
                let _ = self.broadcast_tx.send(OutboundEvent::Message { message });
                None
            }

            Effect::RecordHistory { role, text } => {
                self.history.push(HistoryEntry::new(role, text));
                None
            }

            Effect::StreamCompletion { prompt } => Some(self.stream_completion(prompt).await),

            Effect::FinishStream { message_id, text } => {
                let message = ChatMessage {
                    id: message_id,
                    author: self.author(),
                    content: text,
                    actions: Vec::new(),
                };
                let _ = self.broadcast_tx.send(OutboundEvent::Message { message });
                None
            }

            Effect::GenerateWelcome { prompt } => {
                match self.client.complete(&self.thread, &prompt).await {
                    Ok(text) => {
                        self.thread.push_exchange(prompt, text.clone());
                        Some(Event::WelcomeGenerated { text })
                    }
                    Err(e) => Some(Event::CompletionFailed { message: e.message }),
                }
            }

            Effect::EndSession { message } => {
                tracing::warn!(
                    session_id = %self.context.session_id,
                    reason = %message,
                    "Ending session"
                );
                self.offered.clear();
                self.ended = true;
                let _ = self.broadcast_tx.send(OutboundEvent::Error { message });
                let _ = self.broadcast_tx.send(OutboundEvent::SessionEnded);
                None
            }
        }
    }

    /// Stream a reply token by token; the finished text comes back as an event
    async fn stream_completion(&mut self, prompt: String) -> Event {
        let message_id = uuid::Uuid::new_v4().to_string();
        self.offered.clear();

        let mut stream = match self.client.stream_reply(&self.thread, &prompt).await {
            Ok(stream) => stream,
            Err(e) => return Event::CompletionFailed { message: e.message },
        };

        let _ = self.broadcast_tx.send(OutboundEvent::StreamStart {
            message_id: message_id.clone(),
            author: self.client.agent_name().to_string(),
        });

        let mut text = String::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(token) => {
                    text.push_str(&token);
                    let _ = self.broadcast_tx.send(OutboundEvent::Token {
                        message_id: message_id.clone(),
                        token,
                    });
                }
                Err(e) => return Event::CompletionFailed { message: e.message },
            }
        }

        tracing::debug!(
            session_id = %self.context.session_id,
            message_id = %message_id,
            chars = text.len(),
            "Completion streamed"
        );
        self.thread.push_exchange(prompt, text.clone());
        Event::CompletionFinished { message_id, text }
    }
}
