//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! next state and effects. Script-specific tables live in `support` and
//! `onboarding`.

use super::{onboarding, support, DialogueState, Effect, Event, Flow, SessionContext};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult<S = DialogueState> {
    pub new_state: S,
    pub effects: Vec<Effect>,
}

impl<S> TransitionResult<S> {
    pub fn new(state: S) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// Lift a script-local result into another state type
    pub fn map_state<T>(self, f: impl FnOnce(S) -> T) -> TransitionResult<T> {
        TransitionResult {
            new_state: f(self.new_state),
            effects: self.effects,
        }
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// A completion event arrived in a state that never requested one
    #[error("Unexpected {event} in state {state}")]
    UnexpectedEvent {
        state: &'static str,
        event: &'static str,
    },
}

impl TransitionError {
    pub(super) fn unexpected(state: &'static str, event: &Event) -> Self {
        TransitionError::UnexpectedEvent {
            state,
            event: event.kind(),
        }
    }
}

/// Entry state and greeting of a script
pub fn start(flow: Flow, _context: &SessionContext) -> TransitionResult {
    match flow {
        Flow::TechSupport => support::start().map_state(DialogueState::TechSupport),
        Flow::Onboarding => onboarding::start().map_state(DialogueState::Onboarding),
    }
}

/// Pure transition function
pub fn transition(
    state: &DialogueState,
    _context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match state {
        DialogueState::TechSupport(s) => {
            support::transition(s, event).map(|r| r.map_state(DialogueState::TechSupport))
        }
        DialogueState::Onboarding(s) => {
            onboarding::transition(s, event).map(|r| r.map_state(DialogueState::Onboarding))
        }
    }
}

/// Message shown when a completion call fails; the session ends afterwards
pub(super) fn unavailable(message: &str) -> Effect {
    Effect::EndSession {
        message: format!("The assistant is unavailable: {message}"),
    }
}
