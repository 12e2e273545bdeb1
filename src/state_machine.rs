//! Scripted dialogue state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `transition(state, context, event)` returns the next state and the
//! effects the runtime must execute. No I/O happens here.

mod action;
mod effect;
mod event;
mod onboarding;
mod state;
mod support;
mod transition;

#[cfg(test)]
mod proptests;

pub use action::{ActionId, ActionView, UnknownAction};
pub use effect::Effect;
pub use event::{Event, Trigger};
pub use state::{DialogueState, Flow, HistoryEntry, OnboardingState, SessionContext, SupportState};
pub use transition::{start, transition, TransitionError, TransitionResult};
