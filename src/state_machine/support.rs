//! Technical-support script
//!
//! Free text before `Final` is interpolated verbatim into canned replies and
//! never parsed for intent. In `Final` it is forwarded to the chat-completion
//! service.

use super::transition::unavailable;
use super::{ActionId, Effect, Event, SupportState, TransitionError};

type TransitionResult = super::TransitionResult<SupportState>;

const WELCOME: &str =
    "Welcome to Tech Support! How can I help you today? Please choose an option:";
const WELCOME_BACK: &str =
    "Welcome back to Tech Support! How can I help you today? Please choose an option:";
const NOT_UNDERSTOOD: &str =
    "Sorry, I didn't understand that. Please choose one of the options above.";
const ASK_RESTART: &str =
    "Okay, for Internet Issues, have you tried restarting your modem and router?";
const ASK_SOFTWARE_NAME: &str =
    "For Software Problems, which software are you having trouble with? Please type the name.";
const ASK_HARDWARE_SYMPTOMS: &str = "I'm sorry to hear you're having a hardware failure. \
     To help us diagnose it, please describe the symptoms you're observing.";
const RESTARTED_YES: &str = "Got it. Could you please describe the issue in more detail? \
     For example, are websites loading slowly, or are you completely disconnected?";
const RESTARTED_NO: &str = "Please try restarting your modem and router first. \
     This often resolves common connectivity issues. Let me know if that helps!";
const YES_OR_NO: &str = "Please select 'Yes' or 'No' using the buttons.";
const FINAL_REPROMPT: &str = "Type your question below, or choose 'Start Over' to begin again.";

/// Used when the completion service streams back nothing
const EMPTY_COMPLETION_FALLBACK: &str =
    "Is there anything specific I can help you with regarding that?";

pub(super) fn start() -> TransitionResult {
    TransitionResult::new(SupportState::Initial)
        .with_effects(Effect::reply(WELCOME, &ActionId::TOP_LEVEL))
}

pub(super) fn transition(
    state: &SupportState,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    use SupportState as S;

    let result = match (state, event) {
        // Start Over is honored everywhere
        (_, Event::ActionClicked { action: ActionId::StartOver }) => {
            restart(Effect::record_action(ActionId::StartOver))
        }
        (S::Final, Event::UserMessage { text }) if is_start_over(&text) => {
            restart(Effect::record_user(text))
        }

        // ============================================================
        // Initial
        // ============================================================
        (S::Initial, Event::ActionClicked { action: ActionId::InternetIssue }) => {
            TransitionResult::new(S::InternetAskRestart)
                .with_effect(Effect::record_action(ActionId::InternetIssue))
                .with_effects(Effect::reply(ASK_RESTART, &ActionId::RESTART_ANSWERS))
        }
        (S::Initial, Event::ActionClicked { action: ActionId::SoftwareProblem }) => {
            TransitionResult::new(S::SoftwareAskName)
                .with_effect(Effect::record_action(ActionId::SoftwareProblem))
                .with_effects(Effect::reply(ASK_SOFTWARE_NAME, &[]))
        }
        (S::Initial, Event::ActionClicked { action: ActionId::HardwareFailure }) => {
            TransitionResult::new(S::HardwareAskSymptoms)
                .with_effect(Effect::record_action(ActionId::HardwareFailure))
                .with_effects(Effect::reply(ASK_HARDWARE_SYMPTOMS, &[]))
        }

        // ============================================================
        // Internet branch
        // ============================================================
        (S::InternetAskRestart, Event::ActionClicked { action: ActionId::RestartedYes }) => {
            TransitionResult::new(S::InternetRestartedYes)
                .with_effect(Effect::record_action(ActionId::RestartedYes))
                .with_effects(Effect::reply(RESTARTED_YES, &[]))
        }
        (S::InternetAskRestart, Event::ActionClicked { action: ActionId::RestartedNo }) => {
            TransitionResult::new(S::InternetRestartedNo)
                .with_effect(Effect::record_action(ActionId::RestartedNo))
                .with_effects(Effect::reply(RESTARTED_NO, &[]))
        }
        (S::InternetRestartedYes, Event::UserMessage { text }) => {
            let reply = format!(
                "Thank you for the details about your internet issue: '{text}'. \
                 We'll look into it. Is there anything else I can help with today?"
            );
            finish(text, reply)
        }
        (S::InternetRestartedNo, Event::UserMessage { text }) => {
            let reply = format!(
                "Okay, you mentioned: '{text}'. If restarting didn't help or you have \
                 other concerns, let me know. Otherwise, is there anything else?"
            );
            finish(text, reply)
        }

        // ============================================================
        // Software branch
        // ============================================================
        (S::SoftwareAskName, Event::UserMessage { text }) => {
            let reply = format!("Okay, and what specific problem are you experiencing with {text}?");
            TransitionResult::new(S::SoftwareAskProblem {
                software_name: text.clone(),
            })
            .with_effect(Effect::record_user(text))
            .with_effects(Effect::reply(reply, &[]))
        }
        (S::SoftwareAskProblem { software_name }, Event::UserMessage { text }) => {
            let reply = format!(
                "Thanks for explaining the issue with {software_name}: '{text}'. \
                 We'll investigate this. Can I help with anything else?"
            );
            finish(text, reply)
        }

        // ============================================================
        // Hardware branch
        // ============================================================
        (S::HardwareAskSymptoms, Event::UserMessage { text }) => {
            let reply = format!(
                "Thank you for describing the hardware symptoms: '{text}'. \
                 A specialist will review this. Is there further assistance you need?"
            );
            finish(text, reply)
        }

        // ============================================================
        // Final: free text goes to the completion service
        // ============================================================
        (S::Final, Event::UserMessage { text }) => TransitionResult::new(S::Final)
            .with_effect(Effect::record_user(text.clone()))
            .with_effect(Effect::StreamCompletion { prompt: text }),
        (S::Final, Event::CompletionFinished { message_id, text }) => {
            let text = if text.trim().is_empty() {
                EMPTY_COMPLETION_FALLBACK.to_string()
            } else {
                text
            };
            TransitionResult::new(S::Final)
                .with_effect(Effect::FinishStream {
                    message_id,
                    text: text.clone(),
                })
                .with_effect(Effect::record_assistant(text))
        }
        (S::Final, Event::CompletionFailed { message }) => {
            TransitionResult::new(S::Final).with_effect(unavailable(&message))
        }

        // ============================================================
        // Fallbacks
        // ============================================================
        (S::Initial, Event::UserMessage { text }) => TransitionResult::new(S::Initial)
            .with_effect(Effect::record_user(text))
            .with_effects(Effect::reply(NOT_UNDERSTOOD, &ActionId::TOP_LEVEL)),
        (S::InternetAskRestart, Event::UserMessage { text }) => {
            TransitionResult::new(S::InternetAskRestart)
                .with_effect(Effect::record_user(text))
                .with_effects(Effect::reply(YES_OR_NO, &ActionId::RESTART_ANSWERS))
        }
        (state, Event::ActionClicked { action }) => {
            let (text, actions) = reprompt(state);
            TransitionResult::new(state.clone())
                .with_effect(Effect::record_action(action))
                .with_effects(Effect::reply(text, actions))
        }
        (state, event) => return Err(TransitionError::unexpected(state.name(), &event)),
    };

    Ok(result)
}

fn restart(record: Effect) -> TransitionResult {
    TransitionResult::new(SupportState::Initial)
        .with_effect(record)
        .with_effects(Effect::reply(WELCOME_BACK, &ActionId::TOP_LEVEL))
}

fn finish(text: String, reply: String) -> TransitionResult {
    TransitionResult::new(SupportState::Final)
        .with_effect(Effect::record_user(text))
        .with_effects(Effect::reply(reply, &[ActionId::StartOver]))
}

fn is_start_over(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("start over")
}

/// What to say when a button is clicked that the state does not offer
fn reprompt(state: &SupportState) -> (String, &'static [ActionId]) {
    match state {
        SupportState::Initial => (NOT_UNDERSTOOD.to_string(), &ActionId::TOP_LEVEL),
        SupportState::InternetAskRestart => (YES_OR_NO.to_string(), &ActionId::RESTART_ANSWERS),
        SupportState::InternetRestartedYes => {
            ("Please describe the issue in the message box.".to_string(), &[])
        }
        SupportState::InternetRestartedNo => (
            "Please let me know in the message box whether restarting helped.".to_string(),
            &[],
        ),
        SupportState::SoftwareAskName => (
            "Please type the name of the software you're having trouble with.".to_string(),
            &[],
        ),
        SupportState::SoftwareAskProblem { software_name } => (
            format!("Please describe the problem you're experiencing with {software_name}."),
            &[],
        ),
        SupportState::HardwareAskSymptoms => (
            "Please describe the symptoms you're observing in the message box.".to_string(),
            &[],
        ),
        SupportState::Final => (FINAL_REPROMPT.to_string(), &[ActionId::StartOver]),
    }
}
