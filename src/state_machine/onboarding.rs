//! Onboarding script: name, company, generated welcome

use super::transition::unavailable;
use super::{Effect, Event, OnboardingState, TransitionError};

type TransitionResult = super::TransitionResult<OnboardingState>;

const GREETING: &str = "Hi! Welcome to Acme Software. Let's get you onboarded.";
const ASK_NAME: &str = "What\u{2019}s your name?";
const ALL_SET: &str = "Thanks! You're all set.";
const ALREADY_ONBOARDED: &str = "You're already onboarded.";
const TYPE_ANSWER: &str = "Please type your answer in the message box.";

pub(super) fn start() -> TransitionResult {
    TransitionResult::new(OnboardingState::AskName)
        .with_effects(Effect::reply(GREETING, &[]))
        .with_effects(Effect::reply(ASK_NAME, &[]))
}

/// Prompt for the welcome message generated on completion
pub fn welcome_prompt(name: &str, company: &str) -> String {
    format!(
        "Write a short, friendly welcome message for {name} from {company}, \
         who just signed up for Acme Software. Reply with the message only."
    )
}

pub(super) fn transition(
    state: &OnboardingState,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    use OnboardingState as S;

    let result = match (state, event) {
        (S::AskName, Event::UserMessage { text }) => {
            let name = text.trim().to_string();
            let reply = format!("Great, {name}! What's the name of your company?");
            TransitionResult::new(S::AskCompany { name })
                .with_effect(Effect::record_user(text))
                .with_effects(Effect::reply(reply, &[]))
        }
        (S::AskCompany { name }, Event::UserMessage { text }) => {
            let company = text.trim().to_string();
            let prompt = welcome_prompt(name, &company);
            TransitionResult::new(S::Complete {
                name: name.clone(),
                company,
            })
            .with_effect(Effect::record_user(text))
            .with_effect(Effect::GenerateWelcome { prompt })
        }
        (S::Complete { name, company }, Event::WelcomeGenerated { text }) => {
            let welcome = if text.trim().is_empty() {
                format!("Welcome to Acme Software, {name} from {company}!")
            } else {
                text
            };
            TransitionResult::new(state.clone())
                .with_effects(Effect::reply(welcome, &[]))
                .with_effects(Effect::reply(ALL_SET, &[]))
        }
        (S::Complete { .. }, Event::CompletionFailed { message }) => {
            TransitionResult::new(state.clone()).with_effect(unavailable(&message))
        }
        (S::Complete { .. }, Event::UserMessage { text }) => TransitionResult::new(state.clone())
            .with_effect(Effect::record_user(text))
            .with_effects(Effect::reply(ALREADY_ONBOARDED, &[])),
        (_, Event::ActionClicked { action }) => TransitionResult::new(state.clone())
            .with_effect(Effect::record_action(action))
            .with_effects(Effect::reply(TYPE_ANSWER, &[])),
        (state, event) => return Err(TransitionError::unexpected(state.name(), &event)),
    };

    Ok(result)
}
