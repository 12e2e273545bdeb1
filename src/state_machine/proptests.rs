//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::llm::MessageRole;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context(flow: Flow) -> SessionContext {
    SessionContext::new("test-session", flow)
}

fn apply(state: &DialogueState, trigger: Trigger) -> TransitionResult {
    transition(state, &test_context(state.flow()), trigger.into())
        .expect("user triggers are handled in every state")
}

fn sent_messages(result: &TransitionResult) -> Vec<(&str, &[ActionId])> {
    result
        .effects
        .iter()
        .filter_map(|e| match e {
            Effect::SendMessage { text, actions } => Some((text.as_str(), actions.as_slice())),
            _ => None,
        })
        .collect()
}

fn prompts(result: &TransitionResult) -> Vec<&str> {
    result
        .effects
        .iter()
        .filter_map(|e| match e {
            Effect::StreamCompletion { prompt } => Some(prompt.as_str()),
            _ => None,
        })
        .collect()
}

fn is_start_over(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("start over")
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ,.'!?]{0,40}",
        Just("start over".to_string()),
        Just("  START OVER ".to_string()),
    ]
}

fn arb_action() -> impl Strategy<Value = ActionId> {
    proptest::sample::select(ActionId::ALL.to_vec())
}

fn arb_trigger() -> impl Strategy<Value = Trigger> {
    prop_oneof![
        arb_text().prop_map(Trigger::Message),
        arb_action().prop_map(Trigger::Action),
    ]
}

fn arb_support_state() -> impl Strategy<Value = SupportState> {
    prop_oneof![
        Just(SupportState::Initial),
        Just(SupportState::InternetAskRestart),
        Just(SupportState::InternetRestartedYes),
        Just(SupportState::InternetRestartedNo),
        Just(SupportState::SoftwareAskName),
        "[a-zA-Z]{1,12}".prop_map(|software_name| SupportState::SoftwareAskProblem { software_name }),
        Just(SupportState::HardwareAskSymptoms),
        Just(SupportState::Final),
    ]
}

fn arb_onboarding_state() -> impl Strategy<Value = OnboardingState> {
    prop_oneof![
        Just(OnboardingState::AskName),
        "[a-zA-Z]{1,12}".prop_map(|name| OnboardingState::AskCompany { name }),
        ("[a-zA-Z]{1,12}", "[a-zA-Z]{1,12}")
            .prop_map(|(name, company)| OnboardingState::Complete { name, company }),
    ]
}

fn arb_state() -> impl Strategy<Value = DialogueState> {
    prop_oneof![
        arb_support_state().prop_map(DialogueState::TechSupport),
        arb_onboarding_state().prop_map(DialogueState::Onboarding),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig { cases: 1000, max_global_rejects: 8192, ..ProptestConfig::default() })]

    // Invariant 1: every trigger is handled in every state
    #[test]
    fn prop_triggers_always_handled(state in arb_state(), trigger in arb_trigger()) {
        let event: Event = trigger.into();
        let result = transition(&state, &test_context(state.flow()), event);
        prop_assert!(result.is_ok(), "Unhandled trigger: {:?}", result);
        prop_assert_eq!(
            result.unwrap().new_state.flow(),
            state.flow(),
            "Flow must never change"
        );
    }

    // Invariant 2: transitions are deterministic
    #[test]
    fn prop_deterministic(state in arb_state(), trigger in arb_trigger()) {
        let first = apply(&state, trigger.clone());
        let second = apply(&state, trigger);
        prop_assert_eq!(first, second);
    }

    // Invariant 3: the user's input is recorded first, then exactly one outward effect
    #[test]
    fn prop_records_then_responds(state in arb_state(), trigger in arb_trigger()) {
        let result = apply(&state, trigger);
        prop_assert!(
            matches!(
                result.effects.first(),
                Some(Effect::RecordHistory { role: MessageRole::User, .. })
            ),
            "First effect should record the user: {:?}",
            result.effects
        );
        let outward = result
            .effects
            .iter()
            .filter(|e| matches!(
                e,
                Effect::SendMessage { .. }
                    | Effect::StreamCompletion { .. }
                    | Effect::GenerateWelcome { .. }
            ))
            .count();
        prop_assert_eq!(outward, 1, "effects: {:?}", result.effects);
    }

    // Invariant 4: every bot message sent is also recorded
    #[test]
    fn prop_sent_messages_are_recorded(state in arb_state(), trigger in arb_trigger()) {
        let result = apply(&state, trigger);
        for (text, _) in sent_messages(&result) {
            prop_assert!(result.effects.contains(&Effect::record_assistant(text)));
        }
    }

    // Invariant 5: free text from Initial keeps Initial and re-offers the top choices
    #[test]
    fn prop_initial_text_reoffers_choices(text in arb_text()) {
        let state = DialogueState::TechSupport(SupportState::Initial);
        let result = apply(&state, Trigger::Message(text));
        prop_assert_eq!(&result.new_state, &state);
        prop_assert_eq!(
            sent_messages(&result),
            vec![(
                "Sorry, I didn't understand that. Please choose one of the options above.",
                ActionId::TOP_LEVEL.as_slice()
            )]
        );
    }

    // Invariant 6: Final free text reaches the completion service once, unmodified
    #[test]
    fn prop_final_text_forwarded_verbatim(text in arb_text()) {
        prop_assume!(!is_start_over(&text));
        let state = DialogueState::TechSupport(SupportState::Final);
        let result = apply(&state, Trigger::Message(text.clone()));
        prop_assert_eq!(&result.new_state, &state);
        prop_assert_eq!(prompts(&result), vec![text.as_str()]);
    }

    // Invariant 7: internet path with "No" always ends in Final offering Start Over
    #[test]
    fn prop_internet_no_path_reaches_final(text in "[a-zA-Z0-9 ]{0,40}") {
        let state = DialogueState::TechSupport(SupportState::Initial);
        let state = apply(&state, Trigger::Action(ActionId::InternetIssue)).new_state;
        let state = apply(&state, Trigger::Action(ActionId::RestartedNo)).new_state;
        let last = apply(&state, Trigger::Message(text));
        prop_assert_eq!(&last.new_state, &DialogueState::TechSupport(SupportState::Final));
        prop_assert_eq!(sent_messages(&last)[0].1, [ActionId::StartOver].as_slice());
    }

    // Invariant 8: onboarding states never offer buttons
    #[test]
    fn prop_onboarding_offers_no_actions(state in arb_onboarding_state(), trigger in arb_trigger()) {
        let result = apply(&DialogueState::Onboarding(state), trigger);
        for (_, actions) in sent_messages(&result) {
            prop_assert!(actions.is_empty());
        }
    }
}

// ============================================================================
// Path Tests
// ============================================================================

#[test]
fn test_start_over_text_resets_from_final() {
    for text in ["start over", "START OVER", "  Start Over\n"] {
        let result = apply(
            &DialogueState::TechSupport(SupportState::Final),
            Trigger::Message(text.to_string()),
        );
        assert_eq!(
            result.new_state,
            DialogueState::TechSupport(SupportState::Initial)
        );
        assert_eq!(
            sent_messages(&result),
            vec![(
                "Welcome back to Tech Support! How can I help you today? Please choose an option:",
                ActionId::TOP_LEVEL.as_slice()
            )]
        );
        assert!(prompts(&result).is_empty());
    }
}

#[test]
fn test_full_software_path() {
    let mut state = start(Flow::TechSupport, &test_context(Flow::TechSupport)).new_state;
    let mut replies = Vec::new();
    for trigger in [
        Trigger::Action(ActionId::SoftwareProblem),
        Trigger::Message("Photoshop".to_string()),
        Trigger::Message("the brush lags".to_string()),
        Trigger::Message("what about GPU drivers?".to_string()),
    ] {
        let result = apply(&state, trigger);
        replies.extend(sent_messages(&result).iter().map(|(t, _)| (*t).to_string()));
        replies.extend(prompts(&result).iter().map(|p| format!("prompt: {p}")));
        state = result.new_state;
    }

    assert_eq!(state, DialogueState::TechSupport(SupportState::Final));
    assert_eq!(
        replies,
        vec![
            "For Software Problems, which software are you having trouble with? Please type the name.",
            "Okay, and what specific problem are you experiencing with Photoshop?",
            "Thanks for explaining the issue with Photoshop: 'the brush lags'. \
             We'll investigate this. Can I help with anything else?",
            "prompt: what about GPU drivers?",
        ]
    );
}

#[test]
fn test_actions_recorded_with_label() {
    let result = apply(
        &DialogueState::TechSupport(SupportState::InternetAskRestart),
        Trigger::Action(ActionId::RestartedYes),
    );
    assert_eq!(result.effects[0], Effect::record_user("Action: Yes, I tried"));
}
