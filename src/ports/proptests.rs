//! Property-based tests for prompt construction and reply cleanup
//!
//! Whatever the history or the model's reply looks like:
//! - chat history starts with user input and alternates roles
//! - every recorded turn reaches the model
//! - cleanup is idempotent and never leaves a leading speaker label
//! - summary parsing always yields at least one field

use super::prompt::{clean_response, history_messages, parse_summary};
use crate::conversation::{Role, Turn};
use crate::llm::MessageRole;
use chrono::Utc;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::ParticipantA),
        Just(Role::ParticipantB),
        Just(Role::Summarizer),
    ]
}

fn arb_history() -> impl Strategy<Value = Vec<Turn>> {
    proptest::collection::vec((arb_role(), "[a-zA-Z0-9 .,!?]{1,40}"), 0..20).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (role, content))| Turn {
                sequence: u32::try_from(i).unwrap_or(u32::MAX),
                role,
                content,
                timestamp: Utc::now(),
            })
            .collect()
    })
}

fn arb_label() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("[Participant A]: ".to_string()),
        Just("[Participant B]:".to_string()),
        Just("Participant A: ".to_string()),
        (1u8..9).prop_map(|n| format!("[Agent {n}]: ")),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_history_alternates(speaker in prop_oneof![Just(Role::ParticipantA), Just(Role::ParticipantB)], history in arb_history()) {
        let messages = history_messages(speaker, "topic", &history);

        prop_assert_eq!(messages[0].role, MessageRole::User);
        for pair in messages.windows(2) {
            prop_assert_ne!(pair[0].role, pair[1].role);
        }
        for turn in &history {
            prop_assert!(messages.iter().any(|m| m.content.contains(&turn.content)));
        }
    }

    #[test]
    fn prop_clean_response_idempotent(label in arb_label(), body in "[a-zA-Z0-9 .,]{0,60}") {
        let once = clean_response(&format!("{label}{body}"));
        prop_assert_eq!(clean_response(&once), once.clone());
        prop_assert!(!once.starts_with("[Participant"));
        prop_assert!(!once.starts_with("[Agent"));
    }

    #[test]
    fn prop_parse_summary_never_empty(text in "(?s).{0,200}") {
        prop_assert!(!parse_summary(&text).is_empty());
    }
}
