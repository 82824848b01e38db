//! Property-based tests for the turn scheduler
//!
//! These tests verify the scheduling invariants hold for every valid
//! `(max_turns, summary_interval)` pair and for arbitrary event sequences.

use super::*;
use crate::conversation::{Role, SummaryScope, TurnRange};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

/// One entry of a full scheduler run
#[derive(Debug, Clone, PartialEq)]
enum Step {
    Turn(Role),
    Summary(SummaryScope, TurnRange, u32),
}

/// Run the scheduler to completion, returning every step and the final state
fn run_to_completion(max_turns: u32, summary_interval: u32) -> (Vec<Step>, SchedulerState) {
    let mut scheduler = TurnScheduler::new(SchedulerContext::new(max_turns, summary_interval));
    let mut turn_count = 0;
    let mut steps = Vec::new();

    // Bounded: every run takes at most max_turns turns plus one summary each
    for _ in 0..(max_turns * 2 + 2) {
        match scheduler.next_action() {
            Action::Speak { role } => {
                turn_count += 1;
                steps.push(Step::Turn(role));
                scheduler
                    .advance(Event::TurnCompleted { role, turn_count })
                    .expect("scheduled speaker must be accepted");
            }
            Action::Summarize { scope, range } => {
                steps.push(Step::Summary(scope, range, turn_count));
                scheduler
                    .advance(Event::SummaryCompleted { range })
                    .expect("scheduled summary must be accepted");
            }
            Action::Stop => break,
        }
    }

    (steps, scheduler.state().clone())
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_config() -> impl Strategy<Value = (u32, u32)> {
    (1u32..40, 1u32..40)
}

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::ParticipantA),
        Just(Role::ParticipantB),
        Just(Role::Summarizer),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (arb_role(), 0u32..45).prop_map(|(role, turn_count)| Event::TurnCompleted { role, turn_count }),
        (0u32..45, 0u32..45).prop_map(|(start, end)| Event::SummaryCompleted {
            range: TurnRange::new(start, end)
        }),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: Participants strictly alternate A, B, A, B for max_turns turns
    #[test]
    fn prop_speakers_alternate((max_turns, interval) in arb_config()) {
        let (steps, final_state) = run_to_completion(max_turns, interval);
        let speakers: Vec<Role> = steps
            .iter()
            .filter_map(|s| match s {
                Step::Turn(role) => Some(*role),
                Step::Summary(..) => None,
            })
            .collect();

        prop_assert_eq!(speakers.len(), max_turns as usize);
        for (i, role) in speakers.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::ParticipantA } else { Role::ParticipantB };
            prop_assert_eq!(*role, expected, "turn {} spoken by {}", i + 1, role);
        }
        prop_assert_eq!(final_state, SchedulerState::Terminated);
    }

    // Invariant 2: Periodic summaries land exactly on multiples below max_turns
    #[test]
    fn prop_periodic_summaries_on_multiples((max_turns, interval) in arb_config()) {
        let (steps, _) = run_to_completion(max_turns, interval);
        let periodic_after: Vec<u32> = steps
            .iter()
            .filter_map(|s| match s {
                Step::Summary(SummaryScope::Periodic, range, after) => {
                    assert_eq!(range.end, *after);
                    Some(*after)
                }
                _ => None,
            })
            .collect();
        let expected: Vec<u32> = (1..max_turns).filter(|k| k % interval == 0).collect();
        prop_assert_eq!(periodic_after, expected);
    }

    // Invariant 3: Exactly one final summary, last, covering every turn
    #[test]
    fn prop_single_final_summary((max_turns, interval) in arb_config()) {
        let (steps, _) = run_to_completion(max_turns, interval);
        let finals: Vec<&Step> = steps
            .iter()
            .filter(|s| matches!(s, Step::Summary(SummaryScope::Final, ..)))
            .collect();
        prop_assert_eq!(finals.len(), 1);
        prop_assert_eq!(
            steps.last(),
            Some(&Step::Summary(SummaryScope::Final, TurnRange::new(1, max_turns), max_turns))
        );
    }

    // Invariant 4: No turn belongs to two periodic summaries
    #[test]
    fn prop_periodic_ranges_disjoint((max_turns, interval) in arb_config()) {
        let (steps, _) = run_to_completion(max_turns, interval);
        let ranges: Vec<TurnRange> = steps
            .iter()
            .filter_map(|s| match s {
                Step::Summary(SummaryScope::Periodic, range, _) => Some(*range),
                _ => None,
            })
            .collect();
        for (i, a) in ranges.iter().enumerate() {
            prop_assert_eq!(a.len(), interval);
            for b in &ranges[i + 1..] {
                prop_assert!(!a.overlaps(b), "{} overlaps {}", a, b);
            }
        }
    }

    // Invariant 5: Arbitrary events never move the scheduler out of Terminated,
    // and a rejected event never changes state
    #[test]
    fn prop_rejections_preserve_state(
        (max_turns, interval) in arb_config(),
        events in proptest::collection::vec(arb_event(), 0..30)
    ) {
        let mut scheduler = TurnScheduler::new(SchedulerContext::new(max_turns, interval));
        for event in events {
            let before = scheduler.state().clone();
            match scheduler.advance(event) {
                Ok(_) => prop_assert!(!before.is_terminal(), "left Terminated"),
                Err(_) => prop_assert_eq!(scheduler.state(), &before),
            }
        }
    }
}
