//! Control loop that carries out scheduler actions

use crate::conversation::{
    ConversationError, ConversationState, Role, Summary, SummaryFields, SummaryScope, Turn,
    TurnRange,
};
use crate::ports::prompt::participant_instructions;
use crate::ports::{ParticipantContext, ParticipantPort, SummarizerPort, SummaryRequest};
use crate::state_machine::{Action, Event, SchedulerState, TurnScheduler};
use tokio_util::sync::CancellationToken;

/// Content substituted when a port fails
///
/// Without a fallback every generation failure halts the run.
#[derive(Debug, Clone, Default)]
pub struct Fallback {
    pub utterance: Option<String>,
    pub summary: Option<SummaryFields>,
}

/// What a single step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Spoke(Turn),
    Summarized(Summary),
    Finished,
    /// Cancellation was requested before the next action started
    Cancelled,
}

/// Drives one conversation through its scheduler
///
/// The driver owns the conversation for the length of the run. After a
/// failed step the partial history stays available through
/// [`RunDriver::conversation`] and [`RunDriver::into_conversation`].
pub struct RunDriver<A, B, S>
where
    A: ParticipantPort,
    B: ParticipantPort,
    S: SummarizerPort,
{
    conversation: ConversationState,
    scheduler: TurnScheduler,
    participant_a: A,
    participant_b: B,
    summarizer: S,
    history_window: Option<usize>,
    fallback: Fallback,
    cancel: CancellationToken,
}

impl<A, B, S> RunDriver<A, B, S>
where
    A: ParticipantPort,
    B: ParticipantPort,
    S: SummarizerPort,
{
    /// Resumes wherever `conversation` left off
    pub fn new(conversation: ConversationState, participant_a: A, participant_b: B, summarizer: S) -> Self {
        let scheduler = TurnScheduler::for_conversation(&conversation);
        Self {
            conversation,
            scheduler,
            participant_a,
            participant_b,
            summarizer,
            history_window: None,
            fallback: Fallback::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Limit how many recent turns participants see
    pub fn with_history_window(mut self, window: Option<usize>) -> Self {
        self.history_window = window;
        self
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Stop at the next step boundary once `cancel` fires
    ///
    /// The token is only checked between actions. A turn or summary already
    /// waiting on its port runs to completion and is recorded.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    pub fn into_conversation(self) -> ConversationState {
        self.conversation
    }

    pub fn scheduler_state(&self) -> &SchedulerState {
        self.scheduler.state()
    }

    /// Run until the scheduler terminates or a step fails
    pub async fn run(&mut self) -> Result<(), ConversationError> {
        tracing::info!(
            topic = %self.conversation.topic(),
            max_turns = self.scheduler.context().max_turns,
            summary_interval = self.scheduler.context().summary_interval,
            "Starting conversation"
        );

        loop {
            match self.step().await? {
                StepOutcome::Finished => {
                    tracing::info!(
                        turns = self.conversation.turn_count(),
                        summaries = self.conversation.summaries().len(),
                        "Conversation finished"
                    );
                    return Ok(());
                }
                StepOutcome::Cancelled => return Ok(()),
                StepOutcome::Spoke(_) | StepOutcome::Summarized(_) => {}
            }
        }
    }

    /// Carry out exactly one scheduler action
    pub async fn step(&mut self) -> Result<StepOutcome, ConversationError> {
        let action = self.scheduler.next_action();
        if action != Action::Stop && self.cancel.is_cancelled() {
            tracing::info!(
                turns = self.conversation.turn_count(),
                state = ?self.scheduler.state(),
                "Cancellation requested, stopping between steps"
            );
            return Ok(StepOutcome::Cancelled);
        }

        match action {
            Action::Speak { role } => self.speak(role).await.map(StepOutcome::Spoke),
            Action::Summarize { scope, range } => self
                .summarize(scope, range)
                .await
                .map(StepOutcome::Summarized),
            Action::Stop => Ok(StepOutcome::Finished),
        }
    }

    async fn speak(&mut self, role: Role) -> Result<Turn, ConversationError> {
        let turn_number = self.conversation.turn_count() + 1;
        let max_turns = self.scheduler.context().max_turns;

        let result = {
            let topic = self.conversation.topic();
            let context = ParticipantContext {
                topic,
                role,
                turn: turn_number,
                max_turns,
                instructions: participant_instructions(role, topic, turn_number, max_turns),
                history: self.conversation.render_context(self.history_window),
            };
            let participant: &dyn ParticipantPort = match role {
                Role::ParticipantA => &self.participant_a,
                _ => &self.participant_b,
            };
            tracing::debug!(role = %role, turn = turn_number, participant = participant.label(), "Requesting turn");
            participant.respond(&context).await
        };

        // The utterance's own role is recorded so a miswired port is rejected
        let (speaker, content) = match result {
            Ok(utterance) => (utterance.role, utterance.content),
            Err(failure) => match &self.fallback.utterance {
                Some(text) => {
                    tracing::warn!(role = %role, turn = turn_number, error = %failure, "Participant failed, using fallback");
                    (role, text.clone())
                }
                None => {
                    tracing::error!(role = %role, turn = turn_number, error = %failure, "Participant failed, halting run");
                    return Err(failure.into());
                }
            },
        };

        let turn = self.conversation.append_turn(speaker, content)?.clone();
        self.scheduler.advance(Event::TurnCompleted {
            role: speaker,
            turn_count: self.conversation.turn_count(),
        })?;

        tracing::info!(role = %speaker, turn = turn.sequence, chars = turn.content.len(), "Turn recorded");
        Ok(turn)
    }

    async fn summarize(&mut self, scope: SummaryScope, range: TurnRange) -> Result<Summary, ConversationError> {
        let result = {
            let request = SummaryRequest {
                topic: self.conversation.topic(),
                range,
                scope,
                turns: self.conversation.turns_in(range),
            };
            tracing::debug!(range = %range, scope = %scope, summarizer = self.summarizer.label(), "Requesting summary");
            self.summarizer.summarize(&request).await
        };

        let fields = match result {
            Ok(fields) => fields,
            Err(failure) => match &self.fallback.summary {
                Some(fields) => {
                    tracing::warn!(range = %range, scope = %scope, error = %failure, "Summarizer failed, using fallback");
                    fields.clone()
                }
                None => {
                    tracing::error!(range = %range, scope = %scope, error = %failure, "Summarizer failed, halting run");
                    return Err(failure.into());
                }
            },
        };

        let summary = self.conversation.append_summary(fields, range, scope)?.clone();
        self.conversation
            .append_turn(Role::Summarizer, summary.fields.as_note())?;
        self.scheduler.advance(Event::SummaryCompleted { range })?;

        tracing::info!(range = %range, scope = %scope, "Summary recorded");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::RunMetadata;
    use crate::runtime::testing::{MockParticipant, MockSummarizer};
    use proptest::prelude::*;
    use std::sync::Arc;

    type MockDriver = RunDriver<Arc<MockParticipant>, Arc<MockParticipant>, Arc<MockSummarizer>>;

    struct Harness {
        a: Arc<MockParticipant>,
        b: Arc<MockParticipant>,
        summarizer: Arc<MockSummarizer>,
        driver: MockDriver,
    }

    fn conversation(max_turns: u32, summary_interval: u32) -> ConversationState {
        ConversationState::new(RunMetadata {
            topic: "public transit".to_string(),
            max_turns,
            summary_interval,
            participant_a: "Participant A (mock)".to_string(),
            participant_b: "Participant B (mock)".to_string(),
            summarizer: "Summarizer (mock)".to_string(),
        })
    }

    fn harness_for(conversation: ConversationState) -> Harness {
        let a = Arc::new(MockParticipant::new(Role::ParticipantA));
        let b = Arc::new(MockParticipant::new(Role::ParticipantB));
        let summarizer = Arc::new(MockSummarizer::new());
        let driver = RunDriver::new(conversation, a.clone(), b.clone(), summarizer.clone());
        Harness {
            a,
            b,
            summarizer,
            driver,
        }
    }

    fn harness(max_turns: u32, summary_interval: u32) -> Harness {
        harness_for(conversation(max_turns, summary_interval))
    }

    /// Render the turn log as a compact trace: A, B, S
    fn trace(conversation: &ConversationState) -> Vec<String> {
        conversation
            .turns()
            .iter()
            .map(|t| match t.role {
                Role::ParticipantA => "A".to_string(),
                Role::ParticipantB => "B".to_string(),
                Role::Summarizer => "S".to_string(),
            })
            .collect()
    }

    fn ranges(conversation: &ConversationState) -> Vec<(SummaryScope, TurnRange)> {
        conversation
            .summaries()
            .iter()
            .map(|s| (s.scope, s.range))
            .collect()
    }

    #[tokio::test]
    async fn test_eight_turns_interval_four() {
        let mut h = harness(8, 4);
        h.driver.run().await.unwrap();

        let conv = h.driver.conversation();
        assert_eq!(
            trace(conv),
            vec!["A", "B", "A", "B", "S", "A", "B", "A", "B", "S"]
        );
        assert_eq!(
            ranges(conv),
            vec![
                (SummaryScope::Periodic, TurnRange::new(1, 4)),
                (SummaryScope::Final, TurnRange::new(1, 8)),
            ]
        );
        assert!(conv.is_complete());
        assert_eq!(h.driver.scheduler_state(), &SchedulerState::Terminated);
        assert_eq!(h.a.calls().len(), 4);
        assert_eq!(h.b.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_five_turns_interval_four() {
        let mut h = harness(5, 4);
        h.driver.run().await.unwrap();

        let conv = h.driver.conversation();
        assert_eq!(trace(conv), vec!["A", "B", "A", "B", "S", "A", "S"]);
        assert_eq!(
            ranges(conv),
            vec![
                (SummaryScope::Periodic, TurnRange::new(1, 4)),
                (SummaryScope::Final, TurnRange::new(1, 5)),
            ]
        );
    }

    #[tokio::test]
    async fn test_interval_larger_than_max_only_final() {
        let mut h = harness(3, 10);
        h.driver.run().await.unwrap();

        let conv = h.driver.conversation();
        assert_eq!(trace(conv), vec!["A", "B", "A", "S"]);
        assert_eq!(
            ranges(conv),
            vec![(SummaryScope::Final, TurnRange::new(1, 3))]
        );
    }

    #[tokio::test]
    async fn test_failure_on_turn_three_halts() {
        let mut h = harness(8, 4);
        h.a.fail_on_turn(3);

        let err = h.driver.run().await.unwrap_err();
        match err {
            ConversationError::Generation(failure) => assert_eq!(failure.role, Role::ParticipantA),
            other => panic!("expected generation failure, got {other:?}"),
        }

        let conv = h.driver.conversation();
        assert_eq!(conv.turn_count(), 2);
        assert_eq!(trace(conv), vec!["A", "B"]);
        assert!(conv.summaries().is_empty());
        assert_eq!(h.driver.scheduler_state(), &SchedulerState::AwaitingA);
    }

    #[tokio::test]
    async fn test_summarizer_failure_halts_before_next_turn() {
        let mut h = harness(8, 4);
        h.summarizer.fail_next();

        assert!(h.driver.run().await.is_err());
        let conv = h.driver.conversation();
        assert_eq!(conv.turn_count(), 4);
        assert!(conv.summaries().is_empty());
        assert!(matches!(
            h.driver.scheduler_state(),
            SchedulerState::AwaitingSummary { .. }
        ));
    }

    #[tokio::test]
    async fn test_fallback_keeps_run_going() {
        let h = harness(4, 2);
        h.b.fail_on_turn(2);
        h.summarizer.fail_next();
        let mut driver = h.driver.with_fallback(Fallback {
            utterance: Some("Let's move on.".to_string()),
            summary: Some(SummaryFields {
                key_points: vec!["unavailable".to_string()],
                ..Default::default()
            }),
        });

        driver.run().await.unwrap();
        let conv = driver.conversation();
        assert!(conv.is_complete());
        assert_eq!(conv.turns()[1].content, "Let's move on.");
        assert_eq!(conv.summaries()[0].fields.key_points, vec!["unavailable"]);
    }

    #[tokio::test]
    async fn test_history_window_limits_context() {
        let h = harness(6, 10);
        let mut driver = h.driver.with_history_window(Some(2));
        driver.run().await.unwrap();

        let lengths: Vec<usize> = h.a.calls().iter().map(|c| c.history_len).collect();
        assert_eq!(lengths, vec![0, 2, 2]);
        let turns: Vec<u32> = h.b.calls().iter().map(|c| c.turn).collect();
        assert_eq!(turns, vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn test_participants_see_summary_note() {
        let mut h = harness(6, 2);
        h.driver.run().await.unwrap();

        // Turn 3 is A's first turn after the 1-2 summary
        let call = &h.a.calls()[1];
        assert_eq!(call.turn, 3);
        assert_eq!(call.history_len, 3);
        let summarized: Vec<(SummaryScope, TurnRange, usize)> = h.summarizer.calls();
        assert_eq!(
            summarized,
            vec![
                (SummaryScope::Periodic, TurnRange::new(1, 2), 2),
                (SummaryScope::Periodic, TurnRange::new(3, 4), 2),
                (SummaryScope::Final, TurnRange::new(1, 6), 6),
            ]
        );
    }

    #[tokio::test]
    async fn test_step_by_step_then_resume() {
        let mut h = harness(4, 2);
        assert!(matches!(h.driver.step().await.unwrap(), StepOutcome::Spoke(t) if t.sequence == 1));
        assert!(matches!(h.driver.step().await.unwrap(), StepOutcome::Spoke(t) if t.role == Role::ParticipantB));
        match h.driver.step().await.unwrap() {
            StepOutcome::Summarized(summary) => assert_eq!(summary.range, TurnRange::new(1, 2)),
            other => panic!("expected summary, got {other:?}"),
        }

        // Stop here, then pick the conversation up with fresh ports
        let saved = h.driver.into_conversation();
        let json = serde_json::to_string(&saved).unwrap();
        let restored: ConversationState = serde_json::from_str(&json).unwrap();

        let mut resumed = harness_for(restored);
        assert_eq!(resumed.driver.scheduler_state(), &SchedulerState::AwaitingA);
        resumed.driver.run().await.unwrap();
        assert!(resumed.driver.conversation().is_complete());
        assert_eq!(resumed.a.calls()[0].turn, 3);
        assert_eq!(resumed.driver.step().await.unwrap(), StepOutcome::Finished);
    }

    #[tokio::test]
    async fn test_cancel_waits_for_turn_in_flight() {
        let cancel = CancellationToken::new();
        let mut h = harness(8, 4);
        h.driver = h.driver.with_cancellation(cancel.clone());
        h.b.cancel_during_turn(2, cancel.clone());

        h.driver.run().await.unwrap();

        // Turn 2 was already being generated when cancellation fired
        let conv = h.driver.conversation();
        assert!(cancel.is_cancelled());
        assert_eq!(trace(conv), vec!["A", "B"]);
        assert_eq!(conv.turns()[1].content, "Participant B on turn 2");
        assert!(!conv.is_complete());
        assert_eq!(h.driver.scheduler_state(), &SchedulerState::AwaitingA);
        assert_eq!(h.driver.step().await.unwrap(), StepOutcome::Cancelled);
        assert_eq!(h.a.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_after_last_summary_still_finishes() {
        let cancel = CancellationToken::new();
        let mut h = harness(2, 4);
        h.driver = h.driver.with_cancellation(cancel.clone());
        h.driver.run().await.unwrap();

        cancel.cancel();
        assert_eq!(h.driver.step().await.unwrap(), StepOutcome::Finished);
    }

    #[tokio::test]
    async fn test_miswired_port_is_rejected() {
        let a = Arc::new(MockParticipant::new(Role::ParticipantB));
        let b = Arc::new(MockParticipant::new(Role::ParticipantB));
        let mut driver = RunDriver::new(conversation(4, 2), a, b, Arc::new(MockSummarizer::new()));

        let err = driver.step().await.unwrap_err();
        assert!(matches!(
            err,
            ConversationError::InvalidSpeakerOrder {
                expected: Role::ParticipantA,
                actual: Role::ParticipantB
            }
        ));
        assert!(driver.conversation().turns().is_empty());
    }

    #[tokio::test]
    async fn test_queued_content_is_recorded() {
        let mut h = harness(2, 2);
        h.a.queue("Buses first.");
        h.b.queue("Trains scale better.");
        h.driver.run().await.unwrap();

        let turns = h.driver.conversation().turns();
        assert_eq!(turns[0].content, "Buses first.");
        assert_eq!(turns[1].content, "Trains scale better.");
        assert_eq!(h.summarizer.calls().len(), 1);
    }

    proptest! {
        #[test]
        fn prop_driver_produces_full_schedule(max_turns in 1u32..24, interval in 1u32..10) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let conv = rt.block_on(async {
                let mut h = harness(max_turns, interval);
                h.driver.run().await.unwrap();
                h.driver.into_conversation()
            });

            let speakers: Vec<Role> = conv
                .turns()
                .iter()
                .filter(|t| t.role.is_conversational())
                .map(|t| t.role)
                .collect();
            prop_assert_eq!(u32::try_from(speakers.len()).unwrap(), max_turns);
            for (i, role) in speakers.iter().enumerate() {
                let expected = if i % 2 == 0 { Role::ParticipantA } else { Role::ParticipantB };
                prop_assert_eq!(*role, expected);
            }

            let periodic_ends: Vec<u32> = conv.periodic_summaries().map(|s| s.range.end).collect();
            let expected_ends: Vec<u32> = (1..max_turns).filter(|k| k % interval == 0).collect();
            prop_assert_eq!(periodic_ends, expected_ends);

            let finals: Vec<&Summary> = conv
                .summaries()
                .iter()
                .filter(|s| s.scope == SummaryScope::Final)
                .collect();
            prop_assert_eq!(finals.len(), 1);
            prop_assert_eq!(finals[0].range, TurnRange::new(1, max_turns));
        }
    }
}
