//! Mock implementations for testing
//!
//! These mocks enable driver and port tests without network I/O.

use crate::conversation::{GenerationFailure, Role, SummaryFields, SummaryScope, TurnRange};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::ports::{ParticipantContext, ParticipantPort, SummarizerPort, SummaryRequest, Utterance};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Mock LLM Service
// ============================================================================

/// Mock LLM service that returns queued responses
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Mock Participant
// ============================================================================

/// What a participant was asked for
#[derive(Debug, Clone)]
pub struct ParticipantCall {
    pub turn: u32,
    pub history_len: usize,
    pub instructions: String,
}

/// Participant that answers from a queue, or with a canned line when empty
pub struct MockParticipant {
    role: Role,
    label: String,
    replies: Mutex<VecDeque<String>>,
    failing_turns: Mutex<HashSet<u32>>,
    interrupt: Mutex<Option<(u32, CancellationToken)>>,
    calls: Mutex<Vec<ParticipantCall>>,
}

impl MockParticipant {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            label: format!("mock-{}", role.as_str()),
            replies: Mutex::new(VecDeque::new()),
            failing_turns: Mutex::new(HashSet::new()),
            interrupt: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn queue(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(reply.into());
    }

    /// Fail with a server error when asked for `turn`
    pub fn fail_on_turn(&self, turn: u32) {
        self.failing_turns.lock().unwrap().insert(turn);
    }

    /// Cancel `token` while the reply for `turn` is still being produced
    pub fn cancel_during_turn(&self, turn: u32, token: CancellationToken) {
        *self.interrupt.lock().unwrap() = Some((turn, token));
    }

    pub fn calls(&self) -> Vec<ParticipantCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ParticipantPort for MockParticipant {
    fn role(&self) -> Role {
        self.role
    }

    fn label(&self) -> &str {
        &self.label
    }

    async fn respond(&self, context: &ParticipantContext<'_>) -> Result<Utterance, GenerationFailure> {
        self.calls.lock().unwrap().push(ParticipantCall {
            turn: context.turn,
            history_len: context.history.len(),
            instructions: context.instructions.clone(),
        });

        let interrupt = self
            .interrupt
            .lock()
            .unwrap()
            .as_ref()
            .filter(|(turn, _)| *turn == context.turn)
            .map(|(_, token)| token.clone());
        if let Some(token) = interrupt {
            token.cancel();
            tokio::task::yield_now().await;
        }

        if self.failing_turns.lock().unwrap().contains(&context.turn) {
            return Err(GenerationFailure::new(
                self.role,
                LlmError::server_error(format!("mock failure on turn {}", context.turn)),
            ));
        }

        let content = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| format!("{} on turn {}", self.role.speaker_name(), context.turn));
        Ok(Utterance {
            role: self.role,
            content,
        })
    }
}

// ============================================================================
// Mock Summarizer
// ============================================================================

/// Summarizer that echoes the range it was asked about
pub struct MockSummarizer {
    failures: Mutex<u32>,
    calls: Mutex<Vec<(SummaryScope, TurnRange, usize)>>,
}

impl MockSummarizer {
    pub fn new() -> Self {
        Self {
            failures: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next summary request
    pub fn fail_next(&self) {
        *self.failures.lock().unwrap() += 1;
    }

    /// Scope, range and number of turns of every request
    pub fn calls(&self) -> Vec<(SummaryScope, TurnRange, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SummarizerPort for MockSummarizer {
    fn label(&self) -> &str {
        "mock-summarizer"
    }

    async fn summarize(&self, request: &SummaryRequest<'_>) -> Result<SummaryFields, GenerationFailure> {
        self.calls
            .lock()
            .unwrap()
            .push((request.scope, request.range, request.turns.len()));

        {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(GenerationFailure::new(
                    Role::Summarizer,
                    LlmError::server_error("mock summarizer failure"),
                ));
            }
        }

        Ok(SummaryFields {
            topics: vec![request.topic.to_string()],
            key_points: vec![format!("{} summary of turns {}", request.scope, request.range)],
            ..Default::default()
        })
    }
}
