//! Turn and summary record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    ParticipantA,
    ParticipantB,
    Summarizer,
}

impl Role {
    /// Participant turns count toward the conversational-turn counter
    pub fn is_conversational(self) -> bool {
        matches!(self, Role::ParticipantA | Role::ParticipantB)
    }

    /// The conversational partner of this role
    pub fn partner(self) -> Option<Role> {
        match self {
            Role::ParticipantA => Some(Role::ParticipantB),
            Role::ParticipantB => Some(Role::ParticipantA),
            Role::Summarizer => None,
        }
    }

    /// Stable identifier used in logs and serialized transcripts
    pub fn as_str(self) -> &'static str {
        match self {
            Role::ParticipantA => "participant_a",
            Role::ParticipantB => "participant_b",
            Role::Summarizer => "summarizer",
        }
    }

    /// Name used when addressing the speaker in prompts
    pub fn speaker_name(self) -> &'static str {
        match self {
            Role::ParticipantA => "Participant A",
            Role::ParticipantB => "Participant B",
            Role::Summarizer => "Summarizer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// 1-based conversational turn number. Summarizer notes carry the
    /// number of the turn they follow.
    pub sequence: u32,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Inclusive range of conversational turn numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnRange {
    pub start: u32,
    pub end: u32,
}

impl TurnRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Range covering the last `len` turns ending at `end`
    pub fn trailing(end: u32, len: u32) -> Self {
        Self {
            start: end.saturating_sub(len) + 1,
            end,
        }
    }

    /// Turn numbers start at 1, so a zero start is as empty as an inverted range
    pub fn is_empty(&self) -> bool {
        self.start == 0 || self.start > self.end
    }

    pub fn len(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn contains(&self, sequence: u32) -> bool {
        !self.is_empty() && self.start <= sequence && sequence <= self.end
    }

    pub fn overlaps(&self, other: &TurnRange) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.start <= other.end
            && other.start <= self.end
    }
}

impl fmt::Display for TurnRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Whether a summary covers a recent window or the whole conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryScope {
    Periodic,
    Final,
}

impl fmt::Display for SummaryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryScope::Periodic => f.write_str("periodic"),
            SummaryScope::Final => f.write_str("final"),
        }
    }
}

/// Structured content produced by the summarizer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryFields {
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub agreements: Vec<String>,
    #[serde(default)]
    pub disagreements: Vec<String>,
    #[serde(default)]
    pub conclusions: Vec<String>,
    /// Short prose overview, only requested for the final summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executive_summary: Option<String>,
}

impl SummaryFields {
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
            && self.key_points.is_empty()
            && self.agreements.is_empty()
            && self.disagreements.is_empty()
            && self.conclusions.is_empty()
            && self.executive_summary.is_none()
    }

    /// Plain-text rendering recorded in the turn log so participants see it
    pub fn as_note(&self) -> String {
        let overview = self
            .executive_summary
            .as_deref()
            .map(|text| format!("Overview: {text}"));
        let sections = [
            ("Topics", &self.topics),
            ("Key points", &self.key_points),
            ("Agreements", &self.agreements),
            ("Disagreements", &self.disagreements),
            ("Conclusions", &self.conclusions),
        ]
        .into_iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(heading, items)| format!("{heading}: {}", items.join("; ")));

        overview.into_iter().chain(sections).collect::<Vec<_>>().join("\n")
    }
}

/// A summary recorded against the turn range that triggered it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub range: TurnRange,
    pub scope: SummaryScope,
    pub fields: SummaryFields,
    pub created_at: DateTime<Utc>,
}
