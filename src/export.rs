//! Markdown export of a finished (or halted) run

use crate::conversation::{ConversationState, RunMetadata, Role, Summary, SummaryFields, SummaryScope, Turn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// How the run ended at export time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    InProgress,
    Halted { error: String },
}

impl RunStatus {
    fn describe(&self) -> String {
        match self {
            RunStatus::Completed => "completed".to_string(),
            RunStatus::InProgress => "in progress".to_string(),
            RunStatus::Halted { error } => format!("halted ({error})"),
        }
    }
}

/// Read-only snapshot of everything an exporter needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub run_id: Uuid,
    pub exported_at: DateTime<Utc>,
    pub metadata: RunMetadata,
    pub turns: Vec<Turn>,
    pub summaries: Vec<Summary>,
    pub status: RunStatus,
}

impl Transcript {
    /// Mark the snapshot as the result of a failed run
    #[must_use]
    pub fn halted(mut self, error: &impl Display) -> Self {
        self.status = RunStatus::Halted {
            error: error.to_string(),
        };
        self
    }

    /// Conversational turns taken
    pub fn turn_count(&self) -> u32 {
        self.turns
            .iter()
            .filter(|t| t.role.is_conversational())
            .map(|t| t.sequence)
            .max()
            .unwrap_or(0)
    }

    pub fn final_summary(&self) -> Option<&Summary> {
        self.summaries.iter().find(|s| s.scope == SummaryScope::Final)
    }
}

impl ConversationState {
    pub fn transcript(&self) -> Transcript {
        Transcript {
            run_id: Uuid::new_v4(),
            exported_at: Utc::now(),
            metadata: self.metadata().clone(),
            turns: self.turns().to_vec(),
            summaries: self.summaries().to_vec(),
            status: if self.is_complete() {
                RunStatus::Completed
            } else {
                RunStatus::InProgress
            },
        }
    }
}

pub fn render_markdown(transcript: &Transcript) -> String {
    let meta = &transcript.metadata;
    let mut md = String::from("# AI Agent Conversation\n\n## Metadata\n");
    md.push_str(&format!("- **Topic**: {}\n", meta.topic));
    md.push_str(&format!(
        "- **Date**: {}\n",
        transcript.exported_at.format("%Y-%m-%d %H:%M:%S")
    ));
    md.push_str(&format!("- **Total Turns**: {}\n", transcript.turn_count()));
    md.push_str(&format!("- **Max Turns**: {}\n", meta.max_turns));
    md.push_str(&format!("- **Summary Interval**: {}\n", meta.summary_interval));
    md.push_str(&format!("- **Participant A**: {}\n", meta.participant_a));
    md.push_str(&format!("- **Participant B**: {}\n", meta.participant_b));
    md.push_str(&format!("- **Summarizer**: {}\n", meta.summarizer));
    md.push_str(&format!("- **Status**: {}\n\n---\n\n", transcript.status.describe()));

    if let Some(summary) = transcript.final_summary() {
        md.push_str("## Summary\n\n");
        if let Some(overview) = &summary.fields.executive_summary {
            md.push_str(&format!("### Executive Summary\n\n{overview}\n\n"));
        }
        render_fields(&mut md, &summary.fields);
        md.push_str("---\n\n");
    }

    md.push_str("## Full Conversation\n\n");
    for turn in transcript.turns.iter().filter(|t| t.role.is_conversational()) {
        md.push_str(&format!(
            "### Turn {}: {}\n\n{}\n\n---\n\n",
            turn.sequence,
            meta.label(turn.role),
            turn.content.trim()
        ));

        let periodic = transcript
            .summaries
            .iter()
            .filter(|s| s.scope == SummaryScope::Periodic && s.range.end == turn.sequence);
        for summary in periodic {
            md.push_str(&format!(
                "### Periodic Summary (turns {}) by {}\n\n",
                summary.range,
                meta.label(Role::Summarizer)
            ));
            for line in summary.fields.as_note().lines() {
                md.push_str(&format!("> {line}\n"));
            }
            md.push_str("\n---\n\n");
        }
    }

    md
}

fn render_fields(md: &mut String, fields: &SummaryFields) {
    push_list(md, "Topics Discussed", &fields.topics, false);
    push_list(md, "Key Points", &fields.key_points, true);
    push_list(md, "Agreements", &fields.agreements, false);
    push_list(md, "Disagreements", &fields.disagreements, false);
    push_list(md, "Conclusions", &fields.conclusions, false);
}

fn push_list(md: &mut String, heading: &str, items: &[String], numbered: bool) {
    if items.is_empty() {
        return;
    }
    md.push_str(&format!("### {heading}\n\n"));
    for (i, item) in items.iter().enumerate() {
        if numbered {
            md.push_str(&format!("{}. {item}\n", i + 1));
        } else {
            md.push_str(&format!("- {item}\n"));
        }
    }
    md.push('\n');
}

/// Write the transcript as `conversation_YYYYMMDD_HHMMSS.md` under `dir`
pub fn write_markdown(dir: &Path, transcript: &Transcript) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let filename = format!(
        "conversation_{}.md",
        transcript.exported_at.format("%Y%m%d_%H%M%S")
    );
    let path = dir.join(filename);
    std::fs::write(&path, render_markdown(transcript))?;
    tracing::info!(path = %path.display(), run_id = %transcript.run_id, "Transcript written");
    Ok(path)
}
