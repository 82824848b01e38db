//! Prompt construction and response cleanup for the LLM-backed ports

use crate::conversation::{Role, SummaryFields, SummaryScope, Turn};
use crate::llm::LlmMessage;
use regex::Regex;
use std::sync::LazyLock;

/// Speaker labels models like to echo back, bracketed or not
static LEADING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[?(?:Agent \d+|Participant [AB]|Summarizer)\]?:\s*").expect("valid regex")
});

static EMBEDDED_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\s*\[(?:Agent \d+|Participant [AB]|Summarizer)\]:").expect("valid regex")
});

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-•*]+|\d+[.)])\s*").expect("valid regex"));

const EMPTY_SUMMARY: &str = "The participants have been discussing various aspects of the topic.";

/// System instructions for a participant's turn
pub fn participant_instructions(role: Role, topic: &str, turn: u32, max_turns: u32) -> String {
    let me = role.speaker_name();
    let other = role.partner().map_or("the other participant", Role::speaker_name);
    let stance = match role {
        Role::ParticipantA => "Share your perspective, ask questions, and engage meaningfully",
        _ => "Respond to the other participant's points and offer your own insights",
    };

    format!(
        "You are {me} in a discussion about: {topic}

You are having a thoughtful conversation with {other}. Your task is to provide ONE response as {me}.

Important guidelines:
- Only speak as {me}, never as {other}
- Do NOT include labels like \"[{me}]:\" or \"[{other}]:\" in your response
- Provide only YOUR response, not the entire conversation
- {stance}
- Keep your response concise (2-4 sentences)
- MAXIMUM 100 WORDS - keep your response brief and focused

This is turn {turn} of {max_turns}."
    )
}

/// Map history into chat messages from `speaker`'s point of view
///
/// The speaker's own turns become assistant messages and everything else
/// becomes user input. Consecutive messages with the same role are merged so
/// providers that demand strict alternation accept the request.
pub fn history_messages(speaker: Role, topic: &str, history: &[Turn]) -> Vec<LlmMessage> {
    let mut messages = vec![LlmMessage::user(format!("Begin the discussion about: {topic}"))];

    for turn in history {
        let message = if turn.role == speaker {
            LlmMessage::assistant(turn.content.clone())
        } else if turn.role == Role::Summarizer {
            LlmMessage::user(format!("Summary so far: {}", turn.content))
        } else {
            LlmMessage::user(turn.content.clone())
        };

        match messages.last_mut() {
            Some(last) if last.role == message.role => {
                last.content.push_str("\n\n");
                last.content.push_str(&message.content);
            }
            _ => messages.push(message),
        }
    }

    messages
}

/// Strip echoed speaker labels and anything the model wrote for another speaker
pub fn clean_response(text: &str) -> String {
    let without_leading = LEADING_LABEL.replace(text, "");
    let kept = match EMBEDDED_LABEL.find(&without_leading) {
        Some(m) => without_leading.get(..m.start()).unwrap_or_default(),
        None => &without_leading,
    };
    kept.trim().to_string()
}

/// Text used when a participant returns nothing usable
pub fn filler(role: Role) -> &'static str {
    match role {
        Role::ParticipantB => "That's an interesting point. Let me share my perspective on this.",
        _ => "I'd like to hear your thoughts on this topic.",
    }
}

pub fn summarizer_system_prompt(scope: SummaryScope, topic: &str) -> String {
    let task = match scope {
        SummaryScope::Periodic => {
            "Your role is to provide a brief, objective summary of the last few turns of conversation.
- Summarize the main points discussed in the recent exchange
- Highlight any agreements, disagreements, or new insights"
        }
        SummaryScope::Final => {
            "Your role is to synthesize the entire conversation.
- Identify the sub-topics that were discussed
- Extract the most important insights, solutions, or perspectives
- Capture areas of agreement and disagreement
- Conclude with what was learned and any actionable takeaways"
        }
    };

    format!(
        "You are a neutral summarizer reviewing a discussion about: {topic}

{task}
- Be objective and balanced
- Use third person perspective"
    )
}

pub fn summarizer_user_prompt(scope: SummaryScope, turns: &[&Turn]) -> String {
    let transcript = turns
        .iter()
        .map(|t| format!("Turn {} - {}: {}", t.sequence, t.role.speaker_name(), t.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    let (subject, overview) = match scope {
        SummaryScope::Periodic => ("conversation segment", ""),
        SummaryScope::Final => (
            "conversation",
            "\nAlso include \"executive_summary\": a string of two or three sentences giving an overview of the whole discussion.",
        ),
    };

    format!(
        "Summarize the following {subject}:

{transcript}

Respond with a single JSON object and nothing else, using these keys (each an array of short strings):
{{\"topics\": [], \"key_points\": [], \"agreements\": [], \"disagreements\": [], \"conclusions\": []}}{overview}"
    )
}

/// Parse a summarizer reply into structured fields
///
/// Accepts a JSON object (optionally fenced in markdown). Anything else is
/// read as a list: each bullet or numbered line becomes a key point.
pub fn parse_summary(text: &str) -> SummaryFields {
    if let Some(fields) = parse_json_object(text) {
        if !fields.is_empty() {
            return fields;
        }
    }

    let key_points: Vec<String> = text
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .map(|line| LIST_MARKER.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if key_points.is_empty() {
        return SummaryFields {
            key_points: vec![EMPTY_SUMMARY.to_string()],
            ..Default::default()
        };
    }

    SummaryFields {
        key_points,
        ..Default::default()
    }
}

fn parse_json_object(text: &str) -> Option<SummaryFields> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    let candidate = text.get(start..=end)?;
    let mut fields: SummaryFields = serde_json::from_str(candidate).ok()?;
    fields.executive_summary = fields
        .executive_summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    Some(fields)
}
