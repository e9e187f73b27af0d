//! Answer generation over consolidated retrieval results.
//!
//! Routes each query by intent, grounds retrieval answers in the kept
//! moments, and attaches short clips around them.

mod engine;

pub use engine::AnswerEngine;

use crate::vector_store::SearchHit;
use async_openai::types::ChatCompletionRequestMessage;
use serde::Deserialize;
use std::path::PathBuf;

/// What the user is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    /// The query should be answered from indexed video moments.
    Retrieval,
    /// General conversation; retrieval is skipped entirely.
    Chat,
}

impl QueryIntent {
    /// Parse a classifier reply. Returns None for anything unrecognized.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "RETRIEVAL" | "SEARCH" => Some(QueryIntent::Retrieval),
            "CHAT" => Some(QueryIntent::Chat),
            _ => None,
        }
    }
}

/// A consolidated moment handed to the answer generator.
#[derive(Debug, Clone)]
pub struct Finding {
    /// Path of the source video file.
    pub source_path: String,
    /// Position of the moment in the source video (seconds).
    pub timestamp: f64,
    /// Generated description of the moment.
    pub description: String,
    /// Squared L2 distance from the query (lower is better).
    pub distance: f32,
}

impl From<SearchHit> for Finding {
    fn from(hit: SearchHit) -> Self {
        Self {
            source_path: hit.metadata.source_path,
            timestamp: hit.metadata.timestamp,
            description: hit.metadata.description,
            distance: hit.distance,
        }
    }
}

/// Format findings for the answer prompt, one moment per line.
pub fn format_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| format!("- Timestamp {:.1}s: {}", f.timestamp, f.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Structured reply from the answer generator.
///
/// The generator judges whether the supplied findings were actually relevant
/// to the question; clips are only extracted when they were.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAnswer {
    /// The natural-language answer.
    pub text: String,
    /// Whether the findings were relevant to the question.
    pub has_relevant_findings: bool,
}

#[derive(Deserialize)]
struct RawGeneratedAnswer {
    answer: String,
    found: bool,
}

impl GeneratedAnswer {
    /// Parse the model's JSON reply.
    ///
    /// Output that is not the expected JSON object degrades to treating the
    /// whole reply as the answer with findings considered relevant, so a
    /// misbehaving model costs at worst some unnecessary clips.
    pub fn parse(raw: &str) -> Self {
        let candidate = strip_code_fence(raw.trim());

        match serde_json::from_str::<RawGeneratedAnswer>(candidate) {
            Ok(parsed) => Self {
                text: parsed.answer,
                has_relevant_findings: parsed.found,
            },
            Err(_) => Self {
                text: raw.trim().to_string(),
                has_relevant_findings: true,
            },
        }
    }
}

/// Strip a surrounding markdown code fence, if present.
fn strip_code_fence(raw: &str) -> &str {
    raw.strip_prefix("```json")
        .or_else(|| raw.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(raw)
}

/// The assembled user-facing response.
#[derive(Debug, Clone)]
pub struct AnswerResponse {
    /// The generated answer text.
    pub answer: String,
    /// Moments the answer is grounded in (empty for chat-intent queries).
    pub findings: Vec<Finding>,
    /// Extracted clip paths, one per finding that produced a clip.
    pub clips: Vec<PathBuf>,
}

impl AnswerResponse {
    /// A response with no retrieval backing (chat intent or empty index).
    pub fn text_only(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            findings: Vec::new(),
            clips: Vec::new(),
        }
    }
}

/// Conversation history owned by the caller and threaded through chat turns.
#[derive(Default)]
pub struct Conversation {
    messages: Vec<ChatCompletionRequestMessage>,
}

impl Conversation {
    /// Maximum retained turns; older ones are dropped.
    const MAX_MESSAGES: usize = 20;

    /// Start an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all previous turns.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Number of retained turns.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation has no turns yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn push(&mut self, message: ChatCompletionRequestMessage) {
        self.messages.push(message);
        if self.messages.len() > Self::MAX_MESSAGES {
            let excess = self.messages.len() - Self::MAX_MESSAGES;
            self.messages.drain(..excess);
        }
    }

    pub(crate) fn messages(&self) -> &[ChatCompletionRequestMessage] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::FrameMetadata;
    use async_openai::types::ChatCompletionRequestUserMessageArgs;

    #[test]
    fn test_intent_parsing() {
        assert_eq!(QueryIntent::parse("RETRIEVAL"), Some(QueryIntent::Retrieval));
        assert_eq!(QueryIntent::parse("search"), Some(QueryIntent::Retrieval));
        assert_eq!(QueryIntent::parse(" chat \n"), Some(QueryIntent::Chat));
        assert_eq!(QueryIntent::parse("maybe?"), None);
    }

    #[test]
    fn test_generated_answer_parses_json() {
        let parsed = GeneratedAnswer::parse(r#"{"answer": "A red car at 3s.", "found": true}"#);
        assert_eq!(parsed.text, "A red car at 3s.");
        assert!(parsed.has_relevant_findings);

        let parsed = GeneratedAnswer::parse(r#"{"answer": "Nothing matched.", "found": false}"#);
        assert!(!parsed.has_relevant_findings);
    }

    #[test]
    fn test_generated_answer_parses_fenced_json() {
        let raw = "```json\n{\"answer\": \"ok\", \"found\": false}\n```";
        let parsed = GeneratedAnswer::parse(raw);
        assert_eq!(parsed.text, "ok");
        assert!(!parsed.has_relevant_findings);
    }

    #[test]
    fn test_generated_answer_degrades_on_prose() {
        let parsed = GeneratedAnswer::parse("I saw a red car around the 3 second mark.");
        assert_eq!(parsed.text, "I saw a red car around the 3 second mark.");
        assert!(parsed.has_relevant_findings);
    }

    #[test]
    fn test_format_findings() {
        let findings = vec![
            Finding {
                source_path: "a.mp4".to_string(),
                timestamp: 1.0,
                description: "a red car".to_string(),
                distance: 0.1,
            },
            Finding {
                source_path: "a.mp4".to_string(),
                timestamp: 10.0,
                description: "a blue truck".to_string(),
                distance: 0.4,
            },
        ];

        let text = format_findings(&findings);
        assert_eq!(text, "- Timestamp 1.0s: a red car\n- Timestamp 10.0s: a blue truck");
    }

    #[test]
    fn test_finding_from_search_hit() {
        let hit = SearchHit {
            id: 2,
            distance: 0.5,
            metadata: FrameMetadata {
                source_path: "a.mp4".to_string(),
                timestamp: 4.0,
                description: "a dog".to_string(),
            },
        };

        let finding = Finding::from(hit);
        assert_eq!(finding.source_path, "a.mp4");
        assert!((finding.timestamp - 4.0).abs() < f64::EPSILON);
        assert!((finding.distance - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_conversation_trims_old_turns() {
        let mut conversation = Conversation::new();
        for i in 0..25 {
            let msg = ChatCompletionRequestUserMessageArgs::default()
                .content(format!("message {i}"))
                .build()
                .unwrap();
            conversation.push(msg.into());
        }
        assert_eq!(conversation.len(), 20);
    }
}
