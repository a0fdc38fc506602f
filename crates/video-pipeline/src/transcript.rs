use crate::error::{StageError, StageResult};
use serde::{Deserialize, Serialize};

pub const TRANSCRIPT_SCHEMA_VERSION: u32 = 1;

/// The transcript object the transcription oracle writes to
/// `{video_id}/transcript.json`. Strictly validated at the boundary: unknown
/// fields, unknown item kinds or inverted word timings are rejected here
/// instead of being papered over downstream.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranscriptDocument {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    pub items: Vec<TranscriptItem>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptItem {
    Word {
        content: String,
        start_time: f64,
        end_time: f64,
        #[serde(default = "default_confidence")]
        confidence: f64,
    },
    /// Carries no timing of its own; attaches to the preceding word.
    Punctuation { content: String },
}

fn default_confidence() -> f64 {
    1.0
}

/// A spoken word with timing. Ephemeral: produced by parsing a transcript,
/// consumed immediately by chunking, never persisted standalone.
#[derive(Clone, Debug, PartialEq)]
pub struct WordToken {
    pub content: String,
    pub start_time: f64,
    pub end_time: f64,
    pub confidence: f64,
}

impl TranscriptDocument {
    pub fn parse(json: &str) -> StageResult<Self> {
        let doc: TranscriptDocument = serde_json::from_str(json)
            .map_err(|e| StageError::InvalidInput(format!("malformed transcript: {e}")))?;
        if doc.schema_version != TRANSCRIPT_SCHEMA_VERSION {
            return Err(StageError::InvalidInput(format!(
                "unsupported transcript schema version {}",
                doc.schema_version
            )));
        }
        for item in &doc.items {
            if let TranscriptItem::Word {
                content,
                start_time,
                end_time,
                ..
            } = item
            {
                if !start_time.is_finite() || !end_time.is_finite() || start_time >= end_time {
                    return Err(StageError::InvalidInput(format!(
                        "word \"{content}\" has invalid timing [{start_time}, {end_time}]"
                    )));
                }
            }
        }
        Ok(doc)
    }

    /// Flatten to word tokens. Punctuation attaches to the immediately
    /// preceding word's text and never participates in windowing decisions;
    /// leading punctuation with no word to attach to is dropped.
    pub fn words(&self) -> Vec<WordToken> {
        let mut words: Vec<WordToken> = Vec::new();
        for item in &self.items {
            match item {
                TranscriptItem::Word {
                    content,
                    start_time,
                    end_time,
                    confidence,
                } => words.push(WordToken {
                    content: content.clone(),
                    start_time: *start_time,
                    end_time: *end_time,
                    confidence: *confidence,
                }),
                TranscriptItem::Punctuation { content } => {
                    if let Some(last) = words.last_mut() {
                        last.content.push_str(content);
                    }
                }
            }
        }
        words
    }

    /// Full transcript text, words joined by single spaces.
    pub fn full_text(&self) -> String {
        self.words()
            .iter()
            .map(|w| w.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn doc(items: serde_json::Value) -> String {
        serde_json::json!({ "schema_version": 1, "items": items }).to_string()
    }

    #[test]
    fn test_punctuation_attaches_to_preceding_word() {
        let json = doc(serde_json::json!([
            { "kind": "word", "content": "OK", "start_time": 0.0, "end_time": 0.3 },
            { "kind": "punctuation", "content": "," },
            { "kind": "word", "content": "let's", "start_time": 0.3, "end_time": 0.6 },
            { "kind": "word", "content": "go", "start_time": 0.6, "end_time": 1.0 },
            { "kind": "punctuation", "content": "!" },
        ]));
        let words = TranscriptDocument::parse(&json).expect("parse").words();
        assert_eq!(words.len(), 3);
        assert_eq!(words[0].content, "OK,");
        assert_eq!(words[2].content, "go!");
        assert_eq!(words[0].confidence, 1.0);
    }

    #[test]
    fn test_leading_punctuation_is_dropped() {
        let json = doc(serde_json::json!([
            { "kind": "punctuation", "content": "…" },
            { "kind": "word", "content": "hi", "start_time": 0.0, "end_time": 0.4 },
        ]));
        let words = TranscriptDocument::parse(&json).expect("parse").words();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].content, "hi");
    }

    #[test]
    fn test_rejects_unknown_fields_and_versions() {
        let unknown_field = serde_json::json!({
            "schema_version": 1,
            "items": [],
            "extra": true,
        })
        .to_string();
        assert!(matches!(
            TranscriptDocument::parse(&unknown_field),
            Err(StageError::InvalidInput(_))
        ));

        let bad_version = serde_json::json!({ "schema_version": 2, "items": [] }).to_string();
        assert!(matches!(
            TranscriptDocument::parse(&bad_version),
            Err(StageError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_word_timing() {
        let json = doc(serde_json::json!([
            { "kind": "word", "content": "oops", "start_time": 1.0, "end_time": 0.5 },
        ]));
        assert!(matches!(
            TranscriptDocument::parse(&json),
            Err(StageError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_full_text() {
        let json = doc(serde_json::json!([
            { "kind": "word", "content": "hello", "start_time": 0.0, "end_time": 0.4 },
            { "kind": "word", "content": "world", "start_time": 0.4, "end_time": 0.9 },
            { "kind": "punctuation", "content": "." },
        ]));
        let parsed = TranscriptDocument::parse(&json).expect("parse");
        assert_eq!(parsed.full_text(), "hello world.");
    }
}
