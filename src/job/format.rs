use crate::transcription::{RawTranscription, TimestampMode, TranscriptChunk};
use serde::{Deserialize, Serialize};

/// Public result shape for a successful job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedResult {
    /// Full transcript text
    pub text: String,
    /// Timestamped chunks, omitted from JSON when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<TranscriptChunk>>,
}

/// Normalizes raw adapter output into the public result shape
///
/// `chunks` survive only when timestamps were requested, and are passed
/// through in adapter order, untouched. When the adapter omitted chunks the
/// caller asked for, absence is passed through as well; the adapter's
/// capability limits are not an error.
#[must_use]
pub fn format(raw: RawTranscription, requested: TimestampMode) -> FormattedResult {
    let chunks = match requested {
        TimestampMode::None => {
            if raw.chunks.is_some() {
                tracing::debug!("dropping chunks the caller did not ask for");
            }
            None
        }
        TimestampMode::Segment | TimestampMode::Word => raw.chunks,
    };

    FormattedResult {
        text: raw.text,
        chunks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(start: f32, end: f32, text: &str) -> TranscriptChunk {
        TranscriptChunk {
            timestamp: (Some(start), Some(end)),
            text: text.to_owned(),
        }
    }

    #[test]
    fn test_text_always_included() {
        let raw = RawTranscription {
            text: "hello".to_owned(),
            chunks: None,
        };
        let formatted = format(raw, TimestampMode::None);
        assert_eq!(formatted.text, "hello");
        assert!(formatted.chunks.is_none());
    }

    #[test]
    fn test_none_mode_drops_chunks() {
        let raw = RawTranscription {
            text: "hello".to_owned(),
            chunks: Some(vec![chunk(0.0, 1.0, "hello")]),
        };
        let formatted = format(raw, TimestampMode::None);
        assert!(formatted.chunks.is_none());
    }

    #[test]
    fn test_segment_mode_passes_chunks_through_in_order() {
        let chunks = vec![
            chunk(0.0, 1.0, "one"),
            chunk(1.0, 2.0, "two"),
            chunk(1.0, 2.0, "two"),
            chunk(2.0, 3.0, "three"),
        ];
        let raw = RawTranscription {
            text: "one two two three".to_owned(),
            chunks: Some(chunks.clone()),
        };

        // Order preserved, duplicates untouched
        let formatted = format(raw, TimestampMode::Segment);
        assert_eq!(formatted.chunks, Some(chunks));
    }

    #[test]
    fn test_word_mode_passes_chunks_through() {
        let chunks = vec![chunk(0.5, 0.9, "hi"), chunk(0.9, 1.4, "there")];
        let raw = RawTranscription {
            text: "hi there".to_owned(),
            chunks: Some(chunks.clone()),
        };
        let formatted = format(raw, TimestampMode::Word);
        assert_eq!(formatted.chunks, Some(chunks));
    }

    #[test]
    fn test_absent_chunks_not_fabricated() {
        let raw = RawTranscription {
            text: "no timestamps here".to_owned(),
            chunks: None,
        };
        let formatted = format(raw, TimestampMode::Word);
        assert!(formatted.chunks.is_none());
    }

    #[test]
    fn test_open_ended_timestamps_preserved() {
        let chunks = vec![TranscriptChunk {
            timestamp: (Some(0.0), None),
            text: "trailing".to_owned(),
        }];
        let raw = RawTranscription {
            text: "trailing".to_owned(),
            chunks: Some(chunks.clone()),
        };
        let formatted = format(raw, TimestampMode::Segment);
        assert_eq!(formatted.chunks, Some(chunks));
    }

    #[test]
    fn test_empty_chunk_list_preserved() {
        let raw = RawTranscription {
            text: String::new(),
            chunks: Some(vec![]),
        };
        let formatted = format(raw, TimestampMode::Segment);
        assert_eq!(formatted.chunks, Some(vec![]));
    }
}
