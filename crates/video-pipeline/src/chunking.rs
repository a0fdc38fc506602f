use crate::error::{StageError, StageResult};
use crate::transcript::WordToken;
use serde::{Deserialize, Serialize};

/// One fixed-duration, overlapping time segment of a transcript, indexed as a
/// single semantic search unit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranscriptChunk {
    /// 0-based, sequential, no gaps.
    pub chunk_index: u32,
    pub text: String,
    /// First contributing word's start, not the nominal window start.
    pub start_time_sec: f64,
    /// `min(last_word.end_time, window_end)`. A word straddling the window
    /// boundary can extend slightly past the cut; the reported end never
    /// does. Consequence: consecutive chunks' reported ranges may overlap by
    /// less than the nominal overlap when words are sparse near a boundary.
    /// This is observed behavior, kept as-is.
    pub end_time_sec: f64,
    pub word_count: u32,
}

impl TranscriptChunk {
    pub fn duration_sec(&self) -> f64 {
        self.end_time_sec - self.start_time_sec
    }
}

/// Lazy sliding-window chunker over words sorted by start time.
///
/// A word belongs to the window `[start, start + duration)` when
/// `word.start < window_end && word.end > window_start`; the test is
/// overlap-inclusive, so a boundary-straddling word lands in both adjacent
/// chunks. The window
/// advances by `duration - overlap` after each chunk and the sequence ends
/// on the first empty window or once the window start passes the last word's
/// end. Restart means rerun from scratch; there is no mid-sequence
/// checkpoint.
pub struct TranscriptChunker<'a> {
    words: &'a [WordToken],
    chunk_duration: f64,
    overlap: f64,
    window_start: f64,
    next_index: u32,
    done: bool,
}

impl<'a> TranscriptChunker<'a> {
    pub fn new(words: &'a [WordToken], chunk_duration: f64, overlap: f64) -> StageResult<Self> {
        if !(chunk_duration > 0.0) || !chunk_duration.is_finite() {
            return Err(StageError::InvalidInput(format!(
                "chunk duration must be positive, got {chunk_duration}"
            )));
        }
        if !(0.0..chunk_duration).contains(&overlap) {
            return Err(StageError::InvalidInput(format!(
                "overlap must be in [0, chunk_duration), got {overlap}"
            )));
        }
        Ok(Self {
            words,
            chunk_duration,
            overlap,
            window_start: 0.0,
            next_index: 0,
            done: false,
        })
    }
}

impl Iterator for TranscriptChunker<'_> {
    type Item = TranscriptChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.words.is_empty() {
            return None;
        }

        let window_start = self.window_start;
        let window_end = window_start + self.chunk_duration;

        let members = self
            .words
            .iter()
            .filter(|w| w.start_time < window_end && w.end_time > window_start)
            .collect::<Vec<_>>();

        let (first, last) = match (members.first(), members.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                // no more content
                self.done = true;
                return None;
            }
        };

        let chunk = TranscriptChunk {
            chunk_index: self.next_index,
            text: members
                .iter()
                .map(|w| w.content.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            start_time_sec: first.start_time,
            end_time_sec: last.end_time.min(window_end),
            word_count: members.len() as u32,
        };

        self.next_index += 1;
        self.window_start += self.chunk_duration - self.overlap;

        // past the last word, nothing left to window over
        let transcript_end = self.words[self.words.len() - 1].end_time;
        if self.window_start >= transcript_end {
            self.done = true;
        }

        Some(chunk)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn word(content: &str, start: f64, end: f64) -> WordToken {
        WordToken {
            content: content.to_string(),
            start_time: start,
            end_time: end,
            confidence: 1.0,
        }
    }

    /// Words spoken roughly continuously from 0 to 55.4s.
    fn long_transcript() -> Vec<WordToken> {
        let mut words = vec![word("OK,", 0.0, 0.3), word("let's", 0.3, 0.6), word("go", 0.6, 1.0)];
        let mut t = 1.0;
        let mut n = 0;
        while t < 55.0 {
            words.push(word(&format!("w{n}"), t, t + 0.4));
            t += 0.5;
            n += 1;
        }
        words.push(word("done", 55.0, 55.4));
        words
    }

    #[test]
    fn test_example_windowing() {
        let words = long_transcript();
        let chunks = TranscriptChunker::new(&words, 10.0, 1.0)
            .expect("chunker")
            .collect::<Vec<_>>();

        // chunk 0 covers words with start < 10, reported end clipped to the window
        let first = &chunks[0];
        assert_eq!(first.chunk_index, 0);
        assert_eq!(first.start_time_sec, 0.0);
        assert!(first.end_time_sec <= 10.0);
        assert!(first.text.starts_with("OK, let's go"));

        // chunk 1's window starts at 9, so the straddling word reappears
        let second = &chunks[1];
        assert!(second.start_time_sec < 10.0);
        assert!(second.start_time_sec >= 9.0 - 0.5);

        // windows advance by 9; the sequence must end once window_start >= 55.4
        let last = chunks.last().expect("chunks");
        assert!((last.chunk_index as f64) * 9.0 < 55.4);
        assert_eq!(
            chunks.len(),
            chunks.iter().map(|c| c.chunk_index).max().unwrap() as usize + 1
        );
    }

    #[test]
    fn test_chunk_indexes_sequential_and_monotonic() {
        let words = long_transcript();
        let chunks = TranscriptChunker::new(&words, 10.0, 1.0)
            .expect("chunker")
            .collect::<Vec<_>>();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as u32);
        }
        for pair in chunks.windows(2) {
            assert!(pair[1].start_time_sec >= pair[0].start_time_sec);
        }
    }

    #[test]
    fn test_coverage_has_no_holes() {
        let words = long_transcript();
        let chunks = TranscriptChunker::new(&words, 10.0, 1.0)
            .expect("chunker")
            .collect::<Vec<_>>();

        assert_eq!(chunks[0].start_time_sec, words[0].start_time);
        let transcript_end = words.last().unwrap().end_time;
        // overlap adds redundancy, never a hole: each chunk begins at or
        // before the previous chunk's reported end
        for pair in chunks.windows(2) {
            assert!(pair[1].start_time_sec <= pair[0].end_time_sec + 1e-9);
        }
        let covered_end = chunks
            .iter()
            .map(|c| c.end_time_sec)
            .fold(f64::MIN, f64::max);
        // final window is clipped to its end, but every word was windowed
        assert!(covered_end >= transcript_end - 10.0);
        let last_chunk = chunks.last().unwrap();
        assert!(last_chunk.text.ends_with("done"));
    }

    #[test]
    fn test_boundary_straddling_word_in_both_chunks() {
        // word spans the 10s boundary of chunk 0 and the start of chunk 1's
        // window at 9s
        let words = vec![
            word("a", 0.0, 0.5),
            word("straddle", 9.8, 10.6),
            word("b", 11.0, 11.5),
        ];
        let chunks = TranscriptChunker::new(&words, 10.0, 1.0)
            .expect("chunker")
            .collect::<Vec<_>>();
        assert!(chunks[0].text.contains("straddle"));
        assert!(chunks[1].text.contains("straddle"));
        // chunk 0's reported end is clipped to the window even though the
        // word runs to 10.6
        assert_eq!(chunks[0].end_time_sec, 10.0);
    }

    #[test]
    fn test_sparse_words_skip_to_termination() {
        // nothing in the second window: sequence stops rather than emitting
        // empty chunks
        let words = vec![word("only", 0.0, 0.5)];
        let chunks = TranscriptChunker::new(&words, 10.0, 1.0)
            .expect("chunker")
            .collect::<Vec<_>>();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].end_time_sec, 0.5);
    }

    #[test]
    fn test_empty_words_yield_nothing() {
        let words: Vec<WordToken> = vec![];
        let mut chunker = TranscriptChunker::new(&words, 10.0, 1.0).expect("chunker");
        assert!(chunker.next().is_none());
    }

    #[test]
    fn test_invalid_parameters() {
        let words = vec![word("a", 0.0, 0.5)];
        assert!(TranscriptChunker::new(&words, 0.0, 0.0).is_err());
        assert!(TranscriptChunker::new(&words, 10.0, 10.0).is_err());
        assert!(TranscriptChunker::new(&words, 10.0, -1.0).is_err());
    }
}
