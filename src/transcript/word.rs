use crate::foundation::error::{ManimlineError, ManimlineResult};
use anyhow::Context as _;
use std::path::Path;

fn full_confidence() -> f64 {
    1.0
}

/// One transcribed word with its timing in seconds.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WordStamp {
    pub word: String,
    pub start: f64,
    pub end: f64,
    /// Recognizer confidence in `[0, 1]`.
    #[serde(default = "full_confidence", alias = "probability")]
    pub confidence: f64,
}

impl WordStamp {
    /// Word with full confidence.
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
            confidence: 1.0,
        }
    }

    /// Finite timing with a non-negative start. An end before the start is still usable.
    pub fn has_usable_timing(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start >= 0.0
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum TranscriptDoc {
    Words(Vec<WordStamp>),
    Verbose(VerboseDoc),
}

#[derive(serde::Deserialize)]
struct VerboseDoc {
    #[serde(default)]
    words: Vec<WordStamp>,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(serde::Deserialize)]
struct VerboseSegment {
    #[serde(default)]
    words: Vec<WordStamp>,
}

/// Parse a transcript document.
///
/// Accepts a plain array of word stamps or whisper-style verbose JSON, where words sit either at
/// the top level or inside `segments[].words`. Word text is trimmed; entries with non-finite or
/// negative timing are dropped and inverted spans are collapsed onto their start.
pub fn parse_transcript(json: &str) -> ManimlineResult<Vec<WordStamp>> {
    let doc: TranscriptDoc = serde_json::from_str(json)
        .map_err(|e| ManimlineError::malformed(format!("transcript JSON: {e}")))?;
    let raw = match doc {
        TranscriptDoc::Words(w) => w,
        TranscriptDoc::Verbose(v) if !v.words.is_empty() => v.words,
        TranscriptDoc::Verbose(v) => v.segments.into_iter().flat_map(|s| s.words).collect(),
    };

    let mut out = Vec::with_capacity(raw.len());
    for (i, mut w) in raw.into_iter().enumerate() {
        if !w.has_usable_timing() {
            tracing::warn!(index = i, start = w.start, end = w.end, "dropping word with bad timing");
            continue;
        }
        if w.end < w.start {
            w.end = w.start;
        }
        if !w.confidence.is_finite() {
            w.confidence = 1.0;
        }
        w.confidence = w.confidence.clamp(0.0, 1.0);
        w.word = w.word.trim().to_owned();
        out.push(w);
    }
    Ok(out)
}

/// Read and parse a transcript file.
pub fn read_transcript(path: impl AsRef<Path>) -> ManimlineResult<Vec<WordStamp>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read transcript {}", path.display()))?;
    parse_transcript(&json)
}

#[cfg(test)]
#[path = "../../tests/unit/transcript/word.rs"]
mod tests;
