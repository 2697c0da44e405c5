use crate::foundation::core::{MIN_SCENE_SECS, TimeSpan};
use crate::scene::model::SceneDraft;
use crate::transcript::word::WordStamp;

/// Characters that close a scene when a word ends with them.
const SENTENCE_END: [char; 5] = ['.', '!', '?', ':', ';'];

/// Segmentation thresholds.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DetectorOpts {
    /// Silence between words, in seconds, that starts a new scene.
    pub pause_threshold: f64,
    /// Longest a scene may grow by adding words, in seconds.
    pub max_scene_len: f64,
    /// Close a scene after a word ending in sentence punctuation.
    pub split_on_punctuation: bool,
}

impl Default for DetectorOpts {
    fn default() -> Self {
        Self {
            pause_threshold: 0.6,
            max_scene_len: 8.0,
            split_on_punctuation: true,
        }
    }
}

/// Turns word timestamps into candidate scenes for [`Timeline::merge`](crate::Timeline::merge).
#[derive(Clone, Debug, Default)]
pub struct AutoDetector {
    opts: DetectorOpts,
}

impl AutoDetector {
    /// Detector with explicit thresholds.
    pub fn new(opts: DetectorOpts) -> Self {
        Self { opts }
    }

    /// Segmentation thresholds in use.
    pub fn opts(&self) -> &DetectorOpts {
        &self.opts
    }

    /// Group `words` into candidates.
    ///
    /// A scene closes on a pause longer than `pause_threshold`, before a word that would push it
    /// past `max_scene_len`, and (optionally) after sentence punctuation. Blank words are
    /// skipped. Each candidate spans its first word's start to its last word's end, widened to
    /// the minimum scene length, with the words joined by spaces as the prompt.
    #[tracing::instrument(level = "debug", skip_all, fields(words = words.len()))]
    pub fn detect(&self, words: &[WordStamp]) -> Vec<SceneDraft> {
        let words = usable_words(words);
        let mut out = Vec::new();
        let mut current: Vec<&WordStamp> = Vec::new();

        for w in &words {
            if let (Some(first), Some(last)) = (current.first(), current.last()) {
                let gap = w.start - last.end;
                let grown = w.end.max(last.end) - first.start;
                if gap > self.opts.pause_threshold || grown > self.opts.max_scene_len {
                    out.extend(candidate(&current));
                    current.clear();
                }
            }
            current.push(w);
            if self.opts.split_on_punctuation && w.word.trim_end().ends_with(SENTENCE_END) {
                out.extend(candidate(&current));
                current.clear();
            }
        }
        out.extend(candidate(&current));

        tracing::debug!(candidates = out.len(), "detected scenes");
        out
    }
}

/// Blank words and words with unusable timing are skipped; an end before its start is clamped.
fn usable_words(words: &[WordStamp]) -> Vec<WordStamp> {
    words
        .iter()
        .enumerate()
        .filter_map(|(i, w)| {
            if w.word.trim().is_empty() {
                return None;
            }
            if !w.has_usable_timing() {
                tracing::warn!(index = i, start = w.start, end = w.end, "skipping word with bad timing");
                return None;
            }
            let mut w = w.clone();
            w.end = w.end.max(w.start);
            Some(w)
        })
        .collect()
}

fn candidate(words: &[&WordStamp]) -> Option<SceneDraft> {
    let first = words.first()?;
    let end = words.iter().map(|w| w.end).fold(first.start, f64::max);
    let span = TimeSpan {
        start: first.start,
        end,
    }
    .widen_to(MIN_SCENE_SECS);
    let prompt = words
        .iter()
        .map(|w| w.word.trim())
        .collect::<Vec<_>>()
        .join(" ");
    Some(SceneDraft::candidate(span, prompt))
}

/// Evenly spaced empty-prompt candidates covering `[0, duration)`.
///
/// The last candidate is cut at `duration` (widened to the minimum scene length if the remainder
/// is shorter). Non-positive or non-finite inputs yield no candidates.
pub fn fixed_intervals(duration: f64, interval: f64) -> Vec<SceneDraft> {
    if !(duration.is_finite() && interval.is_finite() && duration > 0.0 && interval > 0.0) {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut i = 0u32;
    loop {
        let start = f64::from(i) * interval;
        if start >= duration {
            break;
        }
        let span = TimeSpan {
            start,
            end: (start + interval).min(duration),
        }
        .widen_to(MIN_SCENE_SECS);
        out.push(SceneDraft::candidate(span, ""));
        i += 1;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/detect/auto.rs"]
mod tests;
