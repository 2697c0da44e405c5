//! Caption overlays built from word timings.
//!
//! Cues are computed from the transcript and drawn by the composed script above every scene
//! layer. Sentences break after words ending in `.`, `!` or `?`.

use crate::codegen::presets::{self, py_str};
use crate::foundation::error::{ManimlineError, ManimlineResult};
use crate::transcript::word::WordStamp;
use std::fmt::Write as _;

/// Shortest time a caption stays on screen, in seconds.
pub const MIN_CAPTION_SECS: f64 = 0.1;

const SENTENCE_END: &[char] = &['.', '!', '?'];

/// How words are grouped into captions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionStyle {
    /// The current sentence grows one word at a time.
    #[default]
    WordByWord,
    /// One caption per sentence.
    Sentence,
    /// The whole sentence, with the spoken word repeated underneath in the highlight color.
    Hybrid,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionPosition {
    #[default]
    Bottom,
    Top,
    Center,
}

/// Caption appearance. Captions are drawn only when enabled and words are supplied.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    pub enabled: bool,
    pub style: CaptionStyle,
    pub position: CaptionPosition,
    pub font: String,
    pub font_size: u32,
    /// Manim color name or `#rrggbb`.
    pub color: String,
    pub highlight_color: String,
    /// Backdrop color behind the text; `None` draws bare text.
    pub background: Option<String>,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            style: CaptionStyle::default(),
            position: CaptionPosition::default(),
            font: "Arial".to_owned(),
            font_size: 48,
            color: "WHITE".to_owned(),
            highlight_color: "YELLOW".to_owned(),
            background: Some("BLACK".to_owned()),
        }
    }
}

impl CaptionConfig {
    /// Reject sizes and colors the script could not draw.
    pub fn validate(&self) -> ManimlineResult<()> {
        if self.font_size == 0 {
            return Err(ManimlineError::validation("captions.font_size must be positive"));
        }
        if self.font.trim().is_empty() {
            return Err(ManimlineError::validation("captions.font must not be empty"));
        }
        let colors = [Some(&self.color), Some(&self.highlight_color), self.background.as_ref()];
        for c in colors.into_iter().flatten() {
            if presets::color_expr(c).is_none() {
                return Err(ManimlineError::validation(format!("unknown caption color {c:?}")));
            }
        }
        Ok(())
    }
}

/// One caption shown over `[start, end)`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaptionCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// Word repeated under the sentence in hybrid captions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
}

/// Caption cues for `words`, ordered by start time.
///
/// Blank words and words without usable timing are skipped. Every cue lasts at least
/// [`MIN_CAPTION_SECS`].
pub fn caption_cues(words: &[WordStamp], style: CaptionStyle) -> Vec<CaptionCue> {
    let mut cues = Vec::new();
    for sentence in sentences(words) {
        match style {
            CaptionStyle::Sentence => {
                let start = sentence[0].start;
                let end = sentence.iter().map(|w| w.end).fold(start, f64::max);
                cues.push(cue(start, end, join(&sentence), None));
            }
            CaptionStyle::WordByWord | CaptionStyle::Hybrid => {
                let full = join(&sentence);
                for (i, w) in sentence.iter().enumerate() {
                    let end = sentence.get(i + 1).map_or(w.end, |next| next.start);
                    let (text, highlight) = match style {
                        CaptionStyle::Hybrid => (full.clone(), Some(w.word.trim().to_owned())),
                        _ => (join(&sentence[..=i]), None),
                    };
                    cues.push(cue(w.start, end, text, highlight));
                }
            }
        }
    }
    cues.sort_by(|a, b| a.start.total_cmp(&b.start));
    cues
}

/// Drop cues starting at or after `duration` and cut the rest to end by it.
pub(crate) fn clip(cues: Vec<CaptionCue>, duration: f64) -> Vec<CaptionCue> {
    cues.into_iter()
        .filter(|c| c.start < duration)
        .map(|mut c| {
            c.end = c.end.min(duration);
            c
        })
        .collect()
}

fn cue(start: f64, end: f64, text: String, highlight: Option<String>) -> CaptionCue {
    CaptionCue {
        start,
        end: end.max(start + MIN_CAPTION_SECS),
        text,
        highlight,
    }
}

fn sentences(words: &[WordStamp]) -> Vec<Vec<&WordStamp>> {
    let mut out = Vec::new();
    let mut current: Vec<&WordStamp> = Vec::new();
    for w in words {
        let text = w.word.trim();
        if text.is_empty() || !w.has_usable_timing() {
            continue;
        }
        current.push(w);
        if text.ends_with(SENTENCE_END) {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn join(words: &[&WordStamp]) -> String {
    words
        .iter()
        .map(|w| w.word.trim())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `_show_caption` / `_hide_caption` methods of the generated scene.
pub(crate) fn helpers(config: &CaptionConfig, layer: i32) -> String {
    let color = |c: &str, fallback: &str| {
        presets::color_expr(c).unwrap_or_else(|| {
            tracing::warn!(color = c, fallback, "unknown caption color");
            fallback.to_owned()
        })
    };
    let text_color = color(&config.color, "WHITE");
    let highlight = color(&config.highlight_color, "YELLOW");
    let font = py_str(config.font.trim());
    let size = config.font_size.max(1);
    let small = (size - size / 4).max(1);

    let mut out = String::new();
    out.push_str("\n    def _show_caption(self, text, word=None):\n");
    out.push_str("        self._hide_caption()\n");
    let _ = writeln!(
        out,
        "        parts = [Text(text, font={font}, font_size={size}, color={text_color})]"
    );
    out.push_str("        if word is not None:\n");
    let _ = writeln!(
        out,
        "            parts.append(Text(word, font={font}, font_size={small}, color={highlight}))"
    );
    out.push_str("        caption = VGroup(*parts).arrange(DOWN, buff=0.15)\n");
    out.push_str("        if caption.width > config.frame_width * 0.9:\n");
    out.push_str("            caption.scale_to_fit_width(config.frame_width * 0.9)\n");
    let placement = match config.position {
        CaptionPosition::Bottom => "caption.to_edge(DOWN, buff=0.5)",
        CaptionPosition::Top => "caption.to_edge(UP, buff=0.5)",
        CaptionPosition::Center => "caption.move_to(ORIGIN)",
    };
    let _ = writeln!(out, "        {placement}");
    if let Some(bg) = &config.background {
        let bg = color(bg, "BLACK");
        let _ = writeln!(
            out,
            "        caption = VGroup(BackgroundRectangle(caption, color={bg}, fill_opacity=0.7, buff=0.15), caption)"
        );
    }
    let _ = writeln!(out, "        caption.set_z_index({layer})");
    out.push_str("        self.add(caption)\n");
    out.push_str("        self._caption = caption\n");
    out.push_str("\n    def _hide_caption(self):\n");
    out.push_str("        if self._caption is not None:\n");
    out.push_str("            self.remove(self._caption)\n");
    out.push_str("            self._caption = None\n");
    out
}

/// Construct-body call that shows `cue`.
pub(crate) fn show_call(cue: &CaptionCue) -> String {
    match &cue.highlight {
        Some(word) => format!("self._show_caption({}, {})", py_str(&cue.text), py_str(word)),
        None => format!("self._show_caption({})", py_str(&cue.text)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/captions.rs"]
mod tests;
