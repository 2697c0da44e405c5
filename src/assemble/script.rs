use crate::assemble::captions::{self, CaptionConfig, CaptionCue, caption_cues};
use crate::assemble::plan::{Placement, RenderConfig, RenderPlan, placements, segments};
use crate::codegen::presets::{self, py_num};
use crate::codegen::validate::{CodeValidator, Validation, dedent};
use crate::foundation::core::collapse_whitespace;
use crate::foundation::error::{ManimlineError, ManimlineResult};
use crate::scene::model::Scene;
use crate::scene::timeline::Timeline;
use crate::transcript::word::WordStamp;
use std::fmt::Write as _;

/// Name of the generated `Scene` subclass.
pub const CLASS_NAME: &str = "TimelineScene";

/// Camera calls that only exist on `ThreeDScene`.
const CAMERA_METHODS: &[&str] = &[
    "set_camera_orientation",
    "move_camera",
    "begin_ambient_camera_rotation",
    "stop_ambient_camera_rotation",
];

/// Lines dropped from fragments; star imports are only legal at module level.
/// Inside a block they become `pass` so the block keeps a body.
const MODULE_LEVEL_PREFIXES: &[&str] = &["from manim import", "import manim", "import numpy as np"];

/// Seconds below which a wait is skipped.
const WAIT_EPS: f64 = 1e-3;

const HELPERS: &str = r#"    def _enter(self, scene_id, body, layer):
        before = {id(m) for m in self.mobjects}
        body()
        added = [m for m in self.mobjects if id(m) not in before]
        for m in added:
            m.set_z_index(layer)
        self._active[scene_id] = added

    def _leave(self, scene_id):
        added = self._active.pop(scene_id, [])
        if added:
            self.remove(*added)

    def _wait_until(self, t):
        remaining = t - self.renderer.time
        if remaining > 1e-3:
            self.wait(remaining)
"#;

/// Composes a [`Timeline`] into a [`RenderPlan`].
#[derive(Clone, Debug, Default)]
pub struct Assembler {
    config: RenderConfig,
    captions: CaptionConfig,
    validator: CodeValidator,
}

enum Cue<'a> {
    Leave(&'a Placement),
    HideCaption,
    Enter(&'a Placement),
    ShowCaption(&'a CaptionCue),
}

impl Cue<'_> {
    /// Order among cues at the same instant.
    fn rank(&self) -> u8 {
        match self {
            Cue::Leave(_) => 0,
            Cue::HideCaption => 1,
            Cue::Enter(_) => 2,
            Cue::ShowCaption(_) => 3,
        }
    }
}

impl Assembler {
    /// Assembler writing `config` into every script header.
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            captions: CaptionConfig::default(),
            validator: CodeValidator::new(),
        }
    }

    /// Draw captions with `captions` when words are supplied to [`Assembler::compose_captioned`].
    pub fn with_captions(mut self, captions: CaptionConfig) -> Self {
        self.captions = captions;
        self
    }

    /// Render settings used for composed plans.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Build the script, placements and composite segments for `timeline`.
    ///
    /// Every scene must carry valid code. Each fragment becomes a method of the generated scene;
    /// playback enters scenes at their start time in `(start, layer, id)` order, stacks their
    /// mobjects by layer and removes them at their end time.
    #[tracing::instrument(level = "debug", skip_all, fields(scenes = timeline.len()))]
    pub fn compose(&self, timeline: &Timeline) -> ManimlineResult<RenderPlan> {
        self.compose_inner(timeline, &[])
    }

    /// [`Assembler::compose`] plus caption overlays for `words` when captions are enabled.
    ///
    /// Captions are drawn above every scene layer; cues past the timeline's end are dropped.
    #[tracing::instrument(level = "debug", skip_all, fields(scenes = timeline.len(), words = words.len()))]
    pub fn compose_captioned(
        &self,
        timeline: &Timeline,
        words: &[WordStamp],
    ) -> ManimlineResult<RenderPlan> {
        self.compose_inner(timeline, words)
    }

    fn compose_inner(&self, timeline: &Timeline, words: &[WordStamp]) -> ManimlineResult<RenderPlan> {
        if timeline.is_empty() {
            return Err(ManimlineError::TimelineEmpty);
        }

        let mut bodies = Vec::with_capacity(timeline.len());
        for scene in timeline.scenes() {
            bodies.push((scene, self.fragment(scene)?));
        }

        let placements = placements(timeline.scenes());
        let segments = segments(&placements);
        let duration = timeline.duration();
        let three_d = bodies
            .iter()
            .any(|(s, body)| s.visual_type().needs_3d() || uses_camera(body));

        let captions = if self.captions.enabled {
            captions::clip(caption_cues(words, self.captions.style), duration)
        } else {
            Vec::new()
        };

        let mut script = self.header(three_d);
        if !captions.is_empty() {
            let top = placements.iter().map(|p| p.layer).max().unwrap_or(0);
            script.push_str(&captions::helpers(&self.captions, top.saturating_add(1)));
        }
        for (scene, body) in &bodies {
            write_scene_method(&mut script, scene, body);
        }
        write_construct(&mut script, &placements, &captions, duration);

        let checked = self.validator.check_script(&script);
        if !checked.is_valid() {
            tracing::error!(reason = %checked, "composed script failed validation");
            return Err(ManimlineError::validation(format!(
                "composed script invalid: {checked}"
            )));
        }

        tracing::info!(
            scenes = placements.len(),
            segments = segments.len(),
            duration,
            three_d,
            captions = captions.len(),
            "assembled render plan"
        );
        Ok(RenderPlan {
            script,
            class_name: CLASS_NAME.to_owned(),
            placements,
            segments,
            duration,
            config: self.config.clone(),
            captions,
        })
    }

    /// Validated, dedented construct body for `scene`.
    fn fragment(&self, scene: &Scene) -> ManimlineResult<String> {
        if !scene.has_code() {
            return Err(ManimlineError::validation(format!("{} has no code", scene.id())));
        }
        if let v @ Validation::Invalid { .. } = self.validator.check(scene.code()) {
            return Err(ManimlineError::validation(format!("{}: {v}", scene.id())));
        }
        let body = construct_body(scene.code()).unwrap_or_else(|| dedent(scene.code()).0);
        let kept: Vec<String> = body
            .lines()
            .filter_map(|l| {
                let t = l.trim_start();
                if !MODULE_LEVEL_PREFIXES.iter().any(|p| t.starts_with(p)) {
                    return Some(l.to_owned());
                }
                let indent = &l[..l.len() - t.len()];
                (!indent.is_empty()).then(|| format!("{indent}pass"))
            })
            .collect();
        let body = kept.join("\n");
        if body.lines().all(|l| {
            let t = l.trim();
            t.is_empty() || t.starts_with('#')
        }) {
            return Ok("pass".to_owned());
        }
        Ok(body)
    }

    fn header(&self, three_d: bool) -> String {
        let background = presets::color_expr(&self.config.background).unwrap_or_else(|| {
            tracing::warn!(
                background = %self.config.background,
                "unknown background color; using BLACK"
            );
            "BLACK".to_owned()
        });
        let base = if three_d { "ThreeDScene" } else { "Scene" };
        format!(
            "from manim import *\nimport numpy as np\n\n\
             config.pixel_width = {}\nconfig.pixel_height = {}\nconfig.frame_rate = {}\n\
             config.background_color = {background}\n\n\n\
             class {CLASS_NAME}({base}):\n{HELPERS}",
            self.config.width.max(1),
            self.config.height.max(1),
            self.config.frame_rate.max(1),
        )
    }
}

fn uses_camera(body: &str) -> bool {
    CAMERA_METHODS
        .iter()
        .any(|m| body.contains(&format!("self.{m}(")))
}

fn write_scene_method(out: &mut String, scene: &Scene, body: &str) {
    let mut label = collapse_whitespace(scene.prompt());
    if let Some((cut, _)) = label.char_indices().nth(60) {
        label.truncate(cut);
    }
    let _ = writeln!(out, "\n    def scene_{}(self):", scene.id().0);
    let _ = writeln!(
        out,
        "        # [{}s, {}s) layer {} {}{}",
        py_num(scene.start_time()),
        py_num(scene.end_time()),
        scene.layer(),
        scene.visual_type(),
        if label.is_empty() {
            String::new()
        } else {
            format!(": {label}")
        }
    );
    for line in body.lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "        {line}");
        }
    }
}

fn write_construct(
    out: &mut String,
    placements: &[Placement],
    captions: &[CaptionCue],
    duration: f64,
) {
    let mut cues: Vec<(f64, Cue<'_>)> =
        Vec::with_capacity(placements.len() * 2 + captions.len() * 2);
    for p in placements {
        cues.push((p.start, Cue::Enter(p)));
        cues.push((p.end, Cue::Leave(p)));
    }
    for (i, c) in captions.iter().enumerate() {
        cues.push((c.start, Cue::ShowCaption(c)));
        // A caption replaced by the next one needs no separate hide.
        let replaced = captions
            .get(i + 1)
            .is_some_and(|next| next.start <= c.end + WAIT_EPS);
        if !replaced {
            cues.push((c.end, Cue::HideCaption));
        }
    }
    // Stable sort keeps placement order among entries; leaving beats entering at equal times.
    cues.sort_by(|(ta, a), (tb, b)| ta.total_cmp(tb).then_with(|| a.rank().cmp(&b.rank())));

    out.push_str("\n    def construct(self):\n        self._active = {}\n");
    if !captions.is_empty() {
        out.push_str("        self._caption = None\n");
    }
    let mut clock = 0.0_f64;
    for (t, cue) in &cues {
        if *t - clock > WAIT_EPS {
            let _ = writeln!(out, "        self._wait_until({})", py_num(*t));
            clock = *t;
        }
        match cue {
            Cue::Enter(p) => {
                let _ = writeln!(
                    out,
                    "        self._enter({id}, self.scene_{id}, {layer})",
                    id = p.scene.0,
                    layer = p.layer
                );
            }
            Cue::Leave(p) => {
                let _ = writeln!(out, "        self._leave({})", p.scene.0);
            }
            Cue::ShowCaption(c) => {
                let _ = writeln!(out, "        {}", captions::show_call(c));
            }
            Cue::HideCaption => out.push_str("        self._hide_caption()\n"),
        }
    }
    if duration - clock > WAIT_EPS {
        let _ = writeln!(out, "        self._wait_until({})", py_num(duration));
    }
}

/// Body of `def construct(self)` when `code` is a whole scene class rather than a fragment.
fn construct_body(code: &str) -> Option<String> {
    let lines: Vec<&str> = code.lines().collect();
    let def_at = lines
        .iter()
        .position(|l| l.trim_start().starts_with("def construct(self"))?;
    let indent = |l: &str| l.len() - l.trim_start().len();
    let def_indent = indent(lines[def_at]);
    let body: Vec<&str> = lines[def_at + 1..]
        .iter()
        .copied()
        .take_while(|l| l.trim().is_empty() || indent(l) > def_indent)
        .collect();
    let (text, _) = dedent(&body.join("\n"));
    let text = text.trim_matches('\n').to_owned();
    (!text.trim().is_empty()).then_some(text)
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/script.rs"]
mod tests;
