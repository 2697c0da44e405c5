use crate::assemble::captions::CaptionCue;
use crate::scene::model::{Scene, SceneId};

/// Output settings written into the script header.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    /// Manim color name or `#rrggbb`.
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            frame_rate: 30,
            background: "#000000".to_owned(),
        }
    }
}

/// Where one scene sits in the composed output.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    pub scene: SceneId,
    pub start: f64,
    pub end: f64,
    pub layer: i32,
}

/// Interval between consecutive scene boundaries and the scenes visible in it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    /// Active scenes, lowest layer first (painted first).
    pub scenes: Vec<SceneId>,
}

/// Everything a render engine needs for one request.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderPlan {
    /// Composed Manim script.
    pub script: String,
    /// Name of the `Scene` subclass to render.
    pub class_name: String,
    /// Placements ordered by `(start, layer, id)`.
    pub placements: Vec<Placement>,
    pub segments: Vec<Segment>,
    /// Total output length in seconds.
    pub duration: f64,
    pub config: RenderConfig,
    /// Caption cues drawn over the composition, ordered by start.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub captions: Vec<CaptionCue>,
}

impl RenderPlan {
    /// Scene ids visible at `t`, lowest layer first.
    pub fn active_at(&self, t: f64) -> &[SceneId] {
        self.segments
            .iter()
            .find(|s| s.start <= t && t < s.end)
            .map(|s| s.scenes.as_slice())
            .unwrap_or_default()
    }
}

pub(crate) fn placements(scenes: &[Scene]) -> Vec<Placement> {
    let mut out: Vec<Placement> = scenes
        .iter()
        .map(|s| Placement {
            scene: s.id(),
            start: s.start_time(),
            end: s.end_time(),
            layer: s.layer(),
        })
        .collect();
    out.sort_by(|a, b| {
        a.start
            .total_cmp(&b.start)
            .then(a.layer.cmp(&b.layer))
            .then(a.scene.cmp(&b.scene))
    });
    out
}

/// Split the covered time into intervals between consecutive boundaries.
pub(crate) fn segments(placements: &[Placement]) -> Vec<Segment> {
    let mut bounds: Vec<f64> = placements.iter().flat_map(|p| [p.start, p.end]).collect();
    bounds.sort_by(f64::total_cmp);
    bounds.dedup();

    let mut out = Vec::new();
    for w in bounds.windows(2) {
        let (start, end) = (w[0], w[1]);
        let mut active: Vec<&Placement> = placements
            .iter()
            .filter(|p| p.start <= start && end <= p.end)
            .collect();
        if active.is_empty() {
            continue;
        }
        active.sort_by_key(|p| (p.layer, p.scene));
        out.push(Segment {
            start,
            end,
            scenes: active.into_iter().map(|p| p.scene).collect(),
        });
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/plan.rs"]
mod tests;
