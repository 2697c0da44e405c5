use crate::foundation::core::TimeSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timeline-unique scene identifier. Never reused within a session.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct SceneId(pub u64);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene {}", self.0)
    }
}

/// Visual intent tag. Drives template selection in the rule-based generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisualType {
    /// Pick a template from keywords in the prompt.
    #[default]
    Auto,
    /// Vector field / stream lines.
    VectorField,
    /// Axes with plotted series.
    TimeSeries,
    /// Points in 3D axes.
    Scatter3d,
    /// Node/edge network.
    Graph,
    /// Particle cloud.
    Particles,
    /// Shape, color and motion inferred from the prompt.
    Custom,
}

impl VisualType {
    /// Every variant, in declaration order.
    pub const ALL: [VisualType; 7] = [
        Self::Auto,
        Self::VectorField,
        Self::TimeSeries,
        Self::Scatter3d,
        Self::Graph,
        Self::Particles,
        Self::Custom,
    ];

    /// Stable wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::VectorField => "vector_field",
            Self::TimeSeries => "time_series",
            Self::Scatter3d => "scatter3d",
            Self::Graph => "graph",
            Self::Particles => "particles",
            Self::Custom => "custom",
        }
    }

    /// Parse a wire name. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s.trim())
    }

    /// Whether fragments of this type need a 3D scene base class.
    pub fn needs_3d(self) -> bool {
        matches!(self, Self::Scatter3d)
    }
}

impl fmt::Display for VisualType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a scene's current code came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generator {
    /// Replayed from the content cache.
    Cache,
    /// Produced by the LLM backend.
    Llm,
    /// Produced by the deterministic templates.
    RuleBased,
    /// Written or pasted by a person.
    Manual,
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cache => "cache",
            Self::Llm => "llm",
            Self::RuleBased => "rule_based",
            Self::Manual => "manual",
        };
        f.write_str(s)
    }
}

/// Which edge of a scene an [`update_time`](crate::Timeline::update_time) call moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeEdge {
    /// In point.
    Start,
    /// Out point.
    End,
}

/// A time-boxed unit carrying a visual intent and a composition layer.
///
/// Scenes are owned by a [`Timeline`](crate::Timeline); only the timeline mutates timing.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub(crate) id: SceneId,
    pub(crate) span: TimeSpan,
    pub(crate) prompt: String,
    pub(crate) visual_type: VisualType,
    pub(crate) code: String,
    pub(crate) auto_generated: bool,
    pub(crate) layer: i32,
    pub(crate) generator: Option<Generator>,
    pub(crate) notes: Vec<String>,
    pub(crate) data_source: Option<String>,
}

impl Scene {
    /// Scene id.
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// In point in seconds.
    pub fn start_time(&self) -> f64 {
        self.span.start
    }

    /// Out point in seconds.
    pub fn end_time(&self) -> f64 {
        self.span.end
    }

    /// Time span covered by the scene.
    pub fn span(&self) -> TimeSpan {
        self.span
    }

    /// Scene duration in seconds.
    pub fn duration(&self) -> f64 {
        self.span.len_secs()
    }

    /// Free-text visual description.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Visual intent tag.
    pub fn visual_type(&self) -> VisualType {
        self.visual_type
    }

    /// Animation fragment; empty while pending generation.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Return `true` when the scene carries non-blank code.
    pub fn has_code(&self) -> bool {
        !self.code.trim().is_empty()
    }

    /// `false` once a person has touched the scene.
    pub fn auto_generated(&self) -> bool {
        self.auto_generated
    }

    /// Composition z-order; higher layers are painted on top.
    pub fn layer(&self) -> i32 {
        self.layer
    }

    /// Provenance of the current code, if known.
    pub fn generator(&self) -> Option<Generator> {
        self.generator
    }

    /// Warning annotations left by the pipeline.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// CSV or JSON file plotted by data-driven templates, as written in the timeline.
    pub fn data_source(&self) -> Option<&str> {
        self.data_source.as_deref()
    }
}

/// Scene parameters before the timeline assigns an id.
///
/// Also used for auto-detected candidates, which always carry a span.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneDraft {
    pub(crate) span: Option<TimeSpan>,
    pub(crate) prompt: String,
    pub(crate) visual_type: VisualType,
    pub(crate) code: String,
    pub(crate) layer: i32,
    pub(crate) auto_generated: bool,
    pub(crate) data_source: Option<String>,
}

impl SceneDraft {
    /// Start a draft with the given prompt and no explicit timing.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Auto-detected candidate spanning `span`.
    pub fn candidate(span: TimeSpan, prompt: impl Into<String>) -> Self {
        Self {
            span: Some(span),
            prompt: prompt.into(),
            auto_generated: true,
            ..Self::default()
        }
    }

    /// Set explicit timing.
    pub fn span(mut self, span: TimeSpan) -> Self {
        self.span = Some(span);
        self
    }

    /// Set the visual type.
    pub fn visual_type(mut self, visual_type: VisualType) -> Self {
        self.visual_type = visual_type;
        self
    }

    /// Provide code up front.
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Set the composition layer.
    pub fn layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    /// Plot the table at `path` (CSV or JSON) when generating code.
    pub fn data_source(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.data_source = (!path.trim().is_empty()).then_some(path);
        self
    }

    /// Mark the draft as produced by the pipeline.
    pub fn auto_generated(mut self, auto_generated: bool) -> Self {
        self.auto_generated = auto_generated;
        self
    }

    /// Explicit span, if any.
    pub fn timing(&self) -> Option<TimeSpan> {
        self.span
    }

    /// Prompt text.
    pub fn prompt_text(&self) -> &str {
        &self.prompt
    }
}

/// JSON boundary form of one scene. Unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SceneDef {
    #[serde(default)]
    pub(crate) id: Option<u64>,
    #[serde(default)]
    pub(crate) start_time: f64,
    #[serde(default)]
    pub(crate) end_time: f64,
    #[serde(default)]
    pub(crate) prompt: String,
    #[serde(default = "default_visual_type")]
    pub(crate) visual_type: String,
    #[serde(default)]
    pub(crate) manim_code: String,
    #[serde(default)]
    pub(crate) auto_generated: bool,
    #[serde(default)]
    pub(crate) layer: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) generator: Option<Generator>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) data_source: Option<String>,
}

fn default_visual_type() -> String {
    VisualType::Auto.as_str().to_owned()
}

impl From<&Scene> for SceneDef {
    fn from(s: &Scene) -> Self {
        Self {
            id: Some(s.id.0),
            start_time: s.span.start,
            end_time: s.span.end,
            prompt: s.prompt.clone(),
            visual_type: s.visual_type.as_str().to_owned(),
            manim_code: s.code.clone(),
            auto_generated: s.auto_generated,
            layer: s.layer,
            generator: s.generator,
            notes: s.notes.clone(),
            data_source: s.data_source.clone(),
        }
    }
}

/// JSON boundary form of a timeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct TimelineDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) audio_duration: Option<f64>,
    #[serde(default)]
    pub(crate) scenes: Vec<serde_json::Value>,
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
