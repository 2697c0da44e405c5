//! manimline turns a timeline of visual intents into one renderable Manim script.
//!
//! Scenes come from hand edits, from transcripts segmented by the [`AutoDetector`], or both;
//! the [`Timeline`] reconciles them without clobbering human edits. Scenes lacking code are
//! filled by the [`CodeSynthesizer`] (cache, then LLM, then deterministic templates, every
//! result statically validated) and the [`Assembler`] composes the final [`RenderPlan`].
//!
//! - Build or ingest a [`Timeline`]
//! - Create a [`Pipeline`] (directly or from a [`PipelineConfig`])
//! - [`Pipeline::run`] it, optionally handing the plan to a [`RenderEngine`]
#![forbid(unsafe_code)]

mod foundation;

/// Composition of timelines into scripts and render plans.
pub mod assemble;
/// Content-addressed result cache.
pub mod cache;
/// Code synthesis and static validation.
pub mod codegen;
pub mod config;
/// Transcript segmentation.
pub mod detect;
/// Render engine collaborators.
pub mod engine;
pub mod pipeline;
pub mod scene;
/// Word-level transcripts and transcription engines.
pub mod transcript;

pub use crate::foundation::core::{DEFAULT_SCENE_SECS, MIN_SCENE_SECS, TimeSpan};
pub use crate::foundation::error::{ManimlineError, ManimlineResult, Stage};

pub use crate::assemble::captions::{CaptionConfig, CaptionCue, CaptionPosition, CaptionStyle};
pub use crate::assemble::plan::{Placement, RenderConfig, RenderPlan, Segment};
pub use crate::assemble::script::Assembler;
pub use crate::cache::content::{CacheTtls, ContentCache};
pub use crate::codegen::data::DataTable;
pub use crate::codegen::style::StyleParams;
pub use crate::codegen::synth::{CodeSynthesizer, GeneratedCode};
pub use crate::codegen::validate::{CodeValidator, Validation};
pub use crate::config::PipelineConfig;
pub use crate::detect::auto::{AutoDetector, DetectorOpts};
pub use crate::engine::backend::{RenderEngine, RenderOutput};
pub use crate::pipeline::{Pipeline, PipelineOpts, PipelineReport, SceneReport};
pub use crate::scene::model::{Generator, Scene, SceneDraft, SceneId, TimeEdge, VisualType};
pub use crate::scene::timeline::{Edit, EditOutcome, MergeReport, Timeline};
pub use crate::transcript::word::WordStamp;
