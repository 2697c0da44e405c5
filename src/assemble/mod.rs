//! Composition of a timeline into one Manim script plus timing metadata.

/// Caption cues and their script helpers.
pub mod captions;
/// Placements, composite segments and the render plan.
pub mod plan;
/// Script emission.
pub mod script;
