//! Render collaborators consuming a [`RenderPlan`](crate::RenderPlan).

/// Engine trait, outputs and the dry-run engine.
pub mod backend;
/// Engine spawning the `manim` command-line tool.
pub mod manim_cli;
