//! Manim code synthesis: fallback chain, templates and static validation.

/// CSV and JSON tables for data-driven templates.
pub mod data;
/// LLM backend trait and the chat-completions client.
pub mod llm;
/// Colors, easings and shape constructors shared by the templates.
pub mod presets;
pub(crate) mod pylex;
pub(crate) mod pyparse;
/// Style parameters.
pub mod style;
/// Cache → LLM → template state machine.
pub mod synth;
/// Deterministic rule-based generator.
pub mod templates;
/// Static fragment and script checks.
pub mod validate;
