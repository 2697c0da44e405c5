//! Scene data model and the reconciled timeline.
//!
//! The timeline is the only mutator of scene timing. Mutations are expressed as [`timeline::Edit`]
//! values applied by a pure `Timeline::apply`.

/// JSON boundary ingest and export.
pub mod document;
/// Undo/redo over timeline states.
pub mod history;
/// Scene types.
pub mod model;
/// Ordered scene collection and reconciliation.
pub mod timeline;
