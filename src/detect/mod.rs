//! Scene candidates derived from transcripts or fixed time grids.

/// Pause, length and punctuation based segmentation.
pub mod auto;
