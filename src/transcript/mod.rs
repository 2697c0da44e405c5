//! Word-level transcripts: the stamp type, whisper JSON parsing and cached engines.

/// Transcription engines and the caching wrapper.
pub mod engine;
/// Timestamped words.
pub mod word;
