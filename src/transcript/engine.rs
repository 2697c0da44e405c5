use crate::cache::content::ContentCache;
use crate::cache::key::transcription_key;
use crate::foundation::error::ManimlineResult;
use crate::transcript::word::WordStamp;
use anyhow::Context as _;
use std::path::Path;

/// Speech-to-text collaborator producing word-level timestamps.
pub trait TranscriptionEngine: Send + Sync + std::fmt::Debug {
    /// Model identifier; part of the transcription cache key.
    fn model(&self) -> &str;

    /// Transcribe raw audio bytes.
    fn transcribe(&self, audio: &[u8], language: &str) -> ManimlineResult<Vec<WordStamp>>;
}

/// Engine wrapper that replays transcripts keyed on audio bytes, model and language.
#[derive(Debug)]
pub struct CachedTranscriber<E> {
    engine: E,
    cache: ContentCache,
}

impl<E: TranscriptionEngine> CachedTranscriber<E> {
    /// Wrap `engine`, storing results in `cache`.
    pub fn new(engine: E, cache: ContentCache) -> Self {
        Self { engine, cache }
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Read `path` and transcribe its bytes.
    pub fn transcribe_path(
        &self,
        path: impl AsRef<Path>,
        language: &str,
    ) -> ManimlineResult<Vec<WordStamp>> {
        let path = path.as_ref();
        let audio =
            std::fs::read(path).with_context(|| format!("read audio {}", path.display()))?;
        self.transcribe(&audio, language)
    }
}

impl<E: TranscriptionEngine> TranscriptionEngine for CachedTranscriber<E> {
    fn model(&self) -> &str {
        self.engine.model()
    }

    #[tracing::instrument(level = "debug", skip(self, audio), fields(bytes = audio.len(), model = self.engine.model()))]
    fn transcribe(&self, audio: &[u8], language: &str) -> ManimlineResult<Vec<WordStamp>> {
        let key = transcription_key(audio, self.engine.model(), language);
        if let Some(value) = self.cache.get(&key) {
            match serde_json::from_value::<Vec<WordStamp>>(value) {
                Ok(words) => {
                    tracing::debug!(words = words.len(), "transcript cache hit");
                    return Ok(words);
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "discarding unreadable cached transcript");
                    self.cache.invalidate(&key);
                }
            }
        }

        let words = self.engine.transcribe(audio, language)?;
        tracing::info!(words = words.len(), "transcribed audio");
        match serde_json::to_value(&words) {
            Ok(value) => {
                if let Err(e) = self.cache.put(&key, value, self.cache.ttls().transcription_ms) {
                    tracing::warn!(key = %key, error = %e, "failed to store transcript");
                }
            }
            Err(e) => tracing::warn!(error = %e, "transcript not serializable; not cached"),
        }
        Ok(words)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transcript/engine.rs"]
mod tests;
