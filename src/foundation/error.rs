/// Convenience result type used across manimline.
pub type ManimlineResult<T> = Result<T, ManimlineError>;

/// Pipeline stage in which a generation failure was detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Looking up a previously generated fragment.
    CacheLookup,
    /// Requesting a completion from the LLM backend.
    LlmAttempt,
    /// Deterministic template generation.
    RuleBasedFallback,
    /// Static validation of a candidate fragment.
    Validate,
    /// Persisting a validated fragment.
    CacheStore,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CacheLookup => "cache_lookup",
            Self::LlmAttempt => "llm_attempt",
            Self::RuleBasedFallback => "rule_based_fallback",
            Self::Validate => "validate",
            Self::CacheStore => "cache_store",
        };
        f.write_str(s)
    }
}

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum ManimlineError {
    /// Timeline or transcript input that could not be used as given.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Invalid caller-provided data or a broken timeline invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Code generation ended in the terminal `Failed` state.
    #[error("generation failed for {scene} at {stage}: {reason}")]
    GenerationFailed {
        /// Scene the request was made for (`-` for free-standing requests).
        scene: String,
        /// Stage that produced the failure.
        stage: Stage,
        /// Underlying reason.
        reason: String,
    },

    /// Nothing to assemble.
    #[error("timeline is empty: nothing to assemble")]
    TimelineEmpty,

    /// A cached value failed validation on replay.
    #[error("cache corruption for key {key}: {reason}")]
    CacheCorruption {
        /// Offending cache key.
        key: String,
        /// Validation failure that exposed the corruption.
        reason: String,
    },

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ManimlineError {
    /// Build a [`ManimlineError::MalformedInput`] value.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Build a [`ManimlineError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ManimlineError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`ManimlineError::GenerationFailed`] value.
    pub fn generation_failed(
        scene: impl Into<String>,
        stage: Stage,
        reason: impl Into<String>,
    ) -> Self {
        Self::GenerationFailed {
            scene: scene.into(),
            stage,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
