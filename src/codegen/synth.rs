//! Fallback chain turning a prompt into a validated fragment.
//!
//! Each request walks an explicit state machine:
//!
//! ```text
//! CacheLookup ──hit──▶ Replay ──ok──▶ Done
//!      │miss          │invalid: invalidate entry, regenerate
//!      ▼              ▼
//! LlmAttempt ──text──▶ Validate(llm) ──ok──▶ CacheStore ──▶ Done
//!      │error / none           │invalid
//!      ▼                       ▼
//! RuleBasedFallback ──▶ Validate(rule_based) ──ok──▶ CacheStore ──▶ Done
//!                              │invalid
//!                              ▼
//!                           Failed
//! ```

use crate::cache::content::ContentCache;
use crate::cache::key::{CacheKey, code_gen_key_with_data};
use crate::codegen::data::DataTable;
use crate::codegen::llm::{self, LlmBackend, LlmConfig, LlmError, LlmRequest};
use crate::codegen::style::StyleParams;
use crate::codegen::templates;
use crate::codegen::validate::{CodeValidator, Validation};
use crate::foundation::error::{ManimlineError, ManimlineResult, Stage};
use crate::scene::model::{Generator, Scene, VisualType};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// A validated fragment and where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedCode {
    pub code: String,
    pub source: Generator,
    /// Generator that first produced the code. Differs from `source` only on cache hits.
    pub origin: Generator,
    /// Validator warnings plus the reasons for any fallback taken.
    pub warnings: Vec<String>,
}

/// Code cache payload: the fragment, its generator and the fallback notes recorded with it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CachedCode {
    pub code: String,
    pub source: Generator,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Cache → LLM → templates, with every result validated.
///
/// Cloning shares the cache and backend.
#[derive(Clone, Debug)]
pub struct CodeSynthesizer {
    cache: ContentCache,
    backend: Option<Arc<dyn LlmBackend>>,
    llm: LlmConfig,
    validator: CodeValidator,
    data_root: Option<PathBuf>,
}

enum Step {
    CacheLookup,
    LlmAttempt,
    RuleBasedFallback,
    Replay(CachedCode),
    Validate(String, Generator),
    CacheStore(GeneratedCode, Vec<String>),
}

impl CodeSynthesizer {
    /// Synthesizer without an LLM backend.
    pub fn new(cache: ContentCache) -> Self {
        Self {
            cache,
            backend: None,
            llm: LlmConfig::default(),
            validator: CodeValidator::new(),
            data_root: None,
        }
    }

    /// Use `backend` before falling back to templates.
    pub fn with_backend(mut self, backend: Arc<dyn LlmBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Request parameters (temperature, token limit) passed to the backend.
    pub fn with_llm_config(mut self, config: LlmConfig) -> Self {
        self.llm = config;
        self
    }

    /// Replace the validator every result is checked with.
    pub fn with_validator(mut self, validator: CodeValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Resolve relative scene data sources against `root` instead of the working directory.
    pub fn with_data_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.data_root = Some(root.into());
        self
    }

    /// Cache shared with every clone.
    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Whether an LLM backend is configured.
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Generate code for a scene's prompt and visual type, plotting its data source if it has one.
    ///
    /// A data source that cannot be loaded fails the scene.
    pub fn generate_for(&self, scene: &Scene, style: &StyleParams) -> ManimlineResult<GeneratedCode> {
        let data = match scene.data_source() {
            Some(source) => Some(DataTable::load(self.resolve_data(source))?),
            None => None,
        };
        self.run(
            &scene.id().to_string(),
            scene.prompt(),
            scene.visual_type(),
            style,
            data.as_ref(),
        )
    }

    /// Generate code for a free-standing prompt.
    pub fn generate(
        &self,
        prompt: &str,
        visual_type: VisualType,
        style: &StyleParams,
    ) -> ManimlineResult<GeneratedCode> {
        self.run("-", prompt, visual_type, style, None)
    }

    /// Generate code for a free-standing prompt over `data`.
    pub fn generate_with_data(
        &self,
        prompt: &str,
        visual_type: VisualType,
        style: &StyleParams,
        data: &DataTable,
    ) -> ManimlineResult<GeneratedCode> {
        self.run("-", prompt, visual_type, style, Some(data))
    }

    fn resolve_data(&self, source: &str) -> PathBuf {
        let path = Path::new(source.trim());
        match &self.data_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    #[tracing::instrument(
        level = "debug",
        skip(self, prompt, visual_type, style, data),
        fields(visual_type = %visual_type, data_rows = data.map(DataTable::len))
    )]
    fn run(
        &self,
        scene: &str,
        prompt: &str,
        visual_type: VisualType,
        style: &StyleParams,
        data: Option<&DataTable>,
    ) -> ManimlineResult<GeneratedCode> {
        let digest = data.map(DataTable::digest);
        let key = code_gen_key_with_data(prompt, visual_type, style, digest.as_deref());
        let mut notes: Vec<String> = Vec::new();
        let mut step = Step::CacheLookup;

        loop {
            step = match step {
                Step::CacheLookup => match self.cache.get(&key) {
                    None => Step::LlmAttempt,
                    Some(value) => match decode_cached(value) {
                        Ok(record) => {
                            tracing::debug!(key = %key, origin = %record.source, "code cache hit");
                            Step::Replay(record)
                        }
                        Err(reason) => {
                            self.discard_corrupt(&key, &reason);
                            Step::LlmAttempt
                        }
                    },
                },

                Step::Replay(record) => match self.validator.check(&record.code) {
                    Validation::Valid { mut warnings } => {
                        warnings.extend(record.notes);
                        return Ok(GeneratedCode {
                            code: record.code,
                            source: Generator::Cache,
                            origin: record.source,
                            warnings,
                        });
                    }
                    invalid => {
                        self.discard_corrupt(&key, &invalid.to_string());
                        Step::LlmAttempt
                    }
                },

                Step::LlmAttempt => match &self.backend {
                    None => Step::RuleBasedFallback,
                    Some(backend) => {
                        let mut request = llm::generate_request(prompt, visual_type, style, &self.llm);
                        if let Some(table) = data {
                            request = request.with_data(table);
                        }
                        match complete_with_retry(backend.as_ref(), &request) {
                            Ok(text) => Step::Validate(llm::extract_code_block(&text), Generator::Llm),
                            Err(e) => {
                                tracing::warn!(
                                    scene,
                                    backend = backend.name(),
                                    error = %e,
                                    "LLM generation failed; using rule-based templates"
                                );
                                notes.push(format!("llm unavailable: {e}"));
                                Step::RuleBasedFallback
                            }
                        }
                    }
                },

                Step::RuleBasedFallback => Step::Validate(
                    templates::rule_based_with_data(prompt, visual_type, style, data),
                    Generator::RuleBased,
                ),

                Step::Validate(code, source) => match self.validator.check(&code) {
                    Validation::Valid { mut warnings } => {
                        warnings.extend(notes.iter().cloned());
                        let generated = GeneratedCode {
                            code,
                            source,
                            origin: source,
                            warnings,
                        };
                        Step::CacheStore(generated, std::mem::take(&mut notes))
                    }
                    invalid => match source {
                        Generator::Llm => {
                            tracing::warn!(scene, reason = %invalid, "LLM output rejected by validator");
                            notes.push(format!("llm output rejected: {invalid}"));
                            Step::RuleBasedFallback
                        }
                        Generator::RuleBased | Generator::Manual | Generator::Cache => {
                            let err = ManimlineError::generation_failed(
                                scene,
                                Stage::Validate,
                                format!("rule-based output invalid: {invalid}"),
                            );
                            tracing::error!(
                                scene,
                                prompt,
                                %visual_type,
                                code = %code,
                                error = %err,
                                "template output failed validation"
                            );
                            return Err(err);
                        }
                    },
                },

                Step::CacheStore(generated, notes) => {
                    let record = CachedCode {
                        code: generated.code.clone(),
                        source: generated.source,
                        notes,
                    };
                    let stored = serde_json::to_value(&record)
                        .map_err(|e| ManimlineError::serde(format!("encode cached code: {e}")))
                        .and_then(|value| self.cache.put(&key, value, self.cache.ttls().code_gen_ms));
                    if let Err(e) = stored {
                        tracing::warn!(key = %key, error = %e, "failed to store generated code");
                    }
                    tracing::info!(scene, source = %generated.source, "code generated");
                    return Ok(generated);
                }
            };
        }
    }

    /// Rework `code` according to `feedback`.
    ///
    /// Uses the backend when present and falls back to keyword rules (recolor, resize, retime).
    /// Refinements are validated but not cached.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn refine(&self, prompt: &str, code: &str, feedback: &str) -> ManimlineResult<GeneratedCode> {
        let mut notes = Vec::new();
        if let Some(backend) = &self.backend {
            let request = llm::refine_request(prompt, code, feedback, &self.llm);
            match complete_with_retry(backend.as_ref(), &request) {
                Ok(text) => {
                    let refined = llm::extract_code_block(&text);
                    match self.validator.check(&refined) {
                        Validation::Valid { mut warnings } => {
                            warnings.append(&mut notes);
                            return Ok(GeneratedCode {
                                code: refined,
                                source: Generator::Llm,
                                origin: Generator::Llm,
                                warnings,
                            });
                        }
                        invalid => notes.push(format!("llm output rejected: {invalid}")),
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "LLM refinement failed; using rules");
                    notes.push(format!("llm unavailable: {e}"));
                }
            }
        }

        let refined = templates::refine_with_rules(code, feedback);
        match self.validator.check(&refined) {
            Validation::Valid { mut warnings } => {
                warnings.append(&mut notes);
                Ok(GeneratedCode {
                    code: refined,
                    source: Generator::RuleBased,
                    origin: Generator::RuleBased,
                    warnings,
                })
            }
            invalid => Err(ManimlineError::generation_failed(
                "-",
                Stage::RuleBasedFallback,
                format!("refined code invalid: {invalid}"),
            )),
        }
    }

    fn discard_corrupt(&self, key: &CacheKey, reason: &str) {
        let err = ManimlineError::CacheCorruption {
            key: key.to_string(),
            reason: reason.to_owned(),
        };
        self.cache.invalidate(key);
        tracing::warn!(error = %err, "discarding cached code; regenerating");
    }
}

/// One call plus at most one retry when the failure is transient.
///
/// The retry gets only what is left of `request.timeout`, so both calls together stay within it.
fn complete_with_retry(backend: &dyn LlmBackend, request: &LlmRequest) -> Result<String, LlmError> {
    let started = Instant::now();
    let err = match backend.complete(request) {
        Err(e) if e.is_transient() => e,
        other => return other,
    };
    let mut retry = request.clone();
    if let Some(budget) = request.timeout {
        let left = budget.saturating_sub(started.elapsed());
        if left.is_zero() {
            tracing::debug!(backend = backend.name(), error = %err, "request budget spent; not retrying");
            return Err(err);
        }
        retry.timeout = Some(left);
    }
    tracing::debug!(backend = backend.name(), error = %err, "retrying LLM request once");
    backend.complete(&retry)
}

/// Decode a cached record, describing why it is unusable otherwise.
fn decode_cached(value: serde_json::Value) -> Result<CachedCode, String> {
    if !value.is_object() {
        return Err(format!("unexpected {} payload", json_kind(&value)));
    }
    let record: CachedCode =
        serde_json::from_value(value).map_err(|e| format!("malformed cache record: {e}"))?;
    if matches!(record.source, Generator::Cache | Generator::Manual) {
        return Err(format!("cache record claims source '{}'", record.source));
    }
    Ok(record)
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codegen/synth.rs"]
mod tests;
