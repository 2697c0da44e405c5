use crate::assemble::captions::CaptionConfig;
use crate::assemble::plan::RenderConfig;
use crate::cache::content::{CacheTtls, ContentCache};
use crate::cache::store::FileStore;
use crate::codegen::llm::LlmConfig;
use crate::codegen::style::StyleParams;
use crate::detect::auto::DetectorOpts;
use crate::foundation::error::{ManimlineError, ManimlineResult};
use anyhow::Context as _;
use std::path::{Path, PathBuf};

/// Where cached results live and how long they stay valid.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory. `None` uses the platform cache dir (`~/.cache/manimline` on Linux).
    pub dir: Option<PathBuf>,
    /// Keep entries in memory only.
    pub in_memory: bool,
    pub ttls: CacheTtls,
}

impl CacheConfig {
    /// Open the configured cache.
    pub fn open(&self) -> ManimlineResult<ContentCache> {
        if self.in_memory {
            return Ok(ContentCache::in_memory().with_ttls(self.ttls));
        }
        let dir = match &self.dir {
            Some(d) => d.clone(),
            None => FileStore::default_dir().ok_or_else(|| {
                ManimlineError::validation("no platform cache directory; set cache.dir")
            })?,
        };
        Ok(ContentCache::new(FileStore::open(dir)?).with_ttls(self.ttls))
    }
}

/// Complete pipeline configuration. Every field has a default, so `{}` is a valid file.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub detector: DetectorOpts,
    pub llm: LlmConfig,
    pub cache: CacheConfig,
    pub render: RenderConfig,
    pub style: StyleParams,
    pub captions: CaptionConfig,
    /// Directory relative scene data sources resolve against. Unset means the working directory.
    pub data_dir: Option<PathBuf>,
    /// Generate scene code on a worker pool.
    pub parallel: bool,
    /// Explicit worker count for parallel generation.
    pub threads: Option<usize>,
}

impl PipelineConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> ManimlineResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| ManimlineError::serde(format!("pipeline config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> ManimlineResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        Self::from_json(&json)
    }

    /// Reject thresholds, sizes and rates the pipeline cannot work with.
    pub fn validate(&self) -> ManimlineResult<()> {
        let d = &self.detector;
        if !(d.pause_threshold.is_finite() && d.pause_threshold >= 0.0) {
            return Err(ManimlineError::validation(
                "detector.pause_threshold must be finite and >= 0",
            ));
        }
        if !(d.max_scene_len.is_finite() && d.max_scene_len > 0.0) {
            return Err(ManimlineError::validation(
                "detector.max_scene_len must be finite and > 0",
            ));
        }
        if self.threads == Some(0) {
            return Err(ManimlineError::validation("threads must be >= 1 when set"));
        }
        if self.llm.timeout_ms == 0 {
            return Err(ManimlineError::validation("llm.timeout_ms must be non-zero"));
        }
        if self.render.width == 0 || self.render.height == 0 || self.render.frame_rate == 0 {
            return Err(ManimlineError::validation(
                "render width/height/frame_rate must be non-zero",
            ));
        }
        self.captions.validate()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
