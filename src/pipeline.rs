//! One render request end to end: detect → merge → generate → compose → render.

use crate::assemble::plan::RenderPlan;
use crate::assemble::script::Assembler;
use crate::codegen::llm::OpenAiBackend;
use crate::codegen::style::StyleParams;
use crate::codegen::synth::{CodeSynthesizer, GeneratedCode};
use crate::config::PipelineConfig;
use crate::detect::auto::AutoDetector;
use crate::engine::backend::{RenderEngine, RenderOutput};
use crate::foundation::error::{ManimlineError, ManimlineResult};
use crate::scene::model::{Generator, Scene, SceneId};
use crate::scene::timeline::{MergeReport, Timeline};
use crate::transcript::word::WordStamp;
use rayon::prelude::*;
use std::sync::Arc;

/// Scheduling controls for code generation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineOpts {
    /// Generate scenes on a rayon pool when `true`.
    pub parallel: bool,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

/// Outcome of generating code for one scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneReport {
    pub scene: SceneId,
    /// Where the code came from; `None` when generation failed.
    pub source: Option<Generator>,
    /// Generator that first produced the code, seen through cache hits.
    pub origin: Option<Generator>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

impl SceneReport {
    /// `true` when the scene produced code.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything one [`Pipeline::run`] did.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineReport {
    /// Present when a transcript was merged.
    pub merge: Option<MergeReport>,
    /// One entry per scene that lacked code, in timeline order.
    pub scenes: Vec<SceneReport>,
    pub plan: RenderPlan,
    /// Present when a render engine is attached.
    pub output: Option<RenderOutput>,
}

/// Session object wiring detector, synthesizer, assembler and an optional render engine.
#[derive(Clone, Debug)]
pub struct Pipeline {
    detector: AutoDetector,
    synthesizer: CodeSynthesizer,
    assembler: Assembler,
    style: StyleParams,
    opts: PipelineOpts,
    engine: Option<Arc<dyn RenderEngine>>,
}

impl Pipeline {
    /// Pipeline with default detector, assembler and style around `synthesizer`.
    pub fn new(synthesizer: CodeSynthesizer) -> Self {
        Self {
            detector: AutoDetector::default(),
            synthesizer,
            assembler: Assembler::default(),
            style: StyleParams::default(),
            opts: PipelineOpts::default(),
            engine: None,
        }
    }

    /// Build every component from configuration.
    ///
    /// Opens the configured cache. The LLM backend is attached only when enabled and an API key
    /// is present in the configured environment variable.
    pub fn from_config(config: &PipelineConfig) -> ManimlineResult<Self> {
        config.validate()?;
        let cache = config.cache.open()?;
        let mut synthesizer = CodeSynthesizer::new(cache).with_llm_config(config.llm.clone());
        if let Some(backend) = OpenAiBackend::from_config(&config.llm)? {
            synthesizer = synthesizer.with_backend(Arc::new(backend));
        }
        if let Some(dir) = &config.data_dir {
            synthesizer = synthesizer.with_data_root(dir);
        }
        Ok(Self::new(synthesizer)
            .with_detector(AutoDetector::new(config.detector.clone()))
            .with_assembler(
                Assembler::new(config.render.clone()).with_captions(config.captions.clone()),
            )
            .with_style(config.style.clone())
            .with_opts(PipelineOpts {
                parallel: config.parallel,
                threads: config.threads,
            }))
    }

    /// Replace the transcript segmenter.
    pub fn with_detector(mut self, detector: AutoDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Replace the script composer and its render settings.
    pub fn with_assembler(mut self, assembler: Assembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Style applied to every generated scene.
    pub fn with_style(mut self, style: StyleParams) -> Self {
        self.style = style;
        self
    }

    /// Replace the run options.
    pub fn with_opts(mut self, opts: PipelineOpts) -> Self {
        self.opts = opts;
        self
    }

    /// Hand plans to `engine` after composing.
    pub fn with_engine(mut self, engine: Arc<dyn RenderEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Synthesizer used for scenes without code.
    pub fn synthesizer(&self) -> &CodeSynthesizer {
        &self.synthesizer
    }

    /// Current run options.
    pub fn opts(&self) -> &PipelineOpts {
        &self.opts
    }

    /// Segment `words` into candidates and merge them into `timeline`.
    ///
    /// Human-edited scenes are never touched.
    #[tracing::instrument(level = "info", skip_all, fields(words = words.len()))]
    pub fn detect(&self, timeline: &mut Timeline, words: &[WordStamp]) -> ManimlineResult<MergeReport> {
        let candidates = self.detector.detect(words);
        let report = timeline.merge(candidates)?;
        tracing::info!(
            accepted = report.accepted.len(),
            dropped = report.dropped,
            replaced = report.replaced.len(),
            "merged detected scenes"
        );
        Ok(report)
    }

    /// Generate code for every scene that has none and record it on the timeline.
    ///
    /// Results are applied in timeline order whether or not generation ran in parallel. When a
    /// scene fails, the successful results are still recorded and the first failure (in timeline
    /// order) is returned.
    #[tracing::instrument(level = "info", skip_all, fields(parallel = self.opts.parallel))]
    pub fn generate_missing(&self, timeline: &mut Timeline) -> ManimlineResult<Vec<SceneReport>> {
        let pending: Vec<Scene> = timeline.pending().cloned().collect();
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let results: Vec<ManimlineResult<GeneratedCode>> = if self.opts.parallel {
            let pool = build_thread_pool(self.opts.threads)?;
            pool.install(|| {
                pending
                    .par_iter()
                    .map(|scene| self.synthesizer.generate_for(scene, &self.style))
                    .collect()
            })
        } else {
            pending
                .iter()
                .map(|scene| self.synthesizer.generate_for(scene, &self.style))
                .collect()
        };

        let mut reports = Vec::with_capacity(pending.len());
        let mut first_err = None;
        for (scene, result) in pending.iter().zip(results) {
            match result {
                Ok(generated) => {
                    timeline.set_code(
                        scene.id(),
                        generated.code,
                        generated.source,
                        generated.warnings.clone(),
                    )?;
                    reports.push(SceneReport {
                        scene: scene.id(),
                        source: Some(generated.source),
                        origin: Some(generated.origin),
                        warnings: generated.warnings,
                        error: None,
                    });
                }
                Err(e) => {
                    reports.push(SceneReport {
                        scene: scene.id(),
                        source: None,
                        origin: None,
                        warnings: Vec::new(),
                        error: Some(e.to_string()),
                    });
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }

    /// Compose `timeline` into a render plan.
    pub fn assemble(&self, timeline: &Timeline) -> ManimlineResult<RenderPlan> {
        self.assembler.compose(timeline)
    }

    /// Run the whole request. `words`, when given, are detected and merged first and drive the
    /// caption overlay when captions are enabled.
    #[tracing::instrument(level = "info", skip_all, fields(scenes = timeline.len()))]
    pub fn run(
        &self,
        timeline: &mut Timeline,
        words: Option<&[WordStamp]>,
    ) -> ManimlineResult<PipelineReport> {
        let merge = match words {
            Some(words) => Some(self.detect(timeline, words)?),
            None => None,
        };
        let scenes = self.generate_missing(timeline)?;
        let plan = match words {
            Some(words) => self.assembler.compose_captioned(timeline, words)?,
            None => self.assemble(timeline)?,
        };
        let output = match &self.engine {
            Some(engine) => {
                tracing::info!(engine = engine.name(), "rendering");
                Some(engine.render(&plan)?)
            }
            None => None,
        };
        Ok(PipelineReport {
            merge,
            scenes,
            plan,
            output,
        })
    }
}

fn build_thread_pool(threads: Option<usize>) -> ManimlineResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(ManimlineError::validation(
            "pipeline 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        ManimlineError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}"))
    })
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
