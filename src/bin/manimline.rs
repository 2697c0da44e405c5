use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use manimline::engine::manim_cli::{ManimCliEngine, Quality};
use manimline::transcript::word::read_transcript;
use manimline::{
    Assembler, CaptionStyle, AutoDetector, CodeValidator, Pipeline, PipelineConfig, RenderEngine as _, RenderOutput,
    Timeline,
};

#[derive(Parser, Debug)]
#[command(name = "manimline", version)]
struct Cli {
    /// Pipeline configuration JSON. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Segment a transcript into scenes and merge them into a timeline.
    Detect(DetectArgs),
    /// Generate code for every scene that has none.
    Generate(GenerateArgs),
    /// Compose a timeline into a Manim script (optionally rendering it).
    Assemble(AssembleArgs),
    /// Statically check a fragment or a full script.
    Validate(ValidateArgs),
    /// Inspect or clear the result cache.
    Cache {
        #[command(subcommand)]
        cmd: CacheCommand,
    },
}

#[derive(Parser, Debug)]
struct DetectArgs {
    /// Word-level transcript JSON (plain array or whisper-style verbose JSON).
    #[arg(long)]
    transcript: PathBuf,

    /// Existing timeline to merge into. Starts empty when omitted.
    #[arg(long)]
    timeline: Option<PathBuf>,

    /// Output timeline JSON.
    #[arg(long)]
    out: PathBuf,

    /// Pause (seconds) that starts a new scene.
    #[arg(long)]
    pause_threshold: Option<f64>,

    /// Longest scene (seconds).
    #[arg(long)]
    max_scene_len: Option<f64>,

    /// Do not close scenes at sentence punctuation.
    #[arg(long, default_value_t = false)]
    no_punctuation: bool,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Input timeline JSON.
    #[arg(long)]
    timeline: PathBuf,

    /// Output timeline JSON. Defaults to rewriting the input.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Never call the LLM backend.
    #[arg(long, default_value_t = false)]
    no_llm: bool,

    /// Generate scenes in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct AssembleArgs {
    /// Input timeline JSON; every scene must have code.
    #[arg(long)]
    timeline: PathBuf,

    /// Output Python script.
    #[arg(long)]
    script: PathBuf,

    /// Also write the render plan JSON here.
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Render with `manim` into this directory (requires `manim` on PATH).
    #[arg(long)]
    render: Option<PathBuf>,

    /// Render quality.
    #[arg(long, value_enum, default_value_t = QualityChoice::Low)]
    quality: QualityChoice,

    /// Transcript JSON to caption the output with.
    #[arg(long)]
    captions: Option<PathBuf>,

    /// Caption grouping; overrides the config file.
    #[arg(long, value_enum)]
    caption_style: Option<CaptionStyleChoice>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Fragment or script file.
    path: PathBuf,

    /// Check as a complete script (import, Scene subclass, construct).
    #[arg(long, default_value_t = false)]
    script: bool,

    /// Treat missing Manim vocabulary as an error.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Print entry count, size and location.
    Stats,
    /// Remove every entry.
    Clear,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum QualityChoice {
    Low,
    Medium,
    High,
    Production,
    FourK,
}

impl From<QualityChoice> for Quality {
    fn from(q: QualityChoice) -> Self {
        match q {
            QualityChoice::Low => Quality::Low,
            QualityChoice::Medium => Quality::Medium,
            QualityChoice::High => Quality::High,
            QualityChoice::Production => Quality::Production,
            QualityChoice::FourK => Quality::FourK,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CaptionStyleChoice {
    WordByWord,
    Sentence,
    Hybrid,
}

impl From<CaptionStyleChoice> for CaptionStyle {
    fn from(c: CaptionStyleChoice) -> Self {
        match c {
            CaptionStyleChoice::WordByWord => CaptionStyle::WordByWord,
            CaptionStyleChoice::Sentence => CaptionStyle::Sentence,
            CaptionStyleChoice::Hybrid => CaptionStyle::Hybrid,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };

    match cli.cmd {
        Command::Detect(args) => cmd_detect(config, args),
        Command::Generate(args) => cmd_generate(config, args),
        Command::Assemble(args) => cmd_assemble(config, args),
        Command::Validate(args) => cmd_validate(args),
        Command::Cache { cmd } => cmd_cache(config, cmd),
    }
}

fn load_timeline(path: &Path) -> anyhow::Result<Timeline> {
    let ingested = Timeline::ingest_path(path)?;
    for condition in &ingested.conditions {
        tracing::warn!(file = %path.display(), "{condition}");
    }
    if ingested.is_malformed() {
        anyhow::bail!("'{}' is not a timeline document", path.display());
    }
    Ok(ingested.timeline)
}

fn cmd_detect(mut config: PipelineConfig, args: DetectArgs) -> anyhow::Result<()> {
    if let Some(v) = args.pause_threshold {
        config.detector.pause_threshold = v;
    }
    if let Some(v) = args.max_scene_len {
        config.detector.max_scene_len = v;
    }
    if args.no_punctuation {
        config.detector.split_on_punctuation = false;
    }
    config.validate()?;

    let words = read_transcript(&args.transcript)?;
    let mut timeline = match &args.timeline {
        Some(path) => load_timeline(path)?,
        None => Timeline::new(),
    };
    let candidates = AutoDetector::new(config.detector).detect(&words);
    let report = timeline.merge(candidates)?;
    timeline.write_path(&args.out)?;

    eprintln!(
        "accepted {}, dropped {}, replaced {}; wrote {}",
        report.accepted.len(),
        report.dropped,
        report.replaced.len(),
        args.out.display()
    );
    Ok(())
}

fn cmd_generate(mut config: PipelineConfig, args: GenerateArgs) -> anyhow::Result<()> {
    if args.no_llm {
        config.llm.enabled = false;
    }
    config.parallel |= args.parallel;
    if args.threads.is_some() {
        config.threads = args.threads;
    }

    let mut timeline = load_timeline(&args.timeline)?;
    if config.data_dir.is_none() {
        config.data_dir = args.timeline.parent().map(Path::to_path_buf);
    }
    let pipeline = Pipeline::from_config(&config)?;
    let reports = pipeline.generate_missing(&mut timeline)?;
    for r in &reports {
        let source = match (r.source, r.origin) {
            (Some(s), Some(o)) if s != o => format!("{s} ({o})"),
            (Some(s), _) => s.to_string(),
            (None, _) => String::new(),
        };
        eprintln!("{}: {source}", r.scene);
        for w in &r.warnings {
            eprintln!("  warning: {w}");
        }
    }

    let out = args.out.as_ref().unwrap_or(&args.timeline);
    timeline.write_path(out)?;
    eprintln!("generated {} scene(s); wrote {}", reports.len(), out.display());
    Ok(())
}

fn cmd_assemble(mut config: PipelineConfig, args: AssembleArgs) -> anyhow::Result<()> {
    let timeline = load_timeline(&args.timeline)?;
    if let Some(style) = args.caption_style {
        config.captions.style = style.into();
    }
    let words = match &args.captions {
        Some(path) => {
            config.captions.enabled = true;
            read_transcript(path)?
        }
        None => Vec::new(),
    };
    config.validate()?;
    let plan = Assembler::new(config.render)
        .with_captions(config.captions)
        .compose_captioned(&timeline, &words)?;
    if !plan.captions.is_empty() {
        eprintln!("captions: {}", plan.captions.len());
    }

    write_file(&args.script, &plan.script)?;
    eprintln!("wrote {}", args.script.display());

    if let Some(path) = &args.plan {
        let json = serde_json::to_string_pretty(&plan).context("encode render plan")?;
        write_file(path, &json)?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(dir) = args.render {
        let engine = ManimCliEngine::new(dir).with_quality(args.quality.into());
        match engine.render(&plan)? {
            RenderOutput::Artifact(path) => eprintln!("rendered {}", path.display()),
            RenderOutput::Frames { count, fps } => eprintln!("rendered {count} frames @ {fps} fps"),
        }
    }
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let code = std::fs::read_to_string(&args.path)
        .with_context(|| format!("read '{}'", args.path.display()))?;
    let validator = CodeValidator::new().strict_vocabulary(args.strict);
    let validation = if args.script {
        validator.check_script(&code)
    } else {
        validator.check(&code)
    };
    for w in validation.warnings() {
        eprintln!("warning: {w}");
    }
    if !validation.is_valid() {
        anyhow::bail!("{}: {validation}", args.path.display());
    }
    eprintln!("{}: ok", args.path.display());
    Ok(())
}

fn cmd_cache(config: PipelineConfig, cmd: CacheCommand) -> anyhow::Result<()> {
    let cache = config.cache.open()?;
    match cmd {
        CacheCommand::Stats => {
            let stats = cache.stats()?;
            println!("location: {}", stats.location);
            println!("entries:  {}", stats.entry_count);
            println!("bytes:    {}", stats.total_bytes);
        }
        CacheCommand::Clear => {
            let removed = cache.clear()?;
            println!("removed {removed} entries");
        }
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("write '{}'", path.display()))
}
