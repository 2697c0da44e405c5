use crate::assemble::plan::RenderPlan;
use crate::engine::backend::{RenderEngine, RenderOutput};
use crate::foundation::error::{ManimlineError, ManimlineResult};
use anyhow::Context as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// File name the composed script is written to inside the output directory.
pub const SCRIPT_FILE: &str = "timeline_scene.py";

/// Manim quality presets, as accepted by `manim render -q`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    #[default]
    Low,
    Medium,
    High,
    Production,
    FourK,
}

impl Quality {
    fn flag(self) -> &'static str {
        match self {
            Self::Low => "l",
            Self::Medium => "m",
            Self::High => "h",
            Self::Production => "p",
            Self::FourK => "k",
        }
    }
}

/// Whether `manim --version` runs successfully.
pub fn is_manim_on_path() -> bool {
    Command::new("manim")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Renders plans by writing the script and running `manim render`.
#[derive(Clone, Debug)]
pub struct ManimCliEngine {
    program: PathBuf,
    out_dir: PathBuf,
    quality: Quality,
}

impl ManimCliEngine {
    /// Engine writing the script and media under `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("manim"),
            out_dir: out_dir.into(),
            quality: Quality::default(),
        }
    }

    /// Render quality preset passed as `-q`.
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Use another executable (a wrapper script or a virtualenv's `manim`).
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Where the composed script is written before rendering.
    pub fn script_path(&self) -> PathBuf {
        self.out_dir.join(SCRIPT_FILE)
    }

    fn write_script(&self, plan: &RenderPlan) -> ManimlineResult<PathBuf> {
        std::fs::create_dir_all(&self.out_dir).with_context(|| {
            format!("failed to create output directory '{}'", self.out_dir.display())
        })?;
        let path = self.script_path();
        std::fs::write(&path, &plan.script)
            .with_context(|| format!("failed to write script '{}'", path.display()))?;
        Ok(path)
    }
}

impl RenderEngine for ManimCliEngine {
    fn name(&self) -> &str {
        "manim-cli"
    }

    #[tracing::instrument(level = "info", skip_all, fields(out_dir = %self.out_dir.display()))]
    fn render(&self, plan: &RenderPlan) -> ManimlineResult<RenderOutput> {
        let script = self.write_script(plan)?;
        let media_dir = self.out_dir.join("media");

        let output = Command::new(&self.program)
            .arg("render")
            .arg(format!("-q{}", self.quality.flag()))
            .arg("--media_dir")
            .arg(&media_dir)
            .arg(&script)
            .arg(&plan.class_name)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                ManimlineError::validation(format!(
                    "failed to spawn '{}' (is manim installed and on PATH?): {e}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(8).collect();
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            return Err(ManimlineError::Other(anyhow::anyhow!(
                "manim exited with {}: {}",
                output.status,
                tail.join("\n")
            )));
        }

        let video = find_file(&media_dir, &format!("{}.mp4", plan.class_name)).ok_or_else(|| {
            ManimlineError::Other(anyhow::anyhow!(
                "manim finished but produced no {}.mp4 under '{}'",
                plan.class_name,
                media_dir.display()
            ))
        })?;
        tracing::info!(video = %video.display(), "render finished");
        Ok(RenderOutput::Artifact(video))
    }
}

fn find_file(dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path.file_name().is_some_and(|n| n == name) {
            return Some(path);
        }
    }
    subdirs.sort();
    subdirs.iter().find_map(|d| find_file(d, name))
}

#[cfg(test)]
#[path = "../../tests/unit/engine/manim_cli.rs"]
mod tests;
