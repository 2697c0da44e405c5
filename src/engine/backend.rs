use crate::assemble::plan::RenderPlan;
use crate::foundation::error::{ManimlineError, ManimlineResult};
use std::path::PathBuf;
use std::sync::Mutex;

/// What a render produced.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderOutput {
    /// Encoded file on disk.
    Artifact(PathBuf),
    /// Frames that would be produced, without encoding anything.
    Frames { count: u64, fps: u32 },
}

/// Consumer of composed render plans.
pub trait RenderEngine: Send + Sync + std::fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &str;

    fn render(&self, plan: &RenderPlan) -> ManimlineResult<RenderOutput>;
}

/// Number of frames covering `duration` seconds at `fps`.
pub fn frame_count(duration: f64, fps: u32) -> u64 {
    if !(duration.is_finite() && duration > 0.0) || fps == 0 {
        return 0;
    }
    let frames = (duration * f64::from(fps)).ceil();
    if frames >= u64::MAX as f64 {
        u64::MAX
    } else {
        frames as u64
    }
}

/// Engine that records plans and reports their frame count.
#[derive(Debug, Default)]
pub struct DryRunEngine {
    rendered: Mutex<Vec<RenderPlan>>,
}

impl DryRunEngine {
    /// Engine with an empty render log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans received so far, in order.
    pub fn rendered(&self) -> Vec<RenderPlan> {
        self.rendered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl RenderEngine for DryRunEngine {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn render(&self, plan: &RenderPlan) -> ManimlineResult<RenderOutput> {
        if plan.placements.is_empty() {
            return Err(ManimlineError::TimelineEmpty);
        }
        self.rendered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(plan.clone());
        let fps = plan.config.frame_rate;
        Ok(RenderOutput::Frames {
            count: frame_count(plan.duration, fps),
            fps,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/backend.rs"]
mod tests;
