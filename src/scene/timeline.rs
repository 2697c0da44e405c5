use crate::foundation::core::{
    DEFAULT_SCENE_SECS, DURATION_FLOOR_SECS, MIN_SCENE_SECS, TimeSpan, end_after, start_before,
};
use crate::foundation::error::{ManimlineError, ManimlineResult};
use crate::scene::model::{Generator, Scene, SceneDraft, SceneId, TimeEdge, VisualType};
use std::collections::HashSet;

/// Tolerance used when comparing detected spans for equality.
const SPAN_EPS: f64 = 1e-6;

/// One timeline mutation.
///
/// Edits are applied with [`Timeline::apply`], which never touches the source timeline.
#[derive(Clone, Debug)]
pub enum Edit {
    /// Append a scene; untimed drafts start where the timeline currently ends.
    Add(SceneDraft),
    /// Delete a scene. Absent ids are a no-op.
    Remove(SceneId),
    /// Move one edge of a scene, clamped to keep the minimum duration.
    UpdateTime {
        /// Target scene.
        id: SceneId,
        /// Edge to move.
        edge: TimeEdge,
        /// Requested time in seconds.
        value: f64,
    },
    /// Reconcile auto-detected candidates with the current scenes.
    Merge(Vec<SceneDraft>),
    /// Replace every scene. Explicit user action only.
    Replace(Vec<SceneDraft>),
    /// Hand-edit the prompt.
    SetPrompt {
        /// Target scene.
        id: SceneId,
        /// New prompt.
        prompt: String,
    },
    /// Hand-edit the visual type.
    SetVisualType {
        /// Target scene.
        id: SceneId,
        /// New visual type.
        visual_type: VisualType,
    },
    /// Change the composition layer.
    SetLayer {
        /// Target scene.
        id: SceneId,
        /// New layer.
        layer: i32,
    },
    /// Store code. [`Generator::Manual`] marks the scene human-edited.
    SetCode {
        /// Target scene.
        id: SceneId,
        /// Code fragment.
        code: String,
        /// Provenance of the fragment.
        generator: Generator,
        /// Annotations to attach (replaces previous notes).
        notes: Vec<String>,
    },
    /// Set or clear the audio duration.
    SetAudioDuration(Option<f64>),
}

/// Result of a [`Timeline::merge`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Ids assigned to accepted candidates, in candidate order.
    pub accepted: Vec<SceneId>,
    /// Candidates dropped because they overlap a human-edited scene.
    pub dropped: usize,
    /// Auto-generated scenes superseded by accepted candidates.
    pub replaced: Vec<SceneId>,
    /// Candidates matching an existing auto-generated scene, which was kept as is.
    pub unchanged: Vec<SceneId>,
}

/// What an applied [`Edit`] did.
#[derive(Clone, Debug, PartialEq)]
pub enum EditOutcome {
    /// A scene was created.
    Added(SceneId),
    /// A scene was removed (`false` when the id was absent).
    Removed(bool),
    /// An existing scene changed.
    Updated(SceneId),
    /// Candidates were reconciled.
    Merged(MergeReport),
    /// All scenes were replaced; new ids in draft order.
    Replaced(Vec<SceneId>),
    /// Timeline-level property changed.
    Timeline,
}

/// Ordered, reconciled collection of scenes for one render request.
///
/// Scenes are kept sorted by `(start_time, id)`. Overlap is permitted and resolved by layer at
/// composition time.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    pub(crate) scenes: Vec<Scene>,
    pub(crate) audio_duration: Option<f64>,
    pub(crate) next_id: u64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// Empty timeline without audio.
    pub fn new() -> Self {
        Self {
            scenes: Vec::new(),
            audio_duration: None,
            next_id: 1,
        }
    }

    /// Empty timeline bounded by an audio track.
    pub fn with_audio_duration(secs: f64) -> Self {
        Self {
            audio_duration: Some(secs),
            ..Self::new()
        }
    }

    /// Scenes in `(start_time, id)` order.
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Return `true` when the timeline has no scenes.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Declared audio duration, if any.
    pub fn audio_duration(&self) -> Option<f64> {
        self.audio_duration
    }

    /// Look up a scene by id.
    pub fn get(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    /// Id the next created scene will receive.
    pub fn next_id(&self) -> SceneId {
        SceneId(self.next_id)
    }

    /// Latest end time over all scenes.
    pub fn max_end_time(&self) -> Option<f64> {
        self.scenes.iter().map(|s| s.span.end).reduce(f64::max)
    }

    /// Timeline length for display and normalization.
    ///
    /// Uses the audio duration when set and positive, never less than the latest scene end; falls
    /// back to the latest scene end, then to a 60 s floor.
    pub fn duration(&self) -> f64 {
        let max_end = self.max_end_time();
        match (self.audio_duration.filter(|d| d.is_finite() && *d > 0.0), max_end) {
            (Some(audio), Some(end)) => audio.max(end),
            (Some(audio), None) => audio,
            (None, Some(end)) => end,
            (None, None) => DURATION_FLOOR_SECS,
        }
    }

    /// Scenes active at `t`, lowest layer first.
    pub fn scenes_at(&self, t: f64) -> Vec<&Scene> {
        let mut out: Vec<&Scene> = self.scenes.iter().filter(|s| s.span.contains(t)).collect();
        out.sort_by_key(|s| (s.layer, s.id));
        out
    }

    /// Scenes that still need code.
    pub fn pending(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter().filter(|s| !s.has_code())
    }

    /// Apply `edit` to a copy of this timeline.
    ///
    /// The returned timeline has passed [`Timeline::check_invariants`]; `self` is unchanged.
    pub fn apply(&self, edit: Edit) -> ManimlineResult<(Timeline, EditOutcome)> {
        let mut next = self.clone();
        let outcome = next.apply_in_place(edit)?;
        next.sort();
        next.check_invariants()?;
        Ok((next, outcome))
    }

    /// Apply `edit` and commit the result to `self`.
    pub fn commit(&mut self, edit: Edit) -> ManimlineResult<EditOutcome> {
        let (next, outcome) = self.apply(edit)?;
        *self = next;
        Ok(outcome)
    }

    /// Append a scene and return its id.
    pub fn add(&mut self, draft: SceneDraft) -> ManimlineResult<SceneId> {
        match self.commit(Edit::Add(draft))? {
            EditOutcome::Added(id) => Ok(id),
            other => Err(unexpected_outcome("add", &other)),
        }
    }

    /// Remove a scene. Returns `false` (and changes nothing) when absent.
    pub fn remove(&mut self, id: SceneId) -> bool {
        matches!(self.commit(Edit::Remove(id)), Ok(EditOutcome::Removed(true)))
    }

    /// Move the in or out point of a scene, clamped to keep at least 0.1 s.
    pub fn update_time(&mut self, id: SceneId, edge: TimeEdge, value: f64) -> ManimlineResult<()> {
        self.commit(Edit::UpdateTime { id, edge, value }).map(|_| ())
    }

    /// Reconcile auto-detected candidates without clobbering human edits.
    pub fn merge(&mut self, candidates: Vec<SceneDraft>) -> ManimlineResult<MergeReport> {
        match self.commit(Edit::Merge(candidates))? {
            EditOutcome::Merged(report) => Ok(report),
            other => Err(unexpected_outcome("merge", &other)),
        }
    }

    /// Replace every scene. Ids keep increasing; none are reused.
    pub fn replace(&mut self, drafts: Vec<SceneDraft>) -> ManimlineResult<Vec<SceneId>> {
        match self.commit(Edit::Replace(drafts))? {
            EditOutcome::Replaced(ids) => Ok(ids),
            other => Err(unexpected_outcome("replace", &other)),
        }
    }

    /// Hand-edit the prompt.
    pub fn set_prompt(&mut self, id: SceneId, prompt: impl Into<String>) -> ManimlineResult<()> {
        let prompt = prompt.into();
        self.commit(Edit::SetPrompt { id, prompt }).map(|_| ())
    }

    /// Hand-edit the visual type.
    pub fn set_visual_type(&mut self, id: SceneId, visual_type: VisualType) -> ManimlineResult<()> {
        self.commit(Edit::SetVisualType { id, visual_type })
            .map(|_| ())
    }

    /// Change the composition layer.
    pub fn set_layer(&mut self, id: SceneId, layer: i32) -> ManimlineResult<()> {
        self.commit(Edit::SetLayer { id, layer }).map(|_| ())
    }

    /// Store code with its provenance.
    pub fn set_code(
        &mut self,
        id: SceneId,
        code: impl Into<String>,
        generator: Generator,
        notes: Vec<String>,
    ) -> ManimlineResult<()> {
        let code = code.into();
        self.commit(Edit::SetCode {
            id,
            code,
            generator,
            notes,
        })
        .map(|_| ())
    }

    /// Verify every timeline invariant.
    pub fn check_invariants(&self) -> ManimlineResult<()> {
        let mut ids = HashSet::with_capacity(self.scenes.len());
        for (i, s) in self.scenes.iter().enumerate() {
            if !ids.insert(s.id) {
                return Err(ManimlineError::validation(format!(
                    "duplicate scene id {}",
                    s.id.0
                )));
            }
            if s.id.0 >= self.next_id {
                return Err(ManimlineError::validation(format!(
                    "scene id {} is not below next id {}",
                    s.id.0, self.next_id
                )));
            }
            if !s.span.start.is_finite() || !s.span.end.is_finite() || s.span.start < 0.0 {
                return Err(ManimlineError::validation(format!(
                    "{} has invalid timing [{}, {}]",
                    s.id, s.span.start, s.span.end
                )));
            }
            if s.span.len_secs() < MIN_SCENE_SECS {
                return Err(ManimlineError::validation(format!(
                    "{} is shorter than {MIN_SCENE_SECS}s",
                    s.id
                )));
            }
            if let Some(prev) = i.checked_sub(1).map(|p| &self.scenes[p])
                && (prev.span.start, prev.id) > (s.span.start, s.id)
            {
                return Err(ManimlineError::validation(
                    "scenes are not ordered by (start_time, id)",
                ));
            }
        }
        if let Some(d) = self.audio_duration
            && !d.is_finite()
        {
            return Err(ManimlineError::validation("audio_duration must be finite"));
        }
        Ok(())
    }

    fn apply_in_place(&mut self, edit: Edit) -> ManimlineResult<EditOutcome> {
        match edit {
            Edit::Add(draft) => {
                let span = match draft.span {
                    Some(span) => span.widen_to(MIN_SCENE_SECS),
                    None => {
                        let start = self.max_end_time().unwrap_or(0.0);
                        TimeSpan::starting_at(start, DEFAULT_SCENE_SECS)?
                    }
                };
                let id = self.push_draft(draft, span);
                Ok(EditOutcome::Added(id))
            }
            Edit::Remove(id) => {
                let before = self.scenes.len();
                self.scenes.retain(|s| s.id != id);
                Ok(EditOutcome::Removed(self.scenes.len() != before))
            }
            Edit::UpdateTime { id, edge, value } => {
                if !value.is_finite() {
                    return Err(ManimlineError::validation(format!(
                        "time for {id} must be finite"
                    )));
                }
                let scene = self.scene_mut(id)?;
                match edge {
                    TimeEdge::Start => {
                        let latest = start_before(scene.span.end, MIN_SCENE_SECS);
                        scene.span.start = value.clamp(0.0, latest);
                    }
                    TimeEdge::End => {
                        let earliest = end_after(scene.span.start, MIN_SCENE_SECS);
                        scene.span.end = value.max(earliest);
                    }
                }
                scene.auto_generated = false;
                Ok(EditOutcome::Updated(id))
            }
            Edit::Merge(candidates) => self.merge_candidates(candidates).map(EditOutcome::Merged),
            Edit::Replace(drafts) => {
                let mut spans = Vec::with_capacity(drafts.len());
                let mut cursor = 0.0;
                for d in &drafts {
                    let span = match d.span {
                        Some(span) => span.widen_to(MIN_SCENE_SECS),
                        None => TimeSpan::starting_at(cursor, DEFAULT_SCENE_SECS)?,
                    };
                    cursor = f64::max(cursor, span.end);
                    spans.push(span);
                }
                self.scenes.clear();
                let ids = drafts
                    .into_iter()
                    .zip(spans)
                    .map(|(d, span)| self.push_draft(d, span))
                    .collect();
                Ok(EditOutcome::Replaced(ids))
            }
            Edit::SetPrompt { id, prompt } => {
                let scene = self.scene_mut(id)?;
                scene.prompt = prompt;
                scene.auto_generated = false;
                Ok(EditOutcome::Updated(id))
            }
            Edit::SetVisualType { id, visual_type } => {
                let scene = self.scene_mut(id)?;
                scene.visual_type = visual_type;
                scene.auto_generated = false;
                Ok(EditOutcome::Updated(id))
            }
            Edit::SetLayer { id, layer } => {
                let scene = self.scene_mut(id)?;
                scene.layer = layer;
                Ok(EditOutcome::Updated(id))
            }
            Edit::SetCode {
                id,
                code,
                generator,
                notes,
            } => {
                let scene = self.scene_mut(id)?;
                scene.code = code;
                scene.generator = Some(generator);
                scene.notes = notes;
                if generator == Generator::Manual {
                    scene.auto_generated = false;
                }
                Ok(EditOutcome::Updated(id))
            }
            Edit::SetAudioDuration(d) => {
                if let Some(v) = d
                    && (!v.is_finite() || v < 0.0)
                {
                    return Err(ManimlineError::validation(
                        "audio_duration must be finite and >= 0",
                    ));
                }
                self.audio_duration = d;
                Ok(EditOutcome::Timeline)
            }
        }
    }

    /// Candidates overlapping a human-edited scene are dropped entirely, even on partial overlap.
    fn merge_candidates(&mut self, candidates: Vec<SceneDraft>) -> ManimlineResult<MergeReport> {
        let protected: Vec<TimeSpan> = self
            .scenes
            .iter()
            .filter(|s| !s.auto_generated)
            .map(|s| s.span)
            .collect();

        let mut report = MergeReport::default();
        let mut accepted = Vec::new();
        let mut kept = HashSet::new();

        for (i, c) in candidates.into_iter().enumerate() {
            let Some(span) = c.span else {
                return Err(ManimlineError::validation(format!(
                    "merge candidate {i} has no timing"
                )));
            };
            let span = span.widen_to(MIN_SCENE_SECS);
            if protected.iter().any(|p| p.overlaps(span)) {
                report.dropped += 1;
                continue;
            }
            let same = self.scenes.iter().find(|s| {
                s.auto_generated
                    && (s.span.start - span.start).abs() < SPAN_EPS
                    && (s.span.end - span.end).abs() < SPAN_EPS
                    && s.prompt == c.prompt
            });
            if let Some(existing) = same {
                kept.insert(existing.id);
                report.unchanged.push(existing.id);
                continue;
            }
            accepted.push((c, span));
        }

        let superseded: Vec<SceneId> = self
            .scenes
            .iter()
            .filter(|s| s.auto_generated && !kept.contains(&s.id))
            .filter(|s| accepted.iter().any(|(_, span)| span.overlaps(s.span)))
            .map(|s| s.id)
            .collect();
        self.scenes.retain(|s| !superseded.contains(&s.id));
        report.replaced = superseded;

        for (c, span) in accepted {
            let id = self.push_draft(c.auto_generated(true), span);
            report.accepted.push(id);
        }
        Ok(report)
    }

    fn push_draft(&mut self, d: SceneDraft, span: TimeSpan) -> SceneId {
        let id = SceneId(self.next_id);
        self.next_id += 1;
        let generator = (!d.auto_generated && !d.code.trim().is_empty()).then_some(Generator::Manual);
        self.scenes.push(Scene {
            id,
            span,
            prompt: d.prompt,
            visual_type: d.visual_type,
            code: d.code,
            auto_generated: d.auto_generated,
            layer: d.layer,
            generator,
            notes: Vec::new(),
            data_source: d.data_source,
        });
        id
    }

    fn scene_mut(&mut self, id: SceneId) -> ManimlineResult<&mut Scene> {
        self.scenes
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ManimlineError::validation(format!("unknown {id}")))
    }

    pub(crate) fn sort(&mut self) {
        self.scenes.sort_by(|a, b| {
            a.span
                .start
                .total_cmp(&b.span.start)
                .then(a.id.cmp(&b.id))
        });
    }
}

fn unexpected_outcome(op: &str, outcome: &EditOutcome) -> ManimlineError {
    ManimlineError::validation(format!("{op} produced unexpected outcome {outcome:?}"))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/timeline.rs"]
mod tests;
