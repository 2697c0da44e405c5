use crate::foundation::core::{MIN_SCENE_SECS, TimeSpan, end_after};
use crate::foundation::error::{ManimlineError, ManimlineResult};
use crate::scene::model::{Scene, SceneDef, SceneId, TimelineDef, VisualType};
use crate::scene::timeline::Timeline;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Kind of condition reported while ingesting a timeline document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConditionKind {
    /// The document as a whole could not be parsed; an empty timeline was used.
    MalformedInput,
    /// A scene entry could not be parsed and was skipped.
    SceneSkipped,
    /// A scene entry was usable after a local repair.
    SceneRepaired,
}

/// Non-fatal condition reported by [`Timeline::ingest`].
#[derive(Clone, Debug, PartialEq)]
pub struct IngestCondition {
    /// What happened.
    pub kind: ConditionKind,
    /// Index of the scene entry in the document, when scene-specific.
    pub index: Option<usize>,
    /// Human-readable detail.
    pub message: String,
}

impl fmt::Display for IngestCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "$.scenes[{i}]: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Timeline recovered from a JSON document plus everything that had to be absorbed on the way.
#[derive(Clone, Debug)]
pub struct Ingested {
    /// Recovered timeline (empty for malformed documents).
    pub timeline: Timeline,
    /// Conditions callers must surface.
    pub conditions: Vec<IngestCondition>,
}

impl Ingested {
    /// Return `true` when the document was taken as is.
    pub fn is_clean(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Return `true` when the whole document was rejected.
    pub fn is_malformed(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.kind == ConditionKind::MalformedInput)
    }

    /// Convert into a strict result: any condition becomes a [`ManimlineError::MalformedInput`].
    pub fn into_strict(self) -> ManimlineResult<Timeline> {
        if self.conditions.is_empty() {
            return Ok(self.timeline);
        }
        let msg = self
            .conditions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(ManimlineError::malformed(msg))
    }
}

impl Timeline {
    /// Parse a timeline document leniently.
    ///
    /// Malformed JSON yields an empty timeline and a [`ConditionKind::MalformedInput`] condition.
    /// Unknown fields are ignored. Broken scene entries are repaired or skipped and reported.
    #[tracing::instrument(skip(json), fields(bytes = json.len()))]
    pub fn ingest(json: &str) -> Ingested {
        let def: TimelineDef = match serde_json::from_str(json) {
            Ok(def) => def,
            Err(e) => {
                tracing::warn!("timeline document is malformed: {e}");
                return Ingested {
                    timeline: Timeline::new(),
                    conditions: vec![IngestCondition {
                        kind: ConditionKind::MalformedInput,
                        index: None,
                        message: format!("parse timeline JSON: {e}"),
                    }],
                };
            }
        };

        let mut conditions = Vec::new();
        let mut timeline = Timeline::new();
        if let Some(d) = def.audio_duration {
            if d.is_finite() && d >= 0.0 {
                timeline.audio_duration = Some(d);
            } else {
                conditions.push(IngestCondition {
                    kind: ConditionKind::SceneRepaired,
                    index: None,
                    message: "audio_duration is not a finite non-negative number; ignored"
                        .to_owned(),
                });
            }
        }

        let mut seen = HashSet::new();
        let mut needs_id = Vec::new();
        for (index, raw) in def.scenes.into_iter().enumerate() {
            let sd: SceneDef = match serde_json::from_value(raw) {
                Ok(sd) => sd,
                Err(e) => {
                    conditions.push(IngestCondition {
                        kind: ConditionKind::SceneSkipped,
                        index: Some(index),
                        message: format!("unreadable scene entry: {e}"),
                    });
                    continue;
                }
            };
            let mut repair = |message: String| {
                conditions.push(IngestCondition {
                    kind: ConditionKind::SceneRepaired,
                    index: Some(index),
                    message,
                })
            };

            let visual_type = VisualType::parse(&sd.visual_type).unwrap_or_else(|| {
                repair(format!(
                    "unknown visual_type '{}'; using auto",
                    sd.visual_type
                ));
                VisualType::Auto
            });

            let mut start = sd.start_time;
            if !start.is_finite() || start < 0.0 {
                repair(format!("start_time {start} clamped to 0"));
                start = 0.0;
            }
            let mut end = sd.end_time;
            if !end.is_finite() || end - start < MIN_SCENE_SECS {
                repair(format!(
                    "end_time {end} widened to keep {MIN_SCENE_SECS}s after start"
                ));
                end = end_after(start, MIN_SCENE_SECS);
            }

            let id = match sd.id {
                Some(id) if id > 0 && seen.insert(id) => Some(SceneId(id)),
                Some(id) => {
                    repair(format!("scene id {id} is reserved or duplicated; reassigned"));
                    None
                }
                None => None,
            };

            let scene = Scene {
                id: id.unwrap_or_default(),
                span: TimeSpan { start, end },
                prompt: sd.prompt,
                visual_type,
                code: sd.manim_code,
                auto_generated: sd.auto_generated,
                layer: sd.layer,
                generator: sd.generator,
                notes: sd.notes,
                data_source: sd.data_source.filter(|p| !p.trim().is_empty()),
            };
            if id.is_none() {
                needs_id.push(timeline.scenes.len());
            }
            timeline.scenes.push(scene);
        }

        timeline.next_id = seen.iter().max().map_or(1, |m| m + 1);
        for i in needs_id {
            timeline.scenes[i].id = SceneId(timeline.next_id);
            timeline.next_id += 1;
        }
        timeline.sort();
        debug_assert!(timeline.check_invariants().is_ok());

        for c in &conditions {
            tracing::warn!("timeline ingest: {c}");
        }
        Ingested {
            timeline,
            conditions,
        }
    }

    /// Read and leniently parse a timeline document from disk.
    ///
    /// IO errors are not absorbed; only the document content is.
    pub fn ingest_path(path: impl AsRef<Path>) -> ManimlineResult<Ingested> {
        use anyhow::Context as _;
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read timeline JSON '{}'", path.display()))?;
        Ok(Self::ingest(&s))
    }

    /// Serialize to the persisted JSON form.
    pub fn to_json(&self) -> ManimlineResult<String> {
        let scenes = self
            .scenes
            .iter()
            .map(|s| serde_json::to_value(SceneDef::from(s)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ManimlineError::serde(format!("encode scene: {e}")))?;
        let def = TimelineDef {
            audio_duration: self.audio_duration,
            scenes,
        };
        serde_json::to_string_pretty(&def)
            .map_err(|e| ManimlineError::serde(format!("encode timeline: {e}")))
    }

    /// Write the persisted JSON form to disk.
    pub fn write_path(&self, path: impl AsRef<Path>) -> ManimlineResult<()> {
        use anyhow::Context as _;
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("write timeline JSON '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/document.rs"]
mod tests;
