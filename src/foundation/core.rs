use crate::foundation::error::{ManimlineError, ManimlineResult};

/// Smallest duration any edited scene may have, in seconds.
pub const MIN_SCENE_SECS: f64 = 0.1;

/// Duration given to scenes added without explicit timing.
pub const DEFAULT_SCENE_SECS: f64 = 5.0;

/// Duration reported by an empty timeline without audio. Display/normalization only.
pub const DURATION_FLOOR_SECS: f64 = 60.0;

/// Half-open time span `[start, end)` in seconds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeSpan {
    /// Inclusive span start.
    pub start: f64,
    /// Exclusive span end.
    pub end: f64,
}

impl TimeSpan {
    /// Create a validated span with finite bounds, `start >= 0` and `start < end`.
    pub fn new(start: f64, end: f64) -> ManimlineResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(ManimlineError::validation("TimeSpan bounds must be finite"));
        }
        if start < 0.0 {
            return Err(ManimlineError::validation("TimeSpan start must be >= 0"));
        }
        if start >= end {
            return Err(ManimlineError::validation("TimeSpan start must be < end"));
        }
        Ok(Self { start, end })
    }

    /// Span starting at `start` lasting `secs`.
    pub fn starting_at(start: f64, secs: f64) -> ManimlineResult<Self> {
        Self::new(start, start + secs)
    }

    /// Length of the span in seconds.
    pub fn len_secs(self) -> f64 {
        self.end - self.start
    }

    /// Return `true` when `t` is inside `[start, end)`.
    pub fn contains(self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    /// Return `true` when the open interiors of both spans intersect.
    ///
    /// Spans that only touch at an endpoint do not overlap.
    pub fn overlaps(self, other: TimeSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Widen the span so it lasts at least `min_secs`.
    pub fn widen_to(self, min_secs: f64) -> Self {
        if self.len_secs() >= min_secs {
            return self;
        }
        Self {
            start: self.start,
            end: end_after(self.start, min_secs),
        }
    }
}

/// Smallest end time `>= start + min_secs` whose difference to `start` is at least `min_secs`.
///
/// `start + min_secs - start` can round below `min_secs`; step up until it does not.
pub(crate) fn end_after(start: f64, min_secs: f64) -> f64 {
    let mut end = start + min_secs;
    while end - start < min_secs {
        end = end.next_up();
    }
    end
}

/// Largest start time in `[0, end - min_secs]` whose difference to `end` is at least `min_secs`.
pub(crate) fn start_before(end: f64, min_secs: f64) -> f64 {
    let mut start = (end - min_secs).max(0.0);
    while start > 0.0 && end - start < min_secs {
        start = start.next_down();
    }
    start.max(0.0)
}

/// Collapse runs of whitespace into single spaces and trim both ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
