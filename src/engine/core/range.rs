//! Frame-range resolution.
//!
//! Converts a frame interval picked on the source into time bounds for the
//! trim stage. Out-of-range requests are clamped, never rejected.

use serde::{Deserialize, Serialize};

/// Frame rate assumed when a source reports zero, negative or NaN fps.
pub const FALLBACK_FPS: f64 = 30.0;

/// Requested frame interval, `start_frame` inclusive, `end_frame` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start_frame: u64,
    pub end_frame: u64,
}

impl TrimRange {
    pub fn new(start_frame: u64, end_frame: u64) -> Self {
        Self {
            start_frame,
            end_frame,
        }
    }

    pub fn len(&self) -> u64 {
        self.end_frame.saturating_sub(self.start_frame)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Time bounds in seconds, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl TimeRange {
    pub fn new(start_seconds: f64, end_seconds: f64) -> Self {
        Self {
            start_seconds,
            end_seconds,
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end_seconds - self.start_seconds).max(0.0)
    }
}

/// Result of resolving a trim request against a source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRange {
    pub range: TimeRange,
    /// The range spans the whole source, so the trim stage is skipped
    pub skip_trim: bool,
}

/// Use `fps` unless it is not a usable rate
pub fn effective_fps(fps: f64) -> f64 {
    if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        FALLBACK_FPS
    }
}

/// Resolve a frame interval into time bounds.
///
/// `end_frame` is clamped to `total_frames`, seconds are clamped to
/// `[0, duration]`, and a collapsed range is re-opened by pulling the start
/// back one frame before the end.
pub fn resolve(
    total_frames: u64,
    frame_rate: f64,
    duration: f64,
    start_frame: u64,
    end_frame: u64,
) -> ResolvedRange {
    resolve_with_guard(total_frames, frame_rate, duration, start_frame, end_frame, None)
}

/// [`resolve`] with an optional tail guard that shaves seconds off the end of
/// sources longer than 0.1s.
pub fn resolve_with_guard(
    total_frames: u64,
    frame_rate: f64,
    duration: f64,
    start_frame: u64,
    end_frame: u64,
    tail_guard: Option<f64>,
) -> ResolvedRange {
    let fps = effective_fps(frame_rate);
    let frame_secs = 1.0 / fps;
    let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };

    let end_frame = if total_frames > 0 {
        end_frame.min(total_frames)
    } else {
        end_frame
    };
    let end_frame = end_frame.max(start_frame.saturating_add(1));

    let mut start = (start_frame as f64 / fps).max(0.0);
    let mut end = (end_frame as f64 / fps).min(duration);

    let mut guarded = false;
    if let Some(guard) = tail_guard.filter(|g| *g > 0.0) {
        if duration > 0.1 && end > duration - guard {
            end = (duration - guard).max(0.0);
            guarded = true;
        }
    }

    if end <= start {
        start = (end - frame_secs).max(0.0);
    }

    let half_frame = frame_secs / 2.0;
    let skip_trim = !guarded && start < half_frame && end > duration - half_frame;

    ResolvedRange {
        range: TimeRange::new(start, end),
        skip_trim,
    }
}
