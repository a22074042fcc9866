//! Lazy clip views.
//!
//! A [`Clip`] describes *what* to read from a source (time window, direction)
//! without touching any samples. A [`Timeline`] strings clips together. Only
//! the writer turns these into an actual decode/encode.

use super::range::{TimeRange, effective_fps};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    source: PathBuf,
    source_duration: f64,
    fps: f64,
    has_audio: bool,
    window: Option<TimeRange>,
    reversed: bool,
}

impl Clip {
    /// Whole-source view
    pub fn new(source: impl Into<PathBuf>, duration: f64, fps: f64, has_audio: bool) -> Self {
        Self {
            source: source.into(),
            source_duration: duration.max(0.0),
            fps: effective_fps(fps),
            has_audio,
            window: None,
            reversed: false,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn has_audio(&self) -> bool {
        self.has_audio
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Source-time window this view reads, `None` when it reads the whole source
    pub fn window(&self) -> Option<TimeRange> {
        self.window
    }

    fn source_span(&self) -> TimeRange {
        self.window
            .unwrap_or_else(|| TimeRange::new(0.0, self.source_duration))
    }

    pub fn duration(&self) -> f64 {
        self.source_span().duration()
    }

    pub fn frame_count(&self) -> u64 {
        (self.duration() * self.fps).round() as u64
    }

    /// Sub-clip over `[range.start_seconds, range.end_seconds)` of *this* view's
    /// timeline. Bounds are clamped to the view.
    pub fn subclip(&self, range: TimeRange) -> Clip {
        let span = self.source_span();
        let len = span.duration();
        let a = range.start_seconds.clamp(0.0, len);
        let b = range.end_seconds.clamp(a, len);

        // A reversed view plays its source span backwards, so its local
        // [a, b) maps to source [end - b, end - a).
        let window = if self.reversed {
            TimeRange::new(span.end_seconds - b, span.end_seconds - a)
        } else {
            TimeRange::new(span.start_seconds + a, span.start_seconds + b)
        };

        Clip {
            window: Some(window),
            ..self.clone()
        }
    }

    /// Time-mirrored view: output frame N is input frame (len - 1 - N)
    pub fn time_mirror(&self) -> Clip {
        Clip {
            reversed: !self.reversed,
            ..self.clone()
        }
    }

    /// Source frame index shown at each output frame of this view
    pub fn frame_indices(&self) -> Vec<u64> {
        let first = (self.source_span().start_seconds * self.fps).round() as u64;
        let count = self.frame_count();
        let forward = first..first + count;
        if self.reversed {
            forward.rev().collect()
        } else {
            forward.collect()
        }
    }
}

/// Ordered concatenation of clips, no transitions
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    clips: Vec<Clip>,
}

impl Timeline {
    pub fn concatenate(clips: Vec<Clip>) -> Self {
        Self { clips }
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn duration(&self) -> f64 {
        self.clips.iter().map(Clip::duration).sum()
    }

    pub fn frame_count(&self) -> u64 {
        self.clips.iter().map(Clip::frame_count).sum()
    }

    /// Audio is carried only when every clip has a track
    pub fn has_audio(&self) -> bool {
        !self.clips.is_empty() && self.clips.iter().all(Clip::has_audio)
    }
}

impl From<Clip> for Timeline {
    fn from(clip: Clip) -> Self {
        Self { clips: vec![clip] }
    }
}
