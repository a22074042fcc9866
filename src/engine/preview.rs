// Single-frame preview for picking trim points

use std::path::{Path, PathBuf};

use crate::engine::core::{build_frame_extract_cmd, effective_fps, stderr_tail};
use crate::engine::probe::MediaSource;
use crate::error::PipelineError;

#[derive(Debug, Clone, PartialEq)]
pub struct FramePreview {
    pub frame_index: u64,
    pub total_frames: u64,
    pub seconds: f64,
    pub image: PathBuf,
}

impl FramePreview {
    pub fn timecode(&self) -> String {
        format_timecode(self.seconds)
    }

    pub fn label(&self) -> String {
        frame_label(self.frame_index, self.total_frames)
    }
}

/// `HH:MM:SS.ss`
pub fn format_timecode(seconds: f64) -> String {
    let centis = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 100.0).round() as u64
    } else {
        0
    };
    let hours = centis / 360_000;
    let minutes = (centis / 6_000) % 60;
    let secs = (centis / 100) % 60;
    let frac = centis % 100;
    format!("{:02}:{:02}:{:02}.{:02}", hours, minutes, secs, frac)
}

pub fn frame_label(frame_index: u64, total_frames: u64) -> String {
    format!("Frame: {} / {}", frame_index, total_frames)
}

/// `<stem>_frame<N>.png` beside the source
pub fn default_preview_path(source: &Path, frame_index: u64) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "frame".to_string());
    source.with_file_name(format!("{}_frame{}.png", stem, frame_index))
}

/// Decode frame `frame_index` of `source` into `output`.
/// Indices past the end show the last frame.
pub fn extract_frame(
    ffmpeg: &Path,
    source: &MediaSource,
    frame_index: u64,
    output: &Path,
) -> Result<FramePreview, PipelineError> {
    let total_frames = source.total_frames();
    let frame_index = frame_index.min(total_frames.saturating_sub(1));
    let seconds = frame_index as f64 / effective_fps(source.fps());

    let mut cmd = build_frame_extract_cmd(ffmpeg, source.path(), seconds, output);
    let result = cmd
        .output()
        .map_err(|e| PipelineError::encode(output, format!("failed to run ffmpeg: {}", e)))?;

    if !result.status.success() {
        return Err(PipelineError::encode(
            output,
            stderr_tail(&String::from_utf8_lossy(&result.stderr)),
        ));
    }

    tracing::debug!(
        frame = frame_index,
        seconds,
        image = %output.display(),
        "extracted preview frame"
    );

    Ok(FramePreview {
        frame_index,
        total_frames,
        seconds,
        image: output.to_path_buf(),
    })
}
