// Source probing using ffprobe

use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::engine::core::{Clip, effective_fps};
use crate::error::PipelineError;

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

/// Timing and layout of a source, as reported by ffprobe
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    /// As reported; may be 0.0 for malformed sources
    pub fps: f64,
    pub duration: f64,
    pub total_frames: u64,
    pub has_audio: bool,
}

/// An opened source file.
///
/// Holds a read handle on the file for as long as the pipeline run that opened
/// it is alive; [`MediaSource::close`] (or drop) releases it.
#[derive(Debug)]
pub struct MediaSource {
    path: PathBuf,
    info: SourceInfo,
    handle: Option<File>,
}

impl MediaSource {
    /// Open `path` and read its stream layout with `ffprobe`
    pub fn open(ffprobe: &Path, path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::SourceNotFound(path.to_path_buf()));
        }

        let handle =
            File::open(path).map_err(|e| PipelineError::unreadable(path, e.to_string()))?;

        let output = Command::new(ffprobe)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .map_err(|e| {
                PipelineError::unreadable(path, format!("failed to run ffprobe: {}", e))
            })?;

        if !output.status.success() {
            return Err(PipelineError::unreadable(
                path,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        let info = parse_ffprobe_output(&json)
            .map_err(|reason| PipelineError::unreadable(path, reason))?;

        tracing::debug!(
            path = %path.display(),
            fps = info.fps,
            duration = info.duration,
            frames = info.total_frames,
            audio = info.has_audio,
            "opened source"
        );

        Ok(Self {
            path: path.to_path_buf(),
            info,
            handle: Some(handle),
        })
    }

    /// Source without an OS handle, for callers that already know its layout
    pub fn from_info(path: impl Into<PathBuf>, info: SourceInfo) -> Self {
        Self {
            path: path.into(),
            info,
            handle: None,
        }
    }

    /// Source holding an already opened read handle
    pub fn with_handle(path: impl Into<PathBuf>, info: SourceInfo, handle: File) -> Self {
        Self {
            path: path.into(),
            info,
            handle: Some(handle),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    pub fn duration(&self) -> f64 {
        self.info.duration
    }

    pub fn fps(&self) -> f64 {
        self.info.fps
    }

    pub fn total_frames(&self) -> u64 {
        self.info.total_frames
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Whole-source view
    pub fn clip(&self) -> Clip {
        Clip::new(
            self.path.clone(),
            self.info.duration,
            self.info.fps,
            self.info.has_audio,
        )
    }

    /// Release the file handle
    pub fn close(&mut self) {
        if self.handle.take().is_some() {
            tracing::trace!(path = %self.path.display(), "closed source");
        }
    }
}

/// Parse ffprobe `-show_format -show_streams` JSON into [`SourceInfo`]
pub fn parse_ffprobe_output(json: &str) -> Result<SourceInfo, String> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| format!("Failed to parse ffprobe JSON: {}", e))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or("No video stream found")?;
    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    // Try r_frame_rate first (more accurate), fall back to avg_frame_rate
    let fps = video
        .r_frame_rate
        .as_deref()
        .and_then(parse_fraction)
        .or_else(|| video.avg_frame_rate.as_deref().and_then(parse_fraction))
        .unwrap_or(0.0);

    let nb_frames = video.nb_frames.as_deref().and_then(|s| s.parse::<u64>().ok());

    // The container duration includes audio padding; the video stream's is
    // what trim bounds are measured against
    let parse_duration = |s: &str| s.parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0);
    let duration = video
        .duration
        .as_deref()
        .and_then(parse_duration)
        .or_else(|| {
            probe
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref())
                .and_then(parse_duration)
        })
        .or_else(|| nb_frames.map(|n| n as f64 / effective_fps(fps)))
        .ok_or("No duration found in ffprobe output")?;

    let total_frames = nb_frames
        .filter(|n| *n > 0)
        .unwrap_or_else(|| (duration * effective_fps(fps)).round() as u64);

    Ok(SourceInfo {
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        fps,
        duration,
        total_frames,
        has_audio,
    })
}

/// Parse a fraction string like "30000/1001" to f64
fn parse_fraction(s: &str) -> Option<f64> {
    let (numerator, denominator) = s.split_once('/')?;
    let numerator: f64 = numerator.parse().ok()?;
    let denominator: f64 = denominator.parse().ok()?;

    if denominator == 0.0 {
        return None;
    }

    Some(numerator / denominator)
}
