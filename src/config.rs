// Pipeline configuration
//
// Built from CLI flags and handed to the pipeline constructor. Nothing here is
// read from or written to disk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which preset family the encoder profiles use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityPolicy {
    /// Speed-first presets (libx264 `ultrafast`, NVENC `p1`, ...)
    #[default]
    Fast,
    /// Medium presets (libx264 `medium`, NVENC `p4`, ...)
    Balanced,
}

/// How Write-stage progress maps onto the job percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressMode {
    /// Every Write stage reports 0-100 on its own; the bar resets between stages.
    #[default]
    PerWrite,
    /// Each Write stage fills its share of a single 0-100 bar.
    Overall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// ffmpeg executable used for encoding, probing encoders and previews
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// ffprobe executable used to open sources
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    #[serde(default)]
    pub quality: QualityPolicy,

    /// Base quality value (CRF for libx264; hardware encoders derive their own scale from it)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Seconds shaved off the end of the source before reversing (guards against
    /// broken trailing frames some containers carry). Applied only when the source
    /// is longer than 0.1s.
    #[serde(default)]
    pub tail_guard_secs: Option<f64>,

    #[serde(default)]
    pub progress_mode: ProgressMode,

    /// Encoder thread count; detected CPU count when unset
    #[serde(default)]
    pub threads: Option<usize>,

    /// Probe for hardware encoders (false forces libx264)
    #[serde(default = "default_true")]
    pub use_hardware: bool,

    /// Extra ffmpeg arguments appended to every video encode (shell-style quoting)
    #[serde(default)]
    pub extra_args: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_crf() -> u8 {
    18
}

fn default_true() -> bool {
    true
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            quality: QualityPolicy::default(),
            crf: default_crf(),
            tail_guard_secs: None,
            progress_mode: ProgressMode::default(),
            threads: None,
            use_hardware: true,
            extra_args: String::new(),
            audio_codec: default_audio_codec(),
        }
    }
}

impl PipelineConfig {
    /// Tail guard in seconds, ignoring non-positive values
    pub fn tail_guard(&self) -> Option<f64> {
        self.tail_guard_secs.filter(|secs| *secs > 0.0)
    }
}
