//! H.264 encoder detection and profile selection
//!
//! `ffmpeg -encoders` is scanned for the three vendor encoders in a fixed
//! priority order. Any probe failure means "software".

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sysinfo::{CpuRefreshKind, RefreshKind, System};

use crate::config::{PipelineConfig, QualityPolicy};
use crate::error::PipelineError;

/// Encoder thread count when the CPU count cannot be detected
pub const FALLBACK_THREADS: usize = 4;

/// Vendor markers in `ffmpeg -encoders` output, highest priority first
const VENDOR_MARKERS: &[(&str, EncoderVendor)] = &[
    ("h264_nvenc", EncoderVendor::Nvidia),
    ("h264_amf", EncoderVendor::Amd),
    ("h264_qsv", EncoderVendor::Intel),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderVendor {
    Software,
    Nvidia,
    Amd,
    Intel,
}

impl EncoderVendor {
    /// Get the FFmpeg encoder name
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            Self::Software => "libx264",
            Self::Nvidia => "h264_nvenc",
            Self::Amd => "h264_amf",
            Self::Intel => "h264_qsv",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Software => "libx264 (Software)",
            Self::Nvidia => "H.264 NVENC (NVIDIA)",
            Self::Amd => "H.264 AMF (AMD)",
            Self::Intel => "H.264 Quick Sync (Intel)",
        }
    }
}

/// Codec + preset + rate control bundle handed to the writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingProfile {
    pub vendor: EncoderVendor,
    pub codec: String,
    /// Flag the vendor uses for its speed/quality preset (`-preset`, `-quality`)
    pub preset_flag: String,
    pub preset: String,
    /// Rate-control arguments, vendor specific
    pub quality_args: Vec<String>,
    pub pix_fmt: String,
    pub thread_count: usize,
}

impl EncodingProfile {
    /// Build the parameter set for a vendor.
    ///
    /// Each vendor exposes a different rate-control vocabulary, so the shared
    /// `crf` is mapped onto roughly equivalent visual quality per encoder.
    pub fn for_vendor(
        vendor: EncoderVendor,
        quality: QualityPolicy,
        crf: u8,
        thread_count: usize,
    ) -> Self {
        let fast = quality == QualityPolicy::Fast;
        let crf = u32::from(crf);

        let (preset_flag, preset, quality_args, pix_fmt) = match vendor {
            EncoderVendor::Software => (
                "-preset",
                if fast { "ultrafast" } else { "medium" },
                vec!["-crf".to_string(), crf.to_string()],
                "yuv420p",
            ),
            EncoderVendor::Nvidia => (
                "-preset",
                if fast { "p1" } else { "p4" },
                vec![
                    "-rc".to_string(),
                    "vbr".to_string(),
                    "-cq".to_string(),
                    (crf + 1).min(51).to_string(),
                    "-b:v".to_string(),
                    "0".to_string(),
                ],
                "yuv420p",
            ),
            EncoderVendor::Amd => (
                "-quality",
                if fast { "speed" } else { "balanced" },
                vec![
                    "-rc".to_string(),
                    "cqp".to_string(),
                    "-qp_i".to_string(),
                    crf.min(51).to_string(),
                    "-qp_p".to_string(),
                    (crf + 2).min(51).to_string(),
                ],
                "yuv420p",
            ),
            EncoderVendor::Intel => (
                "-preset",
                if fast { "veryfast" } else { "medium" },
                vec![
                    "-global_quality".to_string(),
                    (crf + 2).min(51).to_string(),
                    "-look_ahead".to_string(),
                    "0".to_string(),
                ],
                "nv12",
            ),
        };

        Self {
            vendor,
            codec: vendor.ffmpeg_name().to_string(),
            preset_flag: preset_flag.to_string(),
            preset: preset.to_string(),
            quality_args,
            pix_fmt: pix_fmt.to_string(),
            thread_count: thread_count.max(1),
        }
    }

    pub fn software(config: &PipelineConfig) -> Self {
        Self::for_vendor(
            EncoderVendor::Software,
            config.quality,
            config.crf,
            thread_count(config),
        )
    }

    /// Encoder arguments, starting at `-c:v`
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            self.preset_flag.clone(),
            self.preset.clone(),
        ];
        args.extend(self.quality_args.iter().cloned());
        args.push("-pix_fmt".to_string());
        args.push(self.pix_fmt.clone());
        args.push("-threads".to_string());
        args.push(self.thread_count.to_string());
        args
    }
}

/// Pick the highest-priority vendor whose encoder name appears in the probe text
pub fn vendor_from_encoders(encoders_output: &str) -> EncoderVendor {
    VENDOR_MARKERS
        .iter()
        .find(|(marker, _)| encoders_output.contains(marker))
        .map(|(_, vendor)| *vendor)
        .unwrap_or(EncoderVendor::Software)
}

/// Run `ffmpeg -hide_banner -encoders` and return its stdout
pub fn list_encoders(ffmpeg: &Path) -> Result<String> {
    let output = Command::new(ffmpeg)
        .args(["-hide_banner", "-encoders"])
        .output()
        .with_context(|| format!("Failed to execute {}", ffmpeg.display()))?;

    if !output.status.success() {
        anyhow::bail!("ffmpeg -encoders failed with status: {}", output.status);
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Logical CPU count, or [`FALLBACK_THREADS`] when it cannot be read
pub fn detect_cpu_threads() -> usize {
    let system =
        System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::new()));
    match system.cpus().len() {
        0 => FALLBACK_THREADS,
        n => n,
    }
}

fn thread_count(config: &PipelineConfig) -> usize {
    config
        .threads
        .filter(|t| *t > 0)
        .unwrap_or_else(detect_cpu_threads)
}

/// Choose a profile from an encoder probe result. Never fails: a probe error
/// is treated as "no hardware encoder found".
pub fn select_profile_from(
    probe: Result<String, PipelineError>,
    config: &PipelineConfig,
) -> EncodingProfile {
    let vendor = match probe {
        Ok(listing) => vendor_from_encoders(&listing),
        Err(e) => {
            tracing::warn!(error = %e, "encoder probe failed, using software encoder");
            EncoderVendor::Software
        }
    };

    let profile =
        EncodingProfile::for_vendor(vendor, config.quality, config.crf, thread_count(config));
    tracing::info!(
        encoder = %profile.codec,
        preset = %profile.preset,
        threads = profile.thread_count,
        "selected {}",
        vendor.display_name()
    );
    profile
}

/// Probe the configured ffmpeg and choose a profile
pub fn select_profile(config: &PipelineConfig) -> EncodingProfile {
    if !config.use_hardware {
        return EncodingProfile::software(config);
    }
    let probe = list_encoders(&config.ffmpeg_path)
        .map_err(|e| PipelineError::ProbeFailure(format!("{:#}", e)));
    select_profile_from(probe, config)
}
