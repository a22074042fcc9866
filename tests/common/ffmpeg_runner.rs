#![allow(dead_code)]

use anyhow::{Context, Result};
use std::path::Path;
/// FFmpeg helpers for integration tests: fixture generation and frame decoding
use std::process::{Command, Stdio};

/// Frames in the marker fixture
pub const MARKER_FRAMES: u64 = 100;
/// Frame rate of the marker fixture
pub const MARKER_FPS: u32 = 25;

/// Luma value painted on frame `index` of the marker fixture
pub fn marker_luma(index: u64) -> u8 {
    (16 + 2 * index) as u8
}

/// Generate a 100-frame, 25 fps clip whose frame N is flat gray at luma 16 + 2N,
/// with a sine audio track. Encoded losslessly so markers survive.
pub fn generate_marker_video(output_path: &Path) -> Result<()> {
    let duration = MARKER_FRAMES as f64 / MARKER_FPS as f64;
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y")
        .arg("-f")
        .arg("lavfi")
        .arg("-i")
        .arg(format!(
            "color=c=black:s=64x64:r={}:d={},format=yuv420p,geq=lum='16+2*N':cb=128:cr=128",
            MARKER_FPS, duration
        ))
        .arg("-f")
        .arg("lavfi")
        .arg("-i")
        .arg(format!("sine=frequency=440:sample_rate=44100:duration={}", duration))
        .arg("-frames:v")
        .arg(MARKER_FRAMES.to_string())
        .arg("-c:v")
        .arg("libx264")
        .arg("-preset")
        .arg("ultrafast")
        .arg("-qp")
        .arg("0")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg("-c:a")
        .arg("aac")
        .arg(output_path);

    let output = cmd.output().context("Failed to generate marker video")?;
    if !output.status.success() {
        anyhow::bail!(
            "FFmpeg failed to generate marker video: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(())
}

/// Decode every frame of `path` and return the luma of its top-left region
pub fn decode_frame_lumas(path: &Path) -> Result<Vec<u8>> {
    let output = Command::new("ffmpeg")
        .arg("-v")
        .arg("error")
        .arg("-i")
        .arg(path)
        .arg("-vf")
        .arg("scale=2:2")
        .arg("-f")
        .arg("rawvideo")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg("-")
        .stderr(Stdio::piped())
        .output()
        .context("Failed to decode frames")?;

    if !output.status.success() {
        anyhow::bail!(
            "FFmpeg failed to decode {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    // 2x2 yuv420p: 4 luma bytes, 1 Cb, 1 Cr
    Ok(output.stdout.chunks_exact(6).map(|frame| frame[0]).collect())
}

/// Map a decoded luma back to the marker frame index it encodes
pub fn marker_index(luma: u8) -> u64 {
    (f64::from(luma.saturating_sub(16)) / 2.0).round() as u64
}

/// Check that FFmpeg is available
pub fn is_ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Assert a decoded luma is within encoder noise of a marker
pub fn assert_marker(luma: u8, expected_index: u64, context: &str) {
    let expected = i32::from(marker_luma(expected_index));
    let delta = (i32::from(luma) - expected).abs();
    assert!(
        delta <= 2,
        "{}: luma {} (frame ~{}) is not marker {} (luma {})",
        context,
        luma,
        marker_index(luma),
        expected_index,
        expected
    );
}
