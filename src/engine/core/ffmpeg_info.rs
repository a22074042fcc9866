use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

fn tool_version(tool: &Path) -> Result<String> {
    let output = Command::new(tool)
        .arg("-version")
        .output()
        .with_context(|| {
            format!(
                "Failed to execute {}. Is it installed and in PATH?",
                tool.display()
            )
        })?;

    if !output.status.success() {
        anyhow::bail!(
            "{} command failed with status: {}",
            tool.display(),
            output.status
        );
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}

/// Check if ffmpeg is available and return its version line
pub fn ffmpeg_version(ffmpeg: &Path) -> Result<String> {
    tool_version(ffmpeg)
}

/// Check if ffprobe is available and return its version line
pub fn ffprobe_version(ffprobe: &Path) -> Result<String> {
    tool_version(ffprobe)
}
