//! Error taxonomy for the reverse/boomerang pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while running a transform job.
///
/// `ProbeFailure` never reaches a job's terminal event: the encoder selector
/// swallows it and falls back to the software profile.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Cannot open {}: {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("Encoding {} failed: {reason}", output.display())]
    EncodeFailure { output: PathBuf, reason: String },

    #[error("Encoder probe failed: {0}")]
    ProbeFailure(String),
}

impl PipelineError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn encode(output: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::EncodeFailure {
            output: output.into(),
            reason: reason.into(),
        }
    }
}

/// Rejections from [`crate::engine::worker::JobController::submit`].
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("A job is already running; wait for it to finish")]
    Busy,

    #[error("Failed to start worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
