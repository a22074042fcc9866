//! Best-effort cleanup of job resources.
//!
//! Nothing here returns an error: failures are logged and swallowed so that a
//! cleanup problem never replaces the job's real outcome.

use std::path::{Path, PathBuf};

use crate::engine::probe::MediaSource;

/// Remove `path` if it exists, logging anything that goes wrong
pub fn remove_best_effort(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed temporary file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove file"),
    }
}

/// Everything a pipeline run must give back, whatever the exit path.
///
/// Dropping it (including during unwinding) releases sources and removes
/// tracked temp files.
#[derive(Debug, Default)]
pub struct JobResources {
    sources: Vec<MediaSource>,
    temp_files: Vec<PathBuf>,
}

impl JobResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of an opened source until release
    pub fn adopt(&mut self, source: MediaSource) {
        self.sources.push(source);
    }

    /// Sources adopted so far, released or not
    pub fn adopted(&self) -> usize {
        self.sources.len()
    }

    /// Schedule a file for removal at release time
    pub fn track_temp(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.temp_files.contains(&path) {
            self.temp_files.push(path);
        }
    }

    /// Adopted sources still holding their read handle
    pub fn open_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.is_open()).count()
    }

    /// Close every source and delete tracked temp files. Safe to call twice.
    pub fn release(&mut self) {
        for source in &mut self.sources {
            source.close();
        }
        for path in self.temp_files.drain(..) {
            remove_best_effort(&path);
        }
    }
}

impl Drop for JobResources {
    fn drop(&mut self) {
        self.release();
    }
}
