pub mod ffmpeg_runner;

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use virew::engine::Timeline;
use virew::engine::backend::MediaBackend;
use virew::engine::hardware::EncodingProfile;
use virew::engine::probe::{MediaSource, SourceInfo};
use virew::engine::progress::{CounterUpdate, ProgressBridge};
use virew::error::PipelineError;

/// Skip a test when ffmpeg is not installed
#[macro_export]
macro_rules! require_ffmpeg {
    () => {
        if !$crate::common::ffmpeg_runner::is_ffmpeg_available() {
            eprintln!("skipping: ffmpeg not available");
            return;
        }
    };
}

pub fn source_info() -> SourceInfo {
    SourceInfo {
        width: 64,
        height: 64,
        fps: 25.0,
        duration: 4.0,
        total_frames: 100,
        has_audio: true,
    }
}

/// In-memory backend: records the timelines it is asked to write and touches
/// the output path instead of encoding
#[allow(dead_code)]
pub struct RecordingBackend {
    pub encoders: Result<String, String>,
    pub fail_on_write: Option<usize>,
    pub panic_on_write: bool,
    /// Held by `write` for its whole duration; lock it to stall a job
    pub gate: Mutex<()>,
    pub writes: Mutex<Vec<Timeline>>,
}

#[allow(dead_code)]
impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            encoders: Ok(String::new()),
            fail_on_write: None,
            panic_on_write: false,
            gate: Mutex::new(()),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

impl MediaBackend for RecordingBackend {
    fn list_encoders(&self) -> Result<String, PipelineError> {
        self.encoders.clone().map_err(PipelineError::ProbeFailure)
    }

    fn open(&self, path: &Path) -> Result<MediaSource, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::SourceNotFound(path.to_path_buf()));
        }
        let handle =
            File::open(path).map_err(|e| PipelineError::unreadable(path, e.to_string()))?;
        Ok(MediaSource::with_handle(path, source_info(), handle))
    }

    fn write(
        &self,
        timeline: &Timeline,
        output: &Path,
        _profile: &EncodingProfile,
        bridge: &mut ProgressBridge,
    ) -> Result<(), PipelineError> {
        let _gate = self.gate.lock().unwrap();
        let index = {
            let mut writes = self.writes.lock().unwrap();
            writes.push(timeline.clone());
            writes.len() - 1
        };
        if self.panic_on_write {
            panic!("encoder blew up");
        }
        std::fs::write(output, b"encoded")
            .map_err(|e| PipelineError::encode(output, e.to_string()))?;

        let total = timeline.duration();
        for step in 0..=4 {
            bridge.on_counter(CounterUpdate::time(total * f64::from(step) / 4.0, total));
        }
        if self.fail_on_write == Some(index) {
            return Err(PipelineError::encode(output, "injected failure"));
        }
        Ok(())
    }
}
