// Media backend: the seam between the pipeline and ffmpeg

use std::path::Path;

use crate::config::PipelineConfig;
use crate::engine::core::{
    ProgressKey, Timeline, build_audio_cmd, build_video_cmd, run_ffmpeg, stderr_tail,
};
use crate::engine::hardware::{self, EncodingProfile};
use crate::engine::probe::MediaSource;
use crate::engine::progress::{CounterUpdate, ProgressBridge};
use crate::error::PipelineError;

/// Everything the pipeline needs from the outside world
pub trait MediaBackend: Send + Sync {
    /// Text listing of available encoders (`ffmpeg -encoders`)
    fn list_encoders(&self) -> Result<String, PipelineError>;

    /// Open a source and read its layout
    fn open(&self, path: &Path) -> Result<MediaSource, PipelineError>;

    /// Materialize `timeline` into `output`, reporting counters to `bridge`
    fn write(
        &self,
        timeline: &Timeline,
        output: &Path,
        profile: &EncodingProfile,
        bridge: &mut ProgressBridge,
    ) -> Result<(), PipelineError>;
}

/// Backend driving the ffmpeg and ffprobe executables
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    config: PipelineConfig,
}

impl FfmpegBackend {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    fn write_audio(
        &self,
        timeline: &Timeline,
        output: &Path,
        bridge: &ProgressBridge,
    ) -> Result<tempfile::TempPath, PipelineError> {
        let dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "virew".to_string());

        // Removed on drop, on both the success and failure paths
        let side_file = tempfile::Builder::new()
            .prefix(&format!("{}_audio_", stem))
            .suffix(".m4a")
            .tempfile_in(dir)
            .map_err(|e| PipelineError::encode(output, format!("cannot create audio file: {}", e)))?
            .into_temp_path();

        bridge.message(format!("Writing audio to {}", side_file.display()));

        let cmd = build_audio_cmd(
            &self.config.ffmpeg_path,
            timeline,
            &self.config.audio_codec,
            &side_file,
        );
        let (status, stderr) = run_ffmpeg(cmd, |_, _| {})
            .map_err(|e| PipelineError::encode(output, format!("failed to run ffmpeg: {}", e)))?;
        if !status.success() {
            return Err(PipelineError::encode(
                output,
                format!("audio pass exited with {}\n{}", status, stderr_tail(&stderr)),
            ));
        }

        Ok(side_file)
    }
}

impl MediaBackend for FfmpegBackend {
    fn list_encoders(&self) -> Result<String, PipelineError> {
        hardware::list_encoders(&self.config.ffmpeg_path)
            .map_err(|e| PipelineError::ProbeFailure(format!("{:#}", e)))
    }

    fn open(&self, path: &Path) -> Result<MediaSource, PipelineError> {
        MediaSource::open(&self.config.ffprobe_path, path)
    }

    fn write(
        &self,
        timeline: &Timeline,
        output: &Path,
        profile: &EncodingProfile,
        bridge: &mut ProgressBridge,
    ) -> Result<(), PipelineError> {
        if timeline.clips().is_empty() {
            return Err(PipelineError::encode(output, "nothing to write"));
        }

        let audio = if timeline.has_audio() {
            Some(self.write_audio(timeline, output, bridge)?)
        } else {
            None
        };

        bridge.message(format!("Building video {}", output.display()));

        let total_secs = timeline.duration();
        let total_frames = timeline.frame_count();
        let cmd = build_video_cmd(
            &self.config.ffmpeg_path,
            timeline,
            profile,
            audio.as_deref(),
            &self.config.extra_args,
            output,
        );

        let (status, stderr) = run_ffmpeg(cmd, |key, parser| match key {
            ProgressKey::Frame => {
                if let Some(frame) = parser.frame {
                    bridge.on_counter(CounterUpdate::frame(frame, total_frames));
                }
            }
            ProgressKey::OutTime => {
                if let Some(secs) = parser.out_time_s() {
                    bridge.on_counter(CounterUpdate::time(secs, total_secs));
                }
            }
            // Frame counts can stop short of the estimate; the pass is finished
            ProgressKey::End => bridge.on_counter(CounterUpdate::frame(total_frames, total_frames)),
            ProgressKey::Other => {}
        })
        .map_err(|e| PipelineError::encode(output, format!("failed to run ffmpeg: {}", e)))?;

        if !status.success() {
            return Err(PipelineError::encode(
                output,
                format!("ffmpeg exited with {}\n{}", status, stderr_tail(&stderr)),
            ));
        }

        bridge.message(format!("Done: {}", output.display()));
        Ok(())
    }
}
