//! Reverse / boomerang transform pipeline.
//!
//! Stages run strictly in order on the calling thread:
//! `Init -> Load -> Trim? -> Reverse -> Write` for reverse jobs and
//! `Init -> Load -> Trim? -> Reverse -> WriteTemp -> ReloadTemp -> Concatenate -> Write`
//! for boomerang jobs, always followed by `Cleanup`.

use std::path::PathBuf;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::engine::backend::MediaBackend;
use crate::engine::cleanup::JobResources;
use crate::engine::core::{
    Clip, Job, JobRequest, JobStatus, Mode, Stage, TimeRange, Timeline, resolve_with_guard,
};
use crate::engine::hardware::{EncodingProfile, select_profile_from};
use crate::engine::probe::SourceInfo;
use crate::engine::progress::ProgressBridge;
use crate::error::PipelineError;

pub struct TransformPipeline<'a, B: MediaBackend + ?Sized> {
    backend: &'a B,
    config: &'a PipelineConfig,
}

impl<'a, B: MediaBackend + ?Sized> TransformPipeline<'a, B> {
    pub fn new(backend: &'a B, config: &'a PipelineConfig) -> Self {
        Self { backend, config }
    }

    /// Init stage: pick the encoder profile and build the job
    pub fn init(&self, id: Uuid, request: JobRequest, bridge: &mut ProgressBridge) -> Job {
        bridge.percent(0);
        bridge.message("Initializing processing engine...");

        let profile = if self.config.use_hardware {
            select_profile_from(self.backend.list_encoders(), self.config)
        } else {
            EncodingProfile::software(self.config)
        };

        let mut job = Job::with_id(id, request, profile);
        job.status = JobStatus::Running(Stage::Init);
        job
    }

    /// Init followed by [`TransformPipeline::run`]
    pub fn execute(
        &self,
        id: Uuid,
        request: JobRequest,
        bridge: &mut ProgressBridge,
    ) -> Result<PathBuf, PipelineError> {
        let mut job = self.init(id, request, bridge);
        self.run(&mut job, bridge)
    }

    /// Run every stage after Init. Cleanup has finished by the time this returns,
    /// whatever the outcome.
    pub fn run(
        &self,
        job: &mut Job,
        bridge: &mut ProgressBridge,
    ) -> Result<PathBuf, PipelineError> {
        let mut resources = JobResources::new();
        self.run_with(job, bridge, &mut resources)
    }

    /// [`TransformPipeline::run`] with caller-owned resources, which stay
    /// inspectable after Cleanup has released them
    pub fn run_with(
        &self,
        job: &mut Job,
        bridge: &mut ProgressBridge,
        resources: &mut JobResources,
    ) -> Result<PathBuf, PipelineError> {
        let result = self.run_stages(job, bridge, resources);

        enter(job, Stage::Cleanup);
        resources.release();

        match &result {
            Ok(output) => {
                job.status = JobStatus::Done;
                tracing::info!(job = %job.id, output = %output.display(), "job finished");
            }
            Err(e) => {
                job.status = JobStatus::Failed;
                tracing::error!(job = %job.id, error = %e, "job failed");
            }
        }
        result
    }

    fn run_stages(
        &self,
        job: &mut Job,
        bridge: &mut ProgressBridge,
        resources: &mut JobResources,
    ) -> Result<PathBuf, PipelineError> {
        enter(job, Stage::Load);
        bridge.message("Loading source video...");
        let source = self.backend.open(&job.source)?;
        let info = source.info().clone();
        let whole = source.clip();
        resources.adopt(source);

        let forward = match self.trim_window(job, &info) {
            Some(window) => {
                enter(job, Stage::Trim);
                bridge.message(format!(
                    "Trimming: {:.2}s - {:.2}s",
                    window.start_seconds, window.end_seconds
                ));
                whole.subclip(window)
            }
            None => whole,
        };

        enter(job, Stage::Reverse);
        bridge.message("Computing reverse effect...");
        let reversed = forward.time_mirror();

        match job.mode {
            Mode::Reverse => {
                enter(job, Stage::Write);
                bridge.begin_write(0);
                bridge.message("Writing reversed video...");
                self.backend.write(
                    &Timeline::from(reversed),
                    &job.output_path,
                    &job.profile,
                    bridge,
                )?;
            }
            Mode::Boomerang => {
                let temp_path = job.temp_path.clone();
                resources.track_temp(&temp_path);

                enter(job, Stage::WriteTemp);
                bridge.begin_write(0);
                bridge.message("Writing temporary reversed clip (boomerang)...");
                self.backend
                    .write(&Timeline::from(reversed), &temp_path, &job.profile, bridge)?;

                enter(job, Stage::ReloadTemp);
                let reloaded = self.backend.open(&temp_path)?;
                let backward = reloaded.clip();
                resources.adopt(reloaded);

                enter(job, Stage::Concatenate);
                bridge.message("Concatenating forward + reverse...");
                let timeline = boomerang_timeline(forward, backward);

                enter(job, Stage::Write);
                bridge.begin_write(1);
                bridge.message("Writing boomerang video...");
                self.backend
                    .write(&timeline, &job.output_path, &job.profile, bridge)?;
            }
        }

        bridge.percent(100);
        Ok(job.output_path.clone())
    }

    /// Source window for the Trim stage, `None` when trimming is skipped
    fn trim_window(&self, job: &Job, info: &SourceInfo) -> Option<TimeRange> {
        let guard = self.config.tail_guard();
        let (start_frame, end_frame) = match job.trim {
            Some(trim) => (trim.start_frame, trim.end_frame),
            None if guard.is_some() => (0, info.total_frames),
            None => return None,
        };

        let resolved = resolve_with_guard(
            info.total_frames,
            info.fps,
            info.duration,
            start_frame,
            end_frame,
            guard,
        );
        if resolved.skip_trim {
            None
        } else {
            Some(resolved.range)
        }
    }
}

/// Forward range followed by its reversed copy, no cross-fade
pub fn boomerang_timeline(forward: Clip, backward: Clip) -> Timeline {
    Timeline::concatenate(vec![forward, backward])
}

fn enter(job: &mut Job, stage: Stage) {
    tracing::debug!(job = %job.id, %stage, "entering stage");
    job.status = JobStatus::Running(stage);
}
