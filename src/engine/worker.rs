// Job controller: runs one pipeline at a time on a worker thread

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::engine::backend::{FfmpegBackend, MediaBackend};
use crate::engine::core::JobRequest;
use crate::engine::pipeline::TransformPipeline;
use crate::engine::progress::{JobEvent, ProgressBridge};
use crate::error::SubmitError;

/// Receiver side of a job's events
pub trait DisplaySurface {
    fn on_progress_message(&mut self, text: &str);
    fn on_progress_percent(&mut self, percent: u8);
    fn on_completed(&mut self, output: &Path);
    fn on_failed(&mut self, message: &str);
}

/// How a job ended
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed(PathBuf),
    Failed(String),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Clears the controller's busy flag when the worker lets go of it
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Accepts one job at a time and runs it off the calling thread
pub struct JobController<B: MediaBackend = FfmpegBackend> {
    backend: Arc<B>,
    config: Arc<PipelineConfig>,
    busy: Arc<AtomicBool>,
}

impl JobController<FfmpegBackend> {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_backend(FfmpegBackend::new(config.clone()), config)
    }
}

impl<B: MediaBackend + 'static> JobController<B> {
    pub fn with_backend(backend: B, config: PipelineConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            config: Arc::new(config),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// True while a submitted job has not yet produced its terminal event
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start `request` on a new worker thread
    pub fn submit(&self, request: JobRequest) -> Result<JobHandle, SubmitError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SubmitError::Busy);
        }

        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel();
        let backend = Arc::clone(&self.backend);
        let config = Arc::clone(&self.config);
        let busy = Arc::clone(&self.busy);

        tracing::info!(
            job = %id,
            source = %request.source.display(),
            mode = ?request.mode,
            "submitting job"
        );

        let spawned = thread::Builder::new()
            .name(format!("virew-job-{}", id.simple()))
            .spawn(move || {
                let guard = BusyGuard(busy);
                let mut bridge = ProgressBridge::new(
                    tx.clone(),
                    config.progress_mode,
                    request.mode.write_count(),
                );

                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    TransformPipeline::new(backend.as_ref(), config.as_ref())
                        .execute(id, request, &mut bridge)
                }));

                let event = match result {
                    Ok(Ok(output)) => JobEvent::Completed { output },
                    Ok(Err(e)) => JobEvent::Failed {
                        message: e.to_string(),
                    },
                    Err(payload) => {
                        let message =
                            format!("Internal error: {}", panic_message(payload.as_ref()));
                        tracing::error!(job = %id, "{}", message);
                        JobEvent::Failed { message }
                    }
                };

                drop(bridge);
                drop(guard);
                let _ = tx.send(event);
            });

        match spawned {
            Ok(_) => Ok(JobHandle::new(id, rx)),
            Err(e) => {
                self.busy.store(false, Ordering::Release);
                Err(SubmitError::Spawn(e))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// One submitted job's event stream. Inert after the terminal event.
pub struct JobHandle {
    id: Uuid,
    rx: Receiver<JobEvent>,
    finished: bool,
}

impl JobHandle {
    fn new(id: Uuid, rx: Receiver<JobEvent>) -> Self {
        Self {
            id,
            rx,
            finished: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn accept(&mut self, event: JobEvent) -> JobEvent {
        if event.is_terminal() {
            self.finished = true;
        }
        event
    }

    fn lost_worker(&mut self) -> JobEvent {
        self.finished = true;
        JobEvent::Failed {
            message: "Worker exited without reporting a result".to_string(),
        }
    }

    /// Block for the next event; `None` once the terminal event was delivered
    pub fn recv(&mut self) -> Option<JobEvent> {
        if self.finished {
            return None;
        }
        match self.rx.recv() {
            Ok(event) => Some(self.accept(event)),
            Err(_) => Some(self.lost_worker()),
        }
    }

    /// Next event if one is ready
    pub fn try_recv(&mut self) -> Option<JobEvent> {
        if self.finished {
            return None;
        }
        match self.rx.try_recv() {
            Ok(event) => Some(self.accept(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.lost_worker()),
        }
    }

    /// Drain events until the job ends
    pub fn wait(mut self) -> JobOutcome {
        self.drive(&mut NullSurface)
    }

    /// Dispatch every event to `surface` until the job ends
    pub fn drive<S: DisplaySurface + ?Sized>(&mut self, surface: &mut S) -> JobOutcome {
        while let Some(event) = self.recv() {
            match event {
                JobEvent::Message { text } => surface.on_progress_message(&text),
                JobEvent::Progress { percent } => surface.on_progress_percent(percent),
                JobEvent::Completed { output } => {
                    surface.on_completed(&output);
                    return JobOutcome::Completed(output);
                }
                JobEvent::Failed { message } => {
                    surface.on_failed(&message);
                    return JobOutcome::Failed(message);
                }
            }
        }
        JobOutcome::Failed("Job already finished".to_string())
    }
}

struct NullSurface;

impl DisplaySurface for NullSurface {
    fn on_progress_message(&mut self, _text: &str) {}
    fn on_progress_percent(&mut self, _percent: u8) {}
    fn on_completed(&mut self, _output: &Path) {}
    fn on_failed(&mut self, _message: &str) {}
}
