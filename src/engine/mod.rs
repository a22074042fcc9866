// Reverse / boomerang engine - independent of the CLI

pub mod backend;
pub mod cleanup;
pub mod core;
pub mod hardware;
pub mod pipeline;
pub mod preview;
pub mod probe;
pub mod progress;
pub mod worker;

pub use backend::{FfmpegBackend, MediaBackend};
pub use self::core::*;
pub use pipeline::TransformPipeline;
pub use progress::{JobEvent, ProgressBridge};
pub use worker::{DisplaySurface, JobController, JobHandle, JobOutcome};
