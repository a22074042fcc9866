mod clip;
mod ffmpeg_cmd;
mod ffmpeg_info;
mod output;
mod range;
mod types;

pub use clip::{Clip, Timeline};
pub use ffmpeg_cmd::{
    audio_filter_graph, build_audio_cmd, build_frame_extract_cmd, build_video_cmd,
    format_ffmpeg_cmd, run_ffmpeg, stderr_tail, video_filter_graph,
};
pub use ffmpeg_info::{ffmpeg_version, ffprobe_version};
pub use output::{derive_output_path, temp_reversed_path};
pub use range::{
    FALLBACK_FPS, ResolvedRange, TimeRange, TrimRange, effective_fps, resolve, resolve_with_guard,
};
pub use types::{Job, JobRequest, JobStatus, Mode, ProgressKey, ProgressParser, Stage};
