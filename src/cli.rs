use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use virew::config::{PipelineConfig, ProgressMode, QualityPolicy};

#[derive(Parser)]
#[command(name = "virew")]
#[command(about = "Reverse a video clip or turn it into a boomerang loop", long_about = None)]
pub struct Cli {
    /// Video file to transform
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Forward clip followed by its reversed copy
    #[arg(long)]
    pub boomerang: bool,

    /// First frame to keep (inclusive)
    #[arg(long, value_name = "N")]
    pub start_frame: Option<u64>,

    /// Frame to stop at (exclusive); defaults to the last frame
    #[arg(long, value_name = "M")]
    pub end_frame: Option<u64>,

    #[command(flatten)]
    pub encode: EncodeArgs,

    /// Print events as JSON lines instead of a progress line
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Options that shape the pipeline configuration
#[derive(clap::Args, Clone)]
pub struct EncodeArgs {
    /// Preset family for the selected encoder
    #[arg(long, value_enum, default_value_t = QualityArg::Fast)]
    pub quality: QualityArg,

    /// Base quality value (libx264 CRF; hardware encoders derive theirs from it)
    #[arg(long, default_value_t = 18, value_parser = clap::value_parser!(u8).range(0..=51))]
    pub crf: u8,

    /// Seconds to drop from the end of the source before reversing
    #[arg(long, value_name = "SECS")]
    pub tail_guard: Option<f64>,

    /// How write stages map onto the progress percentage
    #[arg(long, value_enum, default_value_t = ProgressArg::PerWrite)]
    pub progress: ProgressArg,

    /// Encoder threads (defaults to the logical CPU count)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Skip hardware encoder detection and use libx264
    #[arg(long)]
    pub software: bool,

    /// ffmpeg executable
    #[arg(long, value_name = "PATH", default_value = "ffmpeg", global = true)]
    pub ffmpeg: PathBuf,

    /// ffprobe executable
    #[arg(long, value_name = "PATH", default_value = "ffprobe", global = true)]
    pub ffprobe: PathBuf,

    /// Extra ffmpeg arguments appended to every video encode
    #[arg(long, value_name = "STR", default_value = "", allow_hyphen_values = true)]
    pub extra_args: String,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum QualityArg {
    Fast,
    Balanced,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ProgressArg {
    PerWrite,
    Overall,
}

impl EncodeArgs {
    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            ffmpeg_path: self.ffmpeg.clone(),
            ffprobe_path: self.ffprobe.clone(),
            quality: match self.quality {
                QualityArg::Fast => QualityPolicy::Fast,
                QualityArg::Balanced => QualityPolicy::Balanced,
            },
            crf: self.crf,
            tail_guard_secs: self.tail_guard,
            progress_mode: match self.progress {
                ProgressArg::PerWrite => ProgressMode::PerWrite,
                ProgressArg::Overall => ProgressMode::Overall,
            },
            threads: self.threads,
            use_hardware: !self.software,
            extra_args: self.extra_args.clone(),
            ..PipelineConfig::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check if ffmpeg and ffprobe are installed
    CheckFfmpeg,

    /// Show which H.264 encoder would be used and its arguments
    Encoders,

    /// Probe a video file for its frame rate, duration and frame count
    Probe {
        /// Path to the video file
        file: PathBuf,
    },

    /// Extract one frame as an image, to pick trim points
    Preview {
        /// Path to the video file
        file: PathBuf,

        /// Frame index to extract
        #[arg(long)]
        frame: u64,

        /// Image to write (defaults to <stem>_frame<N>.png beside the source)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the effective pipeline configuration as JSON
    ShowConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
