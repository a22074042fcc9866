use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use virew::config::PipelineConfig;
use virew::engine::hardware;
use virew::engine::preview::{self, default_preview_path};
use virew::engine::probe::MediaSource;
use virew::engine::{
    DisplaySurface, JobController, JobEvent, JobOutcome, JobRequest, Mode, TrimRange,
};

pub fn run(cli: Cli) {
    let config = cli.encode.to_config();

    let result = match cli.command {
        Some(Commands::CheckFfmpeg) => handle_check_ffmpeg(&config),
        Some(Commands::Encoders) => handle_encoders(&config),
        Some(Commands::Probe { file }) => handle_probe(&file, &config),
        Some(Commands::Preview {
            file,
            frame,
            output,
        }) => handle_preview(&file, frame, output, &config),
        Some(Commands::ShowConfig) => handle_show_config(&config),
        None => match cli.file {
            Some(file) => handle_transform(
                file,
                Mode::from_boomerang(cli.boomerang),
                trim_range(cli.start_frame, cli.end_frame),
                config,
                cli.json,
            ),
            None => {
                eprintln!("Error: no input file given (see --help)");
                process::exit(2);
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Frame interval from the CLI flags; the whole clip when neither is given
fn trim_range(start_frame: Option<u64>, end_frame: Option<u64>) -> Option<TrimRange> {
    if start_frame.is_none() && end_frame.is_none() {
        return None;
    }
    // The resolver clamps the open end to the source's frame count
    Some(TrimRange::new(
        start_frame.unwrap_or(0),
        end_frame.unwrap_or(u64::MAX),
    ))
}

/// Terminal display: a rewriting progress line on stderr, or JSON lines on stdout
struct CliSurface {
    json: bool,
    progress_line_open: bool,
}

impl CliSurface {
    fn new(json: bool) -> Self {
        Self {
            json,
            progress_line_open: false,
        }
    }

    fn emit_json(&self, event: &JobEvent) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!(error = %e, "failed to serialize event"),
        }
    }

    fn close_progress_line(&mut self) {
        if self.progress_line_open {
            eprintln!();
            self.progress_line_open = false;
        }
    }
}

impl DisplaySurface for CliSurface {
    fn on_progress_message(&mut self, text: &str) {
        if self.json {
            self.emit_json(&JobEvent::Message {
                text: text.to_string(),
            });
            return;
        }
        self.close_progress_line();
        eprintln!("{}", text);
    }

    fn on_progress_percent(&mut self, percent: u8) {
        if self.json {
            self.emit_json(&JobEvent::Progress { percent });
            return;
        }
        eprint!("\rProgress: {:>3}%", percent);
        let _ = std::io::stderr().flush();
        self.progress_line_open = true;
    }

    fn on_completed(&mut self, output: &Path) {
        if self.json {
            self.emit_json(&JobEvent::Completed {
                output: output.to_path_buf(),
            });
            return;
        }
        self.close_progress_line();
        println!("Saved: {}", output.display());
    }

    fn on_failed(&mut self, message: &str) {
        if self.json {
            self.emit_json(&JobEvent::Failed {
                message: message.to_string(),
            });
            return;
        }
        self.close_progress_line();
        eprintln!("Failed: {}", message);
    }
}

fn handle_transform(
    file: PathBuf,
    mode: Mode,
    trim: Option<TrimRange>,
    config: PipelineConfig,
    json: bool,
) -> Result<()> {
    let mut request = JobRequest::new(file, mode);
    if let Some(trim) = trim {
        request = request.with_trim(trim);
    }

    let controller = JobController::new(config);
    let mut handle = controller
        .submit(request)
        .context("Failed to start job")?;

    let mut surface = CliSurface::new(json);
    match handle.drive(&mut surface) {
        JobOutcome::Completed(_) => Ok(()),
        // Already reported by the surface
        JobOutcome::Failed(_) => process::exit(1),
    }
}

fn handle_check_ffmpeg(config: &PipelineConfig) -> Result<()> {
    let version = virew::engine::ffmpeg_version(&config.ffmpeg_path)?;
    println!("ffmpeg found: {}", version);
    let probe_version = virew::engine::ffprobe_version(&config.ffprobe_path)?;
    println!("ffprobe found: {}", probe_version);
    Ok(())
}

fn handle_encoders(config: &PipelineConfig) -> Result<()> {
    // Probe failures are logged and fall back to libx264
    let profile = hardware::select_profile(config);

    println!("Encoder: {}", profile.vendor.display_name());
    println!("Codec:   {}", profile.codec);
    println!("Threads: {}", profile.thread_count);
    println!("Args:    {}", profile.ffmpeg_args().join(" "));
    Ok(())
}

fn handle_probe(file: &Path, config: &PipelineConfig) -> Result<()> {
    let source = MediaSource::open(&config.ffprobe_path, file)
        .with_context(|| format!("Failed to probe {}", file.display()))?;
    let info = source.info();

    println!("File:       {}", file.display());
    println!("Resolution: {}x{}", info.width, info.height);
    println!("FPS:        {:.3}", info.fps);
    println!("Duration:   {:.2} seconds", info.duration);
    println!("Frames:     {}", info.total_frames);
    println!("Audio:      {}", if info.has_audio { "yes" } else { "no" });
    Ok(())
}

fn handle_preview(
    file: &Path,
    frame: u64,
    output: Option<PathBuf>,
    config: &PipelineConfig,
) -> Result<()> {
    let source = MediaSource::open(&config.ffprobe_path, file)
        .with_context(|| format!("Failed to open {}", file.display()))?;
    let output = output.unwrap_or_else(|| default_preview_path(file, frame));

    let preview = preview::extract_frame(&config.ffmpeg_path, &source, frame, &output)
        .context("Failed to extract frame")?;

    println!("{}  [{}]", preview.label(), preview.timecode());
    println!("Saved: {}", preview.image.display());
    Ok(())
}

fn handle_show_config(config: &PipelineConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{}", json);
    Ok(())
}
