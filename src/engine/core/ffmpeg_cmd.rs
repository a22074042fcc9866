use super::clip::{Clip, Timeline};
use super::types::{ProgressKey, ProgressParser};
use crate::engine::hardware::EncodingProfile;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Lines of ffmpeg stderr kept in encode failure messages
const STDERR_TAIL_LINES: usize = 12;

fn secs(value: f64) -> String {
    format!("{:.6}", value)
}

fn video_chain(clip: &Clip, input: usize, label: &str) -> String {
    let mut filters = Vec::new();
    if let Some(window) = clip.window() {
        filters.push(format!(
            "trim=start={}:end={}",
            secs(window.start_seconds),
            secs(window.end_seconds)
        ));
    }
    filters.push("setpts=PTS-STARTPTS".to_string());
    if clip.is_reversed() {
        filters.push("reverse".to_string());
    }
    format!("[{}:v:0]{}[{}]", input, filters.join(","), label)
}

fn audio_chain(clip: &Clip, input: usize, label: &str) -> String {
    let mut filters = Vec::new();
    if let Some(window) = clip.window() {
        filters.push(format!(
            "atrim=start={}:end={}",
            secs(window.start_seconds),
            secs(window.end_seconds)
        ));
    }
    filters.push("asetpts=PTS-STARTPTS".to_string());
    if clip.is_reversed() {
        filters.push("areverse".to_string());
    }
    format!("[{}:a:0]{}[{}]", input, filters.join(","), label)
}

fn filter_graph(
    timeline: &Timeline,
    chain: fn(&Clip, usize, &str) -> String,
    prefix: &str,
    out: &str,
    concat_streams: &str,
) -> String {
    let clips = timeline.clips();
    if clips.len() == 1 {
        return chain(&clips[0], 0, out);
    }

    let mut parts = Vec::with_capacity(clips.len() + 1);
    let mut labels = String::new();
    for (idx, clip) in clips.iter().enumerate() {
        let label = format!("{}{}", prefix, idx);
        parts.push(chain(clip, idx, &label));
        labels.push_str(&format!("[{}]", label));
    }
    parts.push(format!(
        "{}concat=n={}:{}[{}]",
        labels,
        clips.len(),
        concat_streams,
        out
    ));
    parts.join(";")
}

/// `-filter_complex` graph producing `[vout]` from one input per clip
pub fn video_filter_graph(timeline: &Timeline) -> String {
    filter_graph(timeline, video_chain, "v", "vout", "v=1:a=0")
}

/// `-filter_complex` graph producing `[aout]` from one input per clip
pub fn audio_filter_graph(timeline: &Timeline) -> String {
    filter_graph(timeline, audio_chain, "a", "aout", "v=0:a=1")
}

fn add_inputs(cmd: &mut Command, timeline: &Timeline) {
    for clip in timeline.clips() {
        cmd.arg("-i").arg(clip.source());
    }
}

/// Apply additional user-provided FFmpeg arguments to the command.
/// Uses shell-style parsing so quoted strings with spaces are preserved.
fn apply_additional_args(cmd: &mut Command, additional_args: &str) {
    if additional_args.trim().is_empty() {
        return;
    }

    if let Some(args) = shlex::split(additional_args) {
        for arg in args {
            cmd.arg(arg);
        }
    } else {
        // If shlex fails to parse (unbalanced quotes), fall back to simple whitespace split
        for arg in additional_args.split_whitespace() {
            cmd.arg(arg);
        }
    }
}

/// Render the timeline's audio into a standalone file (the writer's side-file)
pub fn build_audio_cmd(
    ffmpeg: &Path,
    timeline: &Timeline,
    audio_codec: &str,
    output: &Path,
) -> Command {
    let mut cmd = Command::new(ffmpeg);
    cmd.arg("-hide_banner").arg("-nostdin");
    add_inputs(&mut cmd, timeline);
    cmd.arg("-filter_complex").arg(audio_filter_graph(timeline));
    cmd.arg("-map").arg("[aout]");
    cmd.arg("-vn");
    cmd.arg("-c:a").arg(audio_codec);
    cmd.arg("-y");
    cmd.arg(output);
    cmd
}

/// Encode the timeline's video, muxing in a pre-rendered audio file when given
pub fn build_video_cmd(
    ffmpeg: &Path,
    timeline: &Timeline,
    profile: &EncodingProfile,
    audio: Option<&Path>,
    extra_args: &str,
    output: &Path,
) -> Command {
    let mut cmd = Command::new(ffmpeg);
    cmd.arg("-hide_banner").arg("-nostdin");
    add_inputs(&mut cmd, timeline);
    if let Some(audio) = audio {
        cmd.arg("-i").arg(audio);
    }
    cmd.arg("-progress").arg("-").arg("-nostats");

    cmd.arg("-filter_complex").arg(video_filter_graph(timeline));
    cmd.arg("-map").arg("[vout]");
    if audio.is_some() {
        let audio_input = timeline.clips().len();
        cmd.arg("-map").arg(format!("{}:a:0", audio_input));
        cmd.arg("-c:a").arg("copy");
    }

    cmd.args(profile.ffmpeg_args());
    apply_additional_args(&mut cmd, extra_args);

    cmd.arg("-y");
    cmd.arg(output);
    cmd
}

/// Decode a single frame at `seconds` into an image file
pub fn build_frame_extract_cmd(
    ffmpeg: &Path,
    source: &Path,
    seconds: f64,
    output: &Path,
) -> Command {
    let mut cmd = Command::new(ffmpeg);
    cmd.arg("-hide_banner").arg("-nostdin");
    cmd.arg("-ss").arg(secs(seconds));
    cmd.arg("-i").arg(source);
    cmd.arg("-frames:v").arg("1");
    cmd.arg("-y");
    cmd.arg(output);
    cmd
}

/// Shell-quoted rendering of a command, for logs and dry runs
pub fn format_ffmpeg_cmd(cmd: &Command) -> String {
    let parts: Vec<String> = std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|s| s.to_string_lossy().to_string())
        .collect();

    shlex::try_join(parts.iter().map(String::as_str)).unwrap_or_else(|_| parts.join(" "))
}

/// Last few lines of ffmpeg's stderr
pub fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Run an ffmpeg command to completion, feeding each `-progress` line to
/// `on_progress`. Returns the exit status and the captured stderr.
pub fn run_ffmpeg<F>(mut cmd: Command, mut on_progress: F) -> std::io::Result<(ExitStatus, String)>
where
    F: FnMut(ProgressKey, &ProgressParser),
{
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    tracing::debug!(command = %format_ffmpeg_cmd(&cmd), "spawning ffmpeg");
    let mut child = cmd.spawn()?;

    let stderr = child.stderr.take();
    let stderr_thread = std::thread::spawn(move || {
        let mut stderr_output = String::new();
        if let Some(stderr) = stderr {
            let reader = BufReader::new(stderr);
            for line in reader.lines().map_while(Result::ok) {
                stderr_output.push_str(&line);
                stderr_output.push('\n');
            }
        }
        stderr_output
    });

    let mut parser = ProgressParser::new();
    if let Some(stdout) = child.stdout.take() {
        let reader = BufReader::new(stdout);
        for line in reader.lines().map_while(Result::ok) {
            let key = parser.parse_line(&line);
            on_progress(key, &parser);
        }
    }

    let status = child.wait()?;
    let stderr_output = stderr_thread
        .join()
        .unwrap_or_else(|_| "Failed to capture stderr".to_string());

    Ok((status, stderr_output))
}
