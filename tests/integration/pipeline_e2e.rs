// End-to-end runs of the real ffmpeg backend on a synthetic marker clip

use std::path::PathBuf;
use tempfile::TempDir;
use virew::config::PipelineConfig;
use virew::engine::probe::MediaSource;
use virew::engine::{JobController, JobEvent, JobOutcome, JobRequest, Mode, TrimRange};

use crate::common::ffmpeg_runner::*;
use crate::require_ffmpeg;

fn software_config() -> PipelineConfig {
    PipelineConfig {
        use_hardware: false,
        threads: Some(2),
        // Lossless, so the luma markers come back exactly
        crf: 0,
        ..PipelineConfig::default()
    }
}

fn create_marker_video(temp_dir: &TempDir) -> PathBuf {
    let path = temp_dir.path().join("markers.mp4");
    generate_marker_video(&path).expect("Failed to generate marker video");
    path
}

fn run(request: JobRequest) -> (JobOutcome, Vec<JobEvent>) {
    let controller = JobController::new(software_config());
    let mut handle = controller.submit(request).expect("submit");
    let mut events = Vec::new();
    while let Some(event) = handle.recv() {
        events.push(event);
    }
    let outcome = match events.last() {
        Some(JobEvent::Completed { output }) => JobOutcome::Completed(output.clone()),
        Some(JobEvent::Failed { message }) => JobOutcome::Failed(message.clone()),
        other => panic!("unexpected last event: {:?}", other),
    };
    (outcome, events)
}

#[test]
fn test_marker_fixture_is_readable() {
    require_ffmpeg!();
    let temp_dir = TempDir::new().unwrap();
    let input = create_marker_video(&temp_dir);

    let lumas = decode_frame_lumas(&input).unwrap();
    assert_eq!(lumas.len() as u64, MARKER_FRAMES);
    assert_marker(lumas[0], 0, "first source frame");
    assert_marker(lumas[39], 39, "source frame 39");
}

#[test]
fn test_reverse_trimmed_range() {
    require_ffmpeg!();
    let temp_dir = TempDir::new().unwrap();
    let input = create_marker_video(&temp_dir);

    let request = JobRequest::new(&input, Mode::Reverse).with_trim(TrimRange::new(10, 40));
    let (outcome, events) = run(request);

    let output = match outcome {
        JobOutcome::Completed(path) => path,
        JobOutcome::Failed(msg) => panic!("reverse failed: {}", msg),
    };
    assert_eq!(output, temp_dir.path().join("markers_REW.mp4"));

    let lumas = decode_frame_lumas(&output).unwrap();
    assert_eq!(lumas.len(), 30, "reversed range should keep 30 frames");
    assert_marker(lumas[0], 39, "first output frame");
    assert_marker(lumas[29], 10, "last output frame");
    for (offset, luma) in lumas.iter().enumerate() {
        assert_marker(*luma, 39 - offset as u64, "reversed frame");
    }

    assert!(events.contains(&JobEvent::Progress { percent: 100 }));
}

#[test]
fn test_boomerang_trimmed_range() {
    require_ffmpeg!();
    let temp_dir = TempDir::new().unwrap();
    let input = create_marker_video(&temp_dir);

    let request = JobRequest::new(&input, Mode::Boomerang).with_trim(TrimRange::new(10, 40));
    let (outcome, _) = run(request);

    let output = match outcome {
        JobOutcome::Completed(path) => path,
        JobOutcome::Failed(msg) => panic!("boomerang failed: {}", msg),
    };
    assert_eq!(output, temp_dir.path().join("markers_boomerang.mp4"));
    assert!(
        !temp_dir.path().join("markers_temp_rev.mp4").exists(),
        "temporary reversed clip should be removed"
    );

    let lumas = decode_frame_lumas(&output).unwrap();
    assert!(
        (59..=61).contains(&lumas.len()),
        "boomerang should be twice the trimmed length, got {}",
        lumas.len()
    );
    assert_marker(lumas[0], 10, "first forward frame");
    assert_marker(lumas[29], 39, "last forward frame");
    assert_marker(lumas[30], 39, "first reversed frame");
    assert_marker(*lumas.last().unwrap(), 10, "last reversed frame");

    // Only the output and the source remain
    let mut names: Vec<String> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["markers.mp4", "markers_boomerang.mp4"]);
}

#[test]
fn test_reverse_twice_restores_order() {
    require_ffmpeg!();
    let temp_dir = TempDir::new().unwrap();
    let input = create_marker_video(&temp_dir);

    let request = JobRequest::new(&input, Mode::Reverse).with_trim(TrimRange::new(10, 40));
    let (first, _) = run(request);
    let JobOutcome::Completed(reversed) = first else {
        panic!("first reverse failed");
    };

    let (second, _) = run(JobRequest::new(&reversed, Mode::Reverse));
    let JobOutcome::Completed(restored) = second else {
        panic!("second reverse failed");
    };
    assert_eq!(restored, temp_dir.path().join("markers_REW_REW.mp4"));

    let lumas = decode_frame_lumas(&restored).unwrap();
    assert_eq!(lumas.len(), 30);
    for (offset, luma) in lumas.iter().enumerate() {
        assert_marker(*luma, 10 + offset as u64, "restored frame");
    }
}

#[test]
fn test_reloaded_output_probes_like_source() {
    require_ffmpeg!();
    let temp_dir = TempDir::new().unwrap();
    let input = create_marker_video(&temp_dir);

    let (outcome, _) = run(JobRequest::new(&input, Mode::Reverse));
    let JobOutcome::Completed(output) = outcome else {
        panic!("reverse failed");
    };

    let source = MediaSource::open("ffprobe".as_ref(), &input).unwrap();
    let result = MediaSource::open("ffprobe".as_ref(), &output).unwrap();
    assert_eq!(result.info().width, source.info().width);
    assert!((result.fps() - 25.0).abs() < 0.01);
    assert!(result.info().has_audio);
    assert!((result.total_frames() as i64 - MARKER_FRAMES as i64).abs() <= 1);
}

#[test]
fn test_missing_source_fails() {
    let temp_dir = TempDir::new().unwrap();
    let (outcome, _) = run(JobRequest::new(temp_dir.path().join("nope.mp4"), Mode::Reverse));
    match outcome {
        JobOutcome::Failed(msg) => assert!(msg.contains("not found"), "{}", msg),
        JobOutcome::Completed(_) => panic!("missing source should fail"),
    }
}

#[test]
fn test_garbage_source_is_unreadable() {
    require_ffmpeg!();
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("garbage.mp4");
    std::fs::write(&input, b"definitely not a video").unwrap();

    let (outcome, _) = run(JobRequest::new(&input, Mode::Boomerang));
    match outcome {
        JobOutcome::Failed(msg) => assert!(msg.starts_with("Cannot open"), "{}", msg),
        JobOutcome::Completed(_) => panic!("garbage source should fail"),
    }
    assert!(!temp_dir.path().join("garbage_temp_rev.mp4").exists());
}
