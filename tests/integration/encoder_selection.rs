// Encoder selection through the pipeline's Init stage

use std::sync::mpsc;
use tempfile::TempDir;
use uuid::Uuid;
use virew::config::{PipelineConfig, ProgressMode, QualityPolicy};
use virew::engine::hardware::{EncoderVendor, select_profile, vendor_from_encoders};
use virew::engine::{JobRequest, Mode, ProgressBridge, TransformPipeline};

use crate::common::RecordingBackend;
use crate::common::ffmpeg_runner::is_ffmpeg_available;

const NVENC_LINE: &str = " V....D h264_nvenc           NVIDIA NVENC H.264 encoder (codec h264)";
const AMF_LINE: &str = " V....D h264_amf             AMD AMF H.264 Encoder (codec h264)";
const QSV_LINE: &str = " V..... h264_qsv             H.264 / AVC (Intel Quick Sync Video acceleration) (codec h264)";

fn init_with(encoders: Result<String, String>, config: &PipelineConfig) -> EncoderVendor {
    let backend = RecordingBackend {
        encoders,
        ..RecordingBackend::new()
    };
    let dir = TempDir::new().unwrap();
    let (tx, _rx) = mpsc::channel();
    let mut bridge = ProgressBridge::new(tx, ProgressMode::PerWrite, 1);
    let job = TransformPipeline::new(&backend, config).init(
        Uuid::new_v4(),
        JobRequest::new(dir.path().join("clip.mp4"), Mode::Reverse),
        &mut bridge,
    );
    job.profile.vendor
}

#[test]
fn test_no_markers_selects_software() {
    let config = PipelineConfig::default();
    assert_eq!(
        init_with(Ok(" V....D libx264 libx264 H.264".to_string()), &config),
        EncoderVendor::Software
    );
}

#[test]
fn test_only_nvidia_marker_selects_nvidia() {
    let config = PipelineConfig::default();
    assert_eq!(init_with(Ok(NVENC_LINE.to_string()), &config), EncoderVendor::Nvidia);
}

#[test]
fn test_priority_order_is_honored() {
    let config = PipelineConfig::default();
    let all = format!("{}\n{}\n{}", QSV_LINE, AMF_LINE, NVENC_LINE);
    assert_eq!(init_with(Ok(all), &config), EncoderVendor::Nvidia);

    let amd_and_intel = format!("{}\n{}", QSV_LINE, AMF_LINE);
    assert_eq!(init_with(Ok(amd_and_intel), &config), EncoderVendor::Amd);

    assert_eq!(init_with(Ok(QSV_LINE.to_string()), &config), EncoderVendor::Intel);
}

#[test]
fn test_probe_failure_selects_software() {
    let config = PipelineConfig::default();
    assert_eq!(
        init_with(Err("ffmpeg exploded".to_string()), &config),
        EncoderVendor::Software
    );
}

#[test]
fn test_profile_follows_quality_policy() {
    let config = PipelineConfig {
        quality: QualityPolicy::Balanced,
        threads: Some(3),
        ..PipelineConfig::default()
    };
    let backend = RecordingBackend {
        encoders: Ok(NVENC_LINE.to_string()),
        ..RecordingBackend::new()
    };
    let (tx, _rx) = mpsc::channel();
    let mut bridge = ProgressBridge::new(tx, ProgressMode::PerWrite, 1);
    let job = TransformPipeline::new(&backend, &config).init(
        Uuid::new_v4(),
        JobRequest::new("clip.mp4", Mode::Reverse),
        &mut bridge,
    );
    assert_eq!(job.profile.preset, "p4");
    assert_eq!(job.profile.thread_count, 3);
}

#[test]
fn test_real_ffmpeg_probe_never_fails() {
    // Whatever the host has, selection yields a usable profile
    let profile = select_profile(&PipelineConfig::default());
    if !is_ffmpeg_available() {
        assert_eq!(profile.vendor, EncoderVendor::Software);
    }
    assert!(profile.thread_count >= 1);
    assert!(!profile.codec.is_empty());
}

#[test]
fn test_missing_ffmpeg_binary_falls_back() {
    let config = PipelineConfig {
        ffmpeg_path: "/nonexistent/ffmpeg-binary".into(),
        ..PipelineConfig::default()
    };
    assert_eq!(select_profile(&config).vendor, EncoderVendor::Software);
    assert_eq!(vendor_from_encoders(""), EncoderVendor::Software);
}
