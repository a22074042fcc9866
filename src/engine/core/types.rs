use super::output::{derive_output_path, temp_reversed_path};
use super::range::TrimRange;
use crate::engine::hardware::EncodingProfile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Reversed clip only
    Reverse,
    /// Forward clip followed by its reversed copy
    Boomerang,
}

impl Mode {
    pub fn from_boomerang(boomerang: bool) -> Self {
        if boomerang {
            Self::Boomerang
        } else {
            Self::Reverse
        }
    }

    /// Number of Write stages a job in this mode runs
    pub fn write_count(&self) -> usize {
        match self {
            Self::Reverse => 1,
            Self::Boomerang => 2,
        }
    }
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    Load,
    Trim,
    Reverse,
    WriteTemp,
    ReloadTemp,
    Concatenate,
    Write,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Init => "init",
            Self::Load => "load",
            Self::Trim => "trim",
            Self::Reverse => "reverse",
            Self::WriteTemp => "write-temp",
            Self::ReloadTemp => "reload-temp",
            Self::Concatenate => "concatenate",
            Self::Write => "write",
            Self::Cleanup => "cleanup",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending,
    Running(Stage),
    Done,
    Failed,
}

/// What the display surface asks for
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    pub source: PathBuf,
    pub mode: Mode,
    /// Frame interval to keep; the whole clip when `None`
    pub trim: Option<TrimRange>,
}

impl JobRequest {
    pub fn new(source: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            source: source.into(),
            mode,
            trim: None,
        }
    }

    pub fn with_trim(mut self, trim: TrimRange) -> Self {
        self.trim = Some(trim);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub source: PathBuf,
    pub mode: Mode,
    pub trim: Option<TrimRange>,
    pub output_path: PathBuf,
    /// Boomerang intermediate; unused in reverse mode
    pub temp_path: PathBuf,
    pub profile: EncodingProfile,
    pub status: JobStatus,
}

impl Job {
    pub fn new(request: JobRequest, profile: EncodingProfile) -> Self {
        Self::with_id(Uuid::new_v4(), request, profile)
    }

    pub fn with_id(id: Uuid, request: JobRequest, profile: EncodingProfile) -> Self {
        let output_path = derive_output_path(&request.source, request.mode);
        let temp_path = temp_reversed_path(&request.source);
        Self {
            id,
            source: request.source,
            mode: request.mode,
            trim: request.trim,
            output_path,
            temp_path,
            profile,
            status: JobStatus::Pending,
        }
    }
}

/// Parser for ffmpeg progress output (key=value format)
#[derive(Debug, Default, Clone)]
pub struct ProgressParser {
    pub frame: Option<u64>,
    pub out_time_us: Option<u64>,
}

/// Which counter a `-progress` line updated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKey {
    Frame,
    OutTime,
    /// `progress=end`: the encoder flushed its last packet
    End,
    Other,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single line of ffmpeg progress output
    pub fn parse_line(&mut self, line: &str) -> ProgressKey {
        let Some((key, value)) = line.split_once('=') else {
            return ProgressKey::Other;
        };
        let value = value.trim();
        match key.trim() {
            "frame" => {
                if let Ok(frame) = value.parse::<u64>() {
                    self.frame = Some(frame);
                    return ProgressKey::Frame;
                }
            }
            "out_time_us" => {
                // "N/A" before the first packet, occasionally negative at start
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_us = Some(us.max(0) as u64);
                    return ProgressKey::OutTime;
                }
            }
            "progress" if value == "end" => return ProgressKey::End,
            _ => {}
        }
        ProgressKey::Other
    }

    /// Output time in seconds
    pub fn out_time_s(&self) -> Option<f64> {
        self.out_time_us.map(|us| us as f64 / 1_000_000.0)
    }
}
