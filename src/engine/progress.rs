// Progress bridge: turns encoder counters into job events

use serde::Serialize;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use crate::config::ProgressMode;

/// Events a running job sends to its handle, in production order.
/// `Completed` / `Failed` is always the last one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    Message { text: String },
    Progress { percent: u8 },
    Completed { output: PathBuf },
    Failed { message: String },
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

/// Which encoder counter an update came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// `out_time_us`, in seconds
    Time,
    /// `frame`
    FrameIndex,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterUpdate {
    pub counter: Counter,
    pub value: f64,
    /// Expected final value; updates without a positive total are dropped
    pub total: Option<f64>,
}

impl CounterUpdate {
    pub fn time(seconds: f64, total_seconds: f64) -> Self {
        Self {
            counter: Counter::Time,
            value: seconds,
            total: Some(total_seconds),
        }
    }

    pub fn frame(frame: u64, total_frames: u64) -> Self {
        Self {
            counter: Counter::FrameIndex,
            value: frame as f64,
            total: Some(total_frames as f64),
        }
    }

    /// Percentage of the total, floored and capped at 100
    pub fn percent(&self) -> Option<u8> {
        let total = self.total.filter(|t| t.is_finite() && *t > 0.0)?;
        if !self.value.is_finite() {
            return None;
        }
        let pct = (self.value.max(0.0) / total * 100.0).floor();
        Some(pct.min(100.0) as u8)
    }
}

pub struct ProgressBridge {
    tx: Sender<JobEvent>,
    mode: ProgressMode,
    write_index: usize,
    write_count: usize,
    /// Highest percentage sent since the last reset
    high_water: Option<u8>,
}

impl ProgressBridge {
    pub fn new(tx: Sender<JobEvent>, mode: ProgressMode, write_count: usize) -> Self {
        Self {
            tx,
            mode,
            write_index: 0,
            write_count: write_count.max(1),
            high_water: None,
        }
    }

    fn send(&self, event: JobEvent) {
        // The handle may be gone; the job still runs to completion
        let _ = self.tx.send(event);
    }

    /// Forward a status line verbatim
    pub fn message(&self, text: impl Into<String>) {
        let text = text.into();
        tracing::info!("{}", text);
        self.send(JobEvent::Message { text });
    }

    /// Report a job-level percentage directly (start and finish markers)
    pub fn percent(&mut self, percent: u8) {
        let percent = percent.min(100);
        self.high_water = Some(self.high_water.map_or(percent, |hw| hw.max(percent)));
        self.send(JobEvent::Progress { percent });
    }

    /// Enter Write stage `index` (0-based)
    pub fn begin_write(&mut self, index: usize) {
        self.write_index = index.min(self.write_count - 1);
        if self.mode == ProgressMode::PerWrite {
            self.high_water = None;
        }
    }

    fn job_percent(&self, stage_percent: u8) -> u8 {
        match self.mode {
            ProgressMode::PerWrite => stage_percent,
            ProgressMode::Overall => {
                let done = self.write_index * 100 + usize::from(stage_percent);
                (done / self.write_count).min(100) as u8
            }
        }
    }

    /// Feed one encoder counter. Percentages only move forward within a stage.
    pub fn on_counter(&mut self, update: CounterUpdate) {
        let Some(stage_percent) = update.percent() else {
            return;
        };
        let percent = self.job_percent(stage_percent);
        if self.high_water.is_some_and(|hw| percent <= hw) {
            return;
        }
        self.high_water = Some(percent);
        self.send(JobEvent::Progress { percent });
    }
}
