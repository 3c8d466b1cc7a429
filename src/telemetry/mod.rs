//! In-memory telemetry buffer and post-mortem log emission
//!
//! The supervisor owns one recorder per run. Samples accumulate while the
//! child lives; after reap the whole record is serialized as a single JSON
//! document under `logs/`. The timeline uses parallel arrays rather than an
//! array of records for compactness and trivial plotting ingest.

use crate::errors::{LauncherError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Sample cap: 100 seconds of runtime at the 100 ms cadence. Beyond this the
/// timeline saturates but the summary keeps tracking peaks.
pub const MAX_SAMPLES: usize = 1000;

/// One liveness sample taken while the child runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Milliseconds since supervisor start
    pub time_ms: u64,
    /// Instantaneous CPU-percent estimate over the last interval
    pub cpu_percent: u64,
    /// Peak virtual memory reading, in KiB
    pub memory_kb: u64,
}

/// Parallel-array form of the sample sequence, as serialized
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub time_ms: Vec<u64>,
    pub cpu_percent: Vec<u64>,
    pub memory_kb: Vec<u64>,
}

/// Post-mortem record of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub runtime_ms: u64,
    pub peak_cpu: u64,
    pub peak_memory_kb: u64,
    pub page_faults_minor: u64,
    pub page_faults_major: u64,
    /// "SIG<n>" when the child died to a signal, empty otherwise
    pub termination: String,
    /// "Unknown(SIGSYS)" when the filter killed the child, empty otherwise
    pub blocked_syscall: String,
    /// One of EXITED(<code>), SECURITY_VIOLATION, KILLED_BY_OS, SIGNALED
    pub exit_reason: String,
}

/// The complete on-disk log document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    pub pid: i32,
    pub program: String,
    pub profile: String,
    pub timeline: Timeline,
    pub summary: Summary,
}

/// Append-only sample buffer, exclusively owned by the supervisor
#[derive(Debug, Default)]
pub struct TelemetryRecorder {
    samples: Vec<Sample>,
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    /// Append a sample. Silently dropped once the buffer is full.
    pub fn add_sample(&mut self, time_ms: u64, cpu_percent: u64, memory_kb: u64) {
        if self.samples.len() >= MAX_SAMPLES {
            return;
        }
        self.samples.push(Sample {
            time_ms,
            cpu_percent,
            memory_kb,
        });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Highest per-sample CPU estimate recorded so far
    pub fn peak_cpu(&self) -> u64 {
        self.samples.iter().map(|s| s.cpu_percent).max().unwrap_or(0)
    }

    /// Highest memory reading recorded so far
    pub fn peak_memory_kb(&self) -> u64 {
        self.samples.iter().map(|s| s.memory_kb).max().unwrap_or(0)
    }

    /// Timestamp of the newest sample, if any
    pub fn last_time_ms(&self) -> Option<u64> {
        self.samples.last().map(|s| s.time_ms)
    }

    /// Convert the buffer to its serialized parallel-array layout
    pub fn timeline(&self) -> Timeline {
        Timeline {
            time_ms: self.samples.iter().map(|s| s.time_ms).collect(),
            cpu_percent: self.samples.iter().map(|s| s.cpu_percent).collect(),
            memory_kb: self.samples.iter().map(|s| s.memory_kb).collect(),
        }
    }
}

/// Write one run log under `dir`, creating the directory if absent.
/// The filename carries the wall-clock second the log was written.
pub fn write_log(dir: &Path, log: &RunLog) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("run_{}.json", Utc::now().timestamp()));
    let json = serde_json::to_string_pretty(log)
        .map_err(|e| LauncherError::Telemetry(format!("Failed to serialize run log: {}", e)))?;
    fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_log() -> RunLog {
        let mut recorder = TelemetryRecorder::new();
        recorder.add_sample(100, 12, 2048);
        recorder.add_sample(200, 50, 4096);
        recorder.add_sample(300, 25, 4096);
        RunLog {
            pid: 4321,
            program: "/usr/bin/true".to_string(),
            profile: "strict".to_string(),
            timeline: recorder.timeline(),
            summary: Summary {
                runtime_ms: 350,
                peak_cpu: 50,
                peak_memory_kb: 4096,
                page_faults_minor: 150,
                page_faults_major: 2,
                termination: String::new(),
                blocked_syscall: String::new(),
                exit_reason: "EXITED(0)".to_string(),
            },
        }
    }

    #[test]
    fn test_recorder_appends_in_order() {
        let mut recorder = TelemetryRecorder::new();
        recorder.add_sample(100, 10, 1000);
        recorder.add_sample(200, 20, 2000);
        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.last_time_ms(), Some(200));
    }

    #[test]
    fn test_recorder_drops_beyond_cap() {
        let mut recorder = TelemetryRecorder::new();
        for i in 0..(MAX_SAMPLES as u64 + 50) {
            recorder.add_sample(i * 100, 0, 0);
        }
        assert_eq!(recorder.len(), MAX_SAMPLES);
        assert_eq!(recorder.last_time_ms(), Some((MAX_SAMPLES as u64 - 1) * 100));
    }

    #[test]
    fn test_recorder_peaks() {
        let mut recorder = TelemetryRecorder::new();
        recorder.add_sample(100, 10, 5000);
        recorder.add_sample(200, 90, 3000);
        recorder.add_sample(300, 40, 8000);
        assert_eq!(recorder.peak_cpu(), 90);
        assert_eq!(recorder.peak_memory_kb(), 8000);
    }

    #[test]
    fn test_empty_recorder_peaks_are_zero() {
        let recorder = TelemetryRecorder::new();
        assert!(recorder.is_empty());
        assert_eq!(recorder.peak_cpu(), 0);
        assert_eq!(recorder.peak_memory_kb(), 0);
        assert_eq!(recorder.last_time_ms(), None);
    }

    #[test]
    fn test_timeline_arrays_stay_parallel() {
        let mut recorder = TelemetryRecorder::new();
        for i in 0..7u64 {
            recorder.add_sample(i * 100, i, i * 10);
        }
        let timeline = recorder.timeline();
        assert_eq!(timeline.time_ms.len(), timeline.cpu_percent.len());
        assert_eq!(timeline.time_ms.len(), timeline.memory_kb.len());
        assert_eq!(timeline.time_ms.len(), 7);
    }

    #[test]
    fn test_timeline_timestamps_non_decreasing() {
        let mut recorder = TelemetryRecorder::new();
        recorder.add_sample(100, 0, 0);
        recorder.add_sample(100, 0, 0);
        recorder.add_sample(250, 0, 0);
        let timeline = recorder.timeline();
        assert!(timeline.time_ms.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_write_log_creates_directory_and_file() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("logs");
        let path = write_log(&logs, &sample_log()).unwrap();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("run_"));
        assert!(path.extension().unwrap() == "json");
    }

    #[test]
    fn test_write_log_is_idempotent_on_directory() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("logs");
        write_log(&logs, &sample_log()).unwrap();
        assert!(write_log(&logs, &sample_log()).is_ok());
    }

    #[test]
    fn test_run_log_round_trips() {
        let log = sample_log();
        let json = serde_json::to_string(&log).unwrap();
        let parsed: RunLog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, log);
    }

    #[test]
    fn test_log_schema_field_names() {
        let json = serde_json::to_value(sample_log()).unwrap();
        assert!(json.get("pid").is_some());
        assert!(json.get("program").is_some());
        assert!(json.get("profile").is_some());
        let timeline = json.get("timeline").unwrap();
        assert!(timeline.get("time_ms").is_some());
        assert!(timeline.get("cpu_percent").is_some());
        assert!(timeline.get("memory_kb").is_some());
        let summary = json.get("summary").unwrap();
        for field in [
            "runtime_ms",
            "peak_cpu",
            "peak_memory_kb",
            "page_faults_minor",
            "page_faults_major",
            "termination",
            "blocked_syscall",
            "exit_reason",
        ] {
            assert!(summary.get(field).is_some(), "missing summary.{}", field);
        }
    }
}
