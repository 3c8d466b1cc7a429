//! Parent-side state machine
//!
//! Clone the child into new namespaces, poll its liveness at a fixed cadence
//! while accumulating telemetry, reap it, classify the termination and emit
//! exactly one log. Control flows one way after clone; the supervisor never
//! shares memory with the child.

use std::fmt;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};
use nix::sched::{CloneFlags, clone};
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{Gid, Pid, Uid};

use crate::errors::{LauncherError, Result};
use crate::execution::{RunConfig, child};
use crate::isolation::user_ns;
use crate::monitoring::proc::{ProcUsage, clock_ticks_per_second};
use crate::telemetry::{RunLog, Summary, TelemetryRecorder, write_log};

/// Poll cadence of the monitoring loop
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Stack handed to the cloned child; freed after reap
const CHILD_STACK_SIZE: usize = 1024 * 1024;

/// Final disposition of the child, derived from the reaped wait status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Normal exit with the given code
    Exited(i32),
    /// Killed by SIGSYS: the seccomp filter fired on a disallowed syscall
    SecurityViolation,
    /// Killed by SIGKILL, typically the OOM killer or a cgroup limit
    KilledByOs,
    /// Killed by any other fatal signal
    Signaled(i32),
}

impl ExitReason {
    /// Classify a reaped wait status. Stop/continue statuses never reach
    /// here; the monitoring loop only breaks on terminal ones.
    pub fn from_wait_status(status: WaitStatus) -> Result<Self> {
        match status {
            WaitStatus::Exited(_, code) => Ok(ExitReason::Exited(code)),
            WaitStatus::Signaled(_, Signal::SIGSYS, _) => Ok(ExitReason::SecurityViolation),
            WaitStatus::Signaled(_, Signal::SIGKILL, _) => Ok(ExitReason::KilledByOs),
            WaitStatus::Signaled(_, signal, _) => Ok(ExitReason::Signaled(signal as i32)),
            other => Err(LauncherError::ProcessMonitoring(format!(
                "unexpected terminal wait status: {:?}",
                other
            ))),
        }
    }

    /// "SIG<n>" when the child died to a signal, empty for a normal exit
    pub fn termination_signal(&self) -> String {
        match self {
            ExitReason::Exited(_) => String::new(),
            ExitReason::SecurityViolation => format!("SIG{}", libc::SIGSYS),
            ExitReason::KilledByOs => format!("SIG{}", libc::SIGKILL),
            ExitReason::Signaled(signal) => format!("SIG{}", signal),
        }
    }

    /// Informational label for a filter kill; the signal alone does not
    /// identify which syscall was blocked.
    pub fn blocked_syscall(&self) -> String {
        match self {
            ExitReason::SecurityViolation => "Unknown(SIGSYS)".to_string(),
            _ => String::new(),
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Exited(code) => write!(f, "EXITED({})", code),
            ExitReason::SecurityViolation => write!(f, "SECURITY_VIOLATION"),
            ExitReason::KilledByOs => write!(f, "KILLED_BY_OS"),
            ExitReason::Signaled(_) => write!(f, "SIGNALED"),
        }
    }
}

/// Outcome of a supervised run
#[derive(Debug)]
pub struct RunOutcome {
    /// Child PID as seen from the parent namespace
    pub pid: i32,
    pub reason: ExitReason,
    /// The full record that was (or failed to be) written to disk
    pub log: RunLog,
    /// Where the log landed; `None` if the write failed
    pub log_path: Option<PathBuf>,
}

/// What the monitoring loop accumulated up to the reap
struct Monitored {
    status: WaitStatus,
    recorder: TelemetryRecorder,
    runtime_ms: u64,
    peak_cpu: u64,
    peak_memory_kb: u64,
    minor_faults: u64,
    major_faults: u64,
}

/// Parent-side driver for one run
pub struct Supervisor {
    config: RunConfig,
    log_dir: PathBuf,
}

impl Supervisor {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            log_dir: PathBuf::from("logs"),
        }
    }

    /// Override the log directory (the default is `logs/` under the cwd)
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Run the child to completion and emit its telemetry log.
    ///
    /// Errors before the child exists (stack, clone) surface here with no
    /// log written; once the child is reaped a log is always attempted.
    pub fn run(self) -> Result<RunOutcome> {
        info!("preparing execution environment");

        let flags = self.config.profile.namespaces().to_clone_flags();
        let mut stack = vec![0u8; CHILD_STACK_SIZE];

        let mut child_config = Some(self.config.clone());
        let pid = spawn_child(
            Box::new(move || child::child_main(child_config.take().unwrap())),
            &mut stack,
            flags,
        )?;

        info!(
            "child launched with pid {} (profile: {})",
            pid,
            self.config.profile.name()
        );

        let started = Instant::now();
        let monitored = monitor(pid, started)?;
        let reason = ExitReason::from_wait_status(monitored.status)?;

        match reason {
            ExitReason::Exited(code) => info!("child exited with status {}", code),
            ExitReason::SecurityViolation => {
                warn!("child killed by SIGSYS: disallowed syscall blocked by the filter")
            }
            ExitReason::KilledByOs => warn!("child killed by SIGKILL (OOM or cgroup limit)"),
            ExitReason::Signaled(signal) => warn!("child killed by signal {}", signal),
        }

        let summary = Summary {
            runtime_ms: monitored.runtime_ms,
            peak_cpu: monitored.peak_cpu,
            peak_memory_kb: monitored.peak_memory_kb,
            page_faults_minor: monitored.minor_faults,
            page_faults_major: monitored.major_faults,
            termination: reason.termination_signal(),
            blocked_syscall: reason.blocked_syscall(),
            exit_reason: reason.to_string(),
        };

        let log = RunLog {
            pid: pid.as_raw(),
            program: self.config.program.clone(),
            profile: self.config.profile.name().to_string(),
            timeline: monitored.recorder.timeline(),
            summary,
        };

        let log_path = match write_log(&self.log_dir, &log) {
            Ok(path) => {
                info!("telemetry written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("failed to write telemetry log: {}", e);
                None
            }
        };

        Ok(RunOutcome {
            pid: pid.as_raw(),
            reason,
            log,
            log_path,
        })
    }
}

/// Clone the child into new namespaces with a sync pipe: the child blocks
/// until the parent has written its uid/gid mapping, so the mount steps see
/// a mapped namespace.
fn spawn_child(
    mut child_fn: Box<dyn FnMut() -> isize>,
    stack: &mut [u8],
    flags: CloneFlags,
) -> Result<Pid> {
    let (sync_read, sync_write) =
        nix::unistd::pipe().map_err(|e| LauncherError::Syscall(format!("pipe: {}", e)))?;
    let sync_read_raw = sync_read.as_raw_fd();
    let sync_write_raw = sync_write.as_raw_fd();

    let wrapped = Box::new(move || -> isize {
        // SAFETY: raw FD operations in the child right after clone
        unsafe {
            libc::close(sync_write_raw);
            let mut buf = [0u8; 1];
            libc::read(sync_read_raw, buf.as_mut_ptr() as *mut libc::c_void, 1);
            libc::close(sync_read_raw);
        }
        child_fn()
    });

    let result = unsafe { clone(wrapped, stack, flags, Some(Signal::SIGCHLD as i32)) };

    // Parent keeps only the write end
    drop(sync_read);

    match result {
        Ok(child_pid) => {
            let uid = Uid::current().as_raw();
            let gid = Gid::current().as_raw();
            if let Err(e) = user_ns::setup_user_namespace(child_pid, uid, gid) {
                warn!("user namespace mapping failed: {}", e);
            }

            // SAFETY: sync_write is a valid FD, writing 1 byte
            unsafe {
                let signal_byte: [u8; 1] = [1];
                libc::write(
                    sync_write.as_raw_fd(),
                    signal_byte.as_ptr() as *const libc::c_void,
                    1,
                );
            }
            drop(sync_write);
            Ok(child_pid)
        }
        Err(e) => Err(LauncherError::Namespace(format!("clone failed: {}", e))),
    }
}

/// Poll the child at the sample cadence until it is reaped.
///
/// Each pass attempts a non-blocking reap first; only a still-running child
/// is sampled, so no sample postdates the observed death.
fn monitor(pid: Pid, started: Instant) -> Result<Monitored> {
    let clk_tck = clock_ticks_per_second();
    let mut recorder = TelemetryRecorder::new();

    let mut total_ticks = 0u64;
    let mut minor_faults = 0u64;
    let mut major_faults = 0u64;
    let mut peak_cpu = 0u64;
    let mut peak_memory_kb = 0u64;
    let mut last_ticks = 0u64;
    let mut last_elapsed_ms = 0u64;

    let status = loop {
        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(status @ (WaitStatus::Exited(..) | WaitStatus::Signaled(..))) => break status,
            Ok(_) => {
                if let Ok(usage) = ProcUsage::read(pid.as_raw()) {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    total_ticks = usage.total_ticks();
                    minor_faults = usage.minor_faults;
                    major_faults = usage.major_faults;

                    let delta_ticks = total_ticks.saturating_sub(last_ticks);
                    let delta_ms = elapsed_ms.saturating_sub(last_elapsed_ms).max(1);
                    let cpu_percent = delta_ticks * 100_000 / (clk_tck * delta_ms);

                    if cpu_percent > peak_cpu {
                        peak_cpu = cpu_percent;
                    }
                    if usage.vm_peak_kb > peak_memory_kb {
                        peak_memory_kb = usage.vm_peak_kb;
                    }

                    recorder.add_sample(elapsed_ms, cpu_percent, usage.vm_peak_kb);
                    last_ticks = total_ticks;
                    last_elapsed_ms = elapsed_ms;
                }
                thread::sleep(SAMPLE_INTERVAL);
            }
            Err(e) => {
                return Err(LauncherError::Syscall(format!("waitpid failed: {}", e)));
            }
        }
    };

    let runtime_ms = started.elapsed().as_millis() as u64;

    // Definitive CPU figure: cumulative ticks over the whole wall-clock run.
    // Per-sample estimates can be coarse; the peak is the max of both.
    let overall_cpu = if runtime_ms > 0 {
        total_ticks * 100_000 / (clk_tck * runtime_ms)
    } else {
        0
    };
    if overall_cpu > peak_cpu {
        peak_cpu = overall_cpu;
    }

    Ok(Monitored {
        status,
        recorder,
        runtime_ms,
        peak_cpu,
        peak_memory_kb,
        minor_faults,
        major_faults,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Profile;

    #[test]
    fn test_classify_normal_exit() {
        let status = WaitStatus::Exited(Pid::from_raw(100), 0);
        assert_eq!(
            ExitReason::from_wait_status(status).unwrap(),
            ExitReason::Exited(0)
        );

        let status = WaitStatus::Exited(Pid::from_raw(100), 3);
        assert_eq!(
            ExitReason::from_wait_status(status).unwrap(),
            ExitReason::Exited(3)
        );
    }

    #[test]
    fn test_classify_sigsys_as_security_violation() {
        let status = WaitStatus::Signaled(Pid::from_raw(100), Signal::SIGSYS, false);
        assert_eq!(
            ExitReason::from_wait_status(status).unwrap(),
            ExitReason::SecurityViolation
        );
    }

    #[test]
    fn test_classify_sigkill_as_os_kill() {
        let status = WaitStatus::Signaled(Pid::from_raw(100), Signal::SIGKILL, false);
        assert_eq!(
            ExitReason::from_wait_status(status).unwrap(),
            ExitReason::KilledByOs
        );
    }

    #[test]
    fn test_classify_other_signal() {
        let status = WaitStatus::Signaled(Pid::from_raw(100), Signal::SIGTERM, false);
        assert_eq!(
            ExitReason::from_wait_status(status).unwrap(),
            ExitReason::Signaled(libc::SIGTERM)
        );
    }

    #[test]
    fn test_classify_rejects_non_terminal_status() {
        let status = WaitStatus::StillAlive;
        assert!(ExitReason::from_wait_status(status).is_err());
    }

    #[test]
    fn test_exit_reason_labels() {
        assert_eq!(ExitReason::Exited(0).to_string(), "EXITED(0)");
        assert_eq!(ExitReason::Exited(42).to_string(), "EXITED(42)");
        assert_eq!(
            ExitReason::SecurityViolation.to_string(),
            "SECURITY_VIOLATION"
        );
        assert_eq!(ExitReason::KilledByOs.to_string(), "KILLED_BY_OS");
        assert_eq!(ExitReason::Signaled(15).to_string(), "SIGNALED");
    }

    #[test]
    fn test_termination_signal_labels() {
        assert_eq!(ExitReason::Exited(0).termination_signal(), "");
        assert_eq!(ExitReason::KilledByOs.termination_signal(), "SIG9");
        assert_eq!(
            ExitReason::SecurityViolation.termination_signal(),
            format!("SIG{}", libc::SIGSYS)
        );
        assert_eq!(ExitReason::Signaled(15).termination_signal(), "SIG15");
    }

    #[test]
    fn test_blocked_syscall_label_only_for_violations() {
        assert_eq!(
            ExitReason::SecurityViolation.blocked_syscall(),
            "Unknown(SIGSYS)"
        );
        assert_eq!(ExitReason::Exited(0).blocked_syscall(), "");
        assert_eq!(ExitReason::KilledByOs.blocked_syscall(), "");
        assert_eq!(ExitReason::Signaled(11).blocked_syscall(), "");
    }

    #[test]
    fn test_supervisor_builder_defaults() {
        let config = RunConfig {
            program: "/bin/true".to_string(),
            args: Vec::new(),
            profile: Profile::Strict,
        };
        let supervisor = Supervisor::new(config).log_dir("/tmp/launcher-test-logs");
        assert_eq!(
            supervisor.log_dir,
            PathBuf::from("/tmp/launcher-test-logs")
        );
    }

    // Requires unprivileged user namespaces; run with:
    //   cargo test -- --ignored
    #[test]
    #[ignore]
    fn test_run_emits_exactly_one_log() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            program: "/bin/echo".to_string(),
            args: vec!["hello".to_string()],
            profile: Profile::Learning,
        };
        let outcome = Supervisor::new(config)
            .log_dir(dir.path())
            .run()
            .unwrap();

        assert!(outcome.log_path.is_some());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert_eq!(
            outcome.log.timeline.time_ms.len(),
            outcome.log.timeline.memory_kb.len()
        );
        assert!(outcome.log.summary.runtime_ms >= outcome.log.timeline.time_ms.last().copied().unwrap_or(0));
    }
}
