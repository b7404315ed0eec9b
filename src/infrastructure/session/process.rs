//! Process execution with a deadline
//!
//! Transport processes (`ssh`, `scp`, `sh`) are polled until they exit or the
//! deadline passes; on expiry the process is killed and reaped. Output pipes
//! are drained on helper threads so a chatty command cannot block on a full
//! pipe while we wait for it.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Process execution errors
#[derive(Debug)]
pub enum ProcessError {
    /// Process could not be started
    Spawn(std::io::Error),
    /// Process was still running at the deadline and has been killed
    Timeout,
    /// Waiting on the process failed
    Wait(std::io::Error),
}

impl std::fmt::Display for ProcessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessError::Spawn(e) => write!(f, "failed to spawn process: {}", e),
            ProcessError::Timeout => write!(f, "process timed out"),
            ProcessError::Wait(e) => write!(f, "failed to wait for process: {}", e),
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::Spawn(e) | ProcessError::Wait(e) => Some(e),
            ProcessError::Timeout => None,
        }
    }
}

/// Captured result of a finished process
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    /// stdout followed by stderr
    pub combined: String,
}

impl ProcessOutput {
    /// Exit code, or -1 when terminated by a signal
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

/// Run a command to completion, capturing stdout and stderr
///
/// The deadline covers the output as well as the process: a background
/// grandchild that keeps the pipes open past it is a timeout.
pub fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<ProcessOutput, ProcessError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let deadline = Instant::now() + timeout;
    let mut child = cmd.spawn().map_err(ProcessError::Spawn)?;

    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    let status = wait_until(&mut child, deadline, timeout)?;

    // Readers still blocked at the deadline are left detached.
    let stdout = collect(&stdout_reader, deadline, timeout)?;
    let stderr = collect(&stderr_reader, deadline, timeout)?;

    let mut combined = String::from_utf8_lossy(&stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&stderr));

    Ok(ProcessOutput { status, combined })
}

/// Run a command with all standard streams detached
///
/// Used for processes that may leave a background child holding inherited
/// descriptors (an SSH control master started with `-f`).
pub fn status_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<ExitStatus, ProcessError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(ProcessError::Spawn)?;
    wait_until(&mut child, Instant::now() + timeout, timeout)
}

fn wait_until(child: &mut Child, deadline: Instant, timeout: Duration) -> Result<ExitStatus, ProcessError> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                warn!(pid = child.id(), "process exceeded {:?}, killing", timeout);
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::Timeout);
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                return Err(ProcessError::Wait(e));
            }
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf) {
                debug!("output pipe closed with error: {}", e);
            }
        }
        // The receiver is gone once the deadline passed.
        let _ = tx.send(buf);
    });
    rx
}

fn collect(reader: &Receiver<Vec<u8>>, deadline: Instant, timeout: Duration) -> Result<Vec<u8>, ProcessError> {
    match reader.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(buf) => Ok(buf),
        Err(RecvTimeoutError::Timeout) => {
            warn!("output still open after {:?}; a background process holds the pipe", timeout);
            Err(ProcessError::Timeout)
        }
        Err(RecvTimeoutError::Disconnected) => Ok(Vec::new()),
    }
}
