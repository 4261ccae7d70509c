//! Bounded synchronous process invocation.
//!
//! Discovery runs every candidate interpreter once with `--version`. A broken
//! or hung binary must not stall discovery, so the call polls the child and
//! kills it once the timeout elapses.

use crate::config::DiscoveryConfig;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result of running an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The process exited on its own.
    Finished {
        success: bool,
        /// stdout followed by stderr.
        output: String,
    },
    /// The process was killed after the timeout.
    TimedOut,
    /// The process could not be started.
    FailedToStart(String),
}

impl CommandOutcome {
    /// Trimmed output of a successful run, if it printed anything.
    pub fn success_output(&self) -> Option<&str> {
        match self {
            CommandOutcome::Finished {
                success: true,
                output,
            } => {
                let trimmed = output.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }
}

/// Run `program args...`, capturing stdout and stderr, waiting at most
/// `timeout`.
///
/// The timeout covers reading the output too. A background process that
/// inherits the pipes and keeps them open past the deadline makes the run
/// count as timed out.
pub fn run_merged(program: &Path, args: &[&str], timeout: Duration) -> CommandOutcome {
    let deadline = Instant::now() + timeout;
    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            debug!("Failed to start {}: {}", program.display(), e);
            return CommandOutcome::FailedToStart(e.to_string());
        }
    };

    let stdout = child.stdout.take().map(spawn_reader);
    let stderr = child.stderr.take().map(spawn_reader);

    match wait_until(&mut child, deadline) {
        Some(status) => {
            let (Some(stdout), Some(stderr)) =
                (collect_until(stdout, deadline), collect_until(stderr, deadline))
            else {
                warn!(
                    "{} exited but its output stayed open past {:?}",
                    program.display(),
                    timeout
                );
                return CommandOutcome::TimedOut;
            };
            CommandOutcome::Finished {
                success: status.success(),
                output: stdout + &stderr,
            }
        }
        None => {
            warn!(
                "{} did not exit within {:?}, killing it",
                program.display(),
                timeout
            );
            if let Err(e) = child.kill() {
                debug!("Failed to kill {}: {}", program.display(), e);
            }
            // Reap the child; reader threads are left to drain on their own
            // since a grandchild may still hold the pipes open.
            let _ = child.wait();
            CommandOutcome::TimedOut
        }
    }
}

fn wait_until(child: &mut Child, deadline: Instant) -> Option<std::process::ExitStatus> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {}
            Err(e) => {
                debug!("try_wait failed: {}", e);
                return None;
            }
        }
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(DiscoveryConfig::PROBE_POLL_INTERVAL);
    }
}

/// Drain a pipe on its own thread, delivering the bytes once it closes.
fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// The pipe's contents, or `None` if it is still open at `deadline`.
fn collect_until(reader: Option<Receiver<Vec<u8>>>, deadline: Instant) -> Option<String> {
    let Some(reader) = reader else {
        return Some(String::new());
    };
    let remaining = deadline.saturating_duration_since(Instant::now());
    match reader.recv_timeout(remaining) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(RecvTimeoutError::Timeout) => None,
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
    }
}
