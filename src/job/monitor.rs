// src/job/monitor.rs

//! Terminal-state wait with best-effort log tailing.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::job::backend::{JobBackend, JobHandle};
use crate::types::{JobState, LogChannel, LogLocation, TerminalOutcome};

/// Destination for tailed log lines.
///
/// Writes are serialized per channel by construction: the monitor is the
/// only writer and drains one channel at a time.
pub trait LogSink: Send {
    /// Called once after submission with the backend's job id, before any
    /// line is appended.
    fn attach(&mut self, _job_id: &str) {}

    fn append(&mut self, channel: LogChannel, line: &str);
}

/// Production sink: stdout lines to stdout, stderr lines to stderr, both
/// prefixed with the backend job id learned at submission so interleaved
/// supervisor output stays attributable.
#[derive(Default)]
pub struct ConsoleSink {
    job_id: Option<String>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogSink for ConsoleSink {
    fn attach(&mut self, job_id: &str) {
        self.job_id = Some(job_id.to_string());
    }

    fn append(&mut self, channel: LogChannel, line: &str) {
        let line = match &self.job_id {
            Some(id) => format!("[{id}] {line}"),
            None => line.to_string(),
        };
        match channel {
            LogChannel::Stdout => println!("{line}"),
            LogChannel::Stderr => eprintln!("{line}"),
        }
    }
}

/// Blocks until the job reaches a terminal state, streaming both log
/// channels to the sink throughout.
///
/// Tailing starts once the job is observed to leave `Pending` and is
/// best-effort: a transient fetch error is logged and retried on the next
/// poll cycle, never aborting the wait. The run-time limit is enforced and
/// reported by the backend; there is no client-side timeout.
pub struct JobMonitor<'a> {
    backend: &'a dyn JobBackend,
    poll_interval: Duration,
    log_fetch_max_failures: u32,
}

impl<'a> JobMonitor<'a> {
    pub fn new(
        backend: &'a dyn JobBackend,
        poll_interval: Duration,
        log_fetch_max_failures: u32,
    ) -> Self {
        Self {
            backend,
            poll_interval,
            log_fetch_max_failures,
        }
    }

    pub async fn wait(
        &self,
        handle: &JobHandle,
        location: &LogLocation,
        sink: &mut dyn LogSink,
    ) -> Result<TerminalOutcome> {
        info!(
            job_id = %handle.job_id,
            stdout_location = %location.stdout,
            stderr_location = %location.stderr,
            "waiting for job to finish"
        );

        let mut tails = [
            Tail::new(LogChannel::Stdout, self.log_fetch_max_failures),
            Tail::new(LogChannel::Stderr, self.log_fetch_max_failures),
        ];

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let state = self.backend.poll(handle).await?;
            if state == JobState::Pending {
                debug!(job_id = %handle.job_id, "job still pending");
                continue;
            }

            for tail in tails.iter_mut() {
                tail.drain(self.backend, handle, location, sink).await;
            }

            if state.is_terminal() {
                for tail in tails.iter_mut() {
                    tail.flush(sink);
                }
                let outcome = match state {
                    JobState::Succeeded => TerminalOutcome::Succeeded,
                    JobState::Failed(code) => TerminalOutcome::Failed(code),
                    JobState::Killed => TerminalOutcome::Killed,
                    JobState::Pending | JobState::Running => unreachable!(),
                };
                info!(job_id = %handle.job_id, outcome = ?outcome, "job reached terminal state");
                return Ok(outcome);
            }
        }
    }
}

/// Per-channel tail cursor.
struct Tail {
    channel: LogChannel,
    offset: u64,
    /// Bytes of a trailing line that has not seen its newline yet.
    partial: Vec<u8>,
    consecutive_failures: u32,
    max_failures: u32,
    quiet: bool,
}

impl Tail {
    fn new(channel: LogChannel, max_failures: u32) -> Self {
        Self {
            channel,
            offset: 0,
            partial: Vec::new(),
            consecutive_failures: 0,
            max_failures,
            quiet: false,
        }
    }

    async fn drain(
        &mut self,
        backend: &dyn JobBackend,
        handle: &JobHandle,
        location: &LogLocation,
        sink: &mut dyn LogSink,
    ) {
        if self.quiet {
            return;
        }

        let loc = location.for_channel(self.channel);
        let bytes = match backend
            .fetch_logs(handle, self.channel, loc, self.offset)
            .await
        {
            Ok(bytes) => {
                self.consecutive_failures = 0;
                bytes
            }
            Err(err) => {
                self.consecutive_failures += 1;
                warn!(
                    job_id = %handle.job_id,
                    channel = %self.channel,
                    error = %err,
                    failures = self.consecutive_failures,
                    "log fetch failed; will retry on next poll cycle"
                );
                if self.max_failures > 0 && self.consecutive_failures >= self.max_failures {
                    warn!(
                        job_id = %handle.job_id,
                        channel = %self.channel,
                        "giving up on log tailing for this channel"
                    );
                    self.quiet = true;
                }
                return;
            }
        };

        if bytes.is_empty() {
            return;
        }
        self.offset += bytes.len() as u64;
        self.partial.extend_from_slice(&bytes);

        // Emit complete lines; keep the trailing remainder for next cycle.
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let rest = self.partial.split_off(pos + 1);
            let line_bytes = std::mem::replace(&mut self.partial, rest);
            let line = String::from_utf8_lossy(&line_bytes);
            sink.append(self.channel, line.trim_end_matches(['\n', '\r']));
        }
    }

    /// Emit any unterminated final line once the job is done.
    fn flush(&mut self, sink: &mut dyn LogSink) {
        if self.partial.is_empty() {
            return;
        }
        let line_bytes = std::mem::take(&mut self.partial);
        let line = String::from_utf8_lossy(&line_bytes);
        sink.append(self.channel, line.trim_end_matches(['\n', '\r']));
    }
}
