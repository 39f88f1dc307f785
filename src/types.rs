// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Immutable identity of one execution attempt of one step.
///
/// `attempt` is supplied by the caller (the supervisor increments it by one
/// per retry); nothing in this crate invents attempt numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskIdentity {
    pub flow_name: String,
    pub run_id: String,
    pub step_name: String,
    pub task_id: String,
    pub attempt: u32,
}

impl TaskIdentity {
    /// Stable `flow/run/step/task/attempt` path used for job naming,
    /// datastore layout and log prefixes.
    pub fn pathspec(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.flow_name, self.run_id, self.step_name, self.task_id, self.attempt
        )
    }
}

impl fmt::Display for TaskIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pathspec())
    }
}

/// Lifecycle state of a submitted job as reported by the backend.
///
/// `Pending -> Running -> {Succeeded | Failed | Killed}`. The client never
/// synthesizes a terminal state from a local timer; the run-time limit is
/// enforced and reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed(i32),
    Killed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Pending | JobState::Running)
    }
}

/// Terminal outcome of one launch-and-monitor attempt.
///
/// `Killed` is a first-class variant rather than an error subtype so callers
/// match on it exhaustively; it is always non-retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalOutcome {
    Succeeded,
    Failed(i32),
    Killed,
}

/// The two log channels every job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogChannel {
    Stdout,
    Stderr,
}

impl LogChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogChannel::Stdout => "stdout",
            LogChannel::Stderr => "stderr",
        }
    }
}

impl fmt::Display for LogChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which metadata backend the launcher runs against.
///
/// Reconciliation only has work to do for the local variant; a metadata
/// service keeps itself current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataKind {
    Local,
    Service,
}

impl MetadataKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetadataKind::Local => "local",
            MetadataKind::Service => "service",
        }
    }
}

impl Default for MetadataKind {
    fn default() -> Self {
        MetadataKind::Local
    }
}

impl FromStr for MetadataKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(MetadataKind::Local),
            "service" => Ok(MetadataKind::Service),
            other => Err(format!(
                "invalid metadata backend: {other} (expected \"local\" or \"service\")"
            )),
        }
    }
}

/// Which environment shim resolves a step's interpreter.
///
/// `Default` runs every step on the base interpreter even when the step
/// carries a conda declaration; `Conda` materializes per-step environments
/// for the steps that declare one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentKind {
    Default,
    Conda,
}

impl EnvironmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentKind::Default => "default",
            EnvironmentKind::Conda => "conda",
        }
    }
}

impl Default for EnvironmentKind {
    fn default() -> Self {
        EnvironmentKind::Default
    }
}

impl FromStr for EnvironmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(EnvironmentKind::Default),
            "conda" => Ok(EnvironmentKind::Conda),
            other => Err(format!(
                "invalid environment: {other} (expected \"default\" or \"conda\")"
            )),
        }
    }
}

/// Opaque pair of datastore locations where the job's two log channels are
/// written. Obtained once before submission and passed unchanged to both the
/// launcher and the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLocation {
    pub stdout: String,
    pub stderr: String,
}

impl LogLocation {
    pub fn for_channel(&self, channel: LogChannel) -> &str {
        match channel {
            LogChannel::Stdout => &self.stdout,
            LogChannel::Stderr => &self.stderr,
        }
    }
}
