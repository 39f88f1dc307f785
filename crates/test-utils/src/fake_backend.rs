use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use stepjob::errors::{Result, StepJobError};
use stepjob::job::{JobBackend, JobHandle, JobSpec};
use stepjob::types::{JobState, LogChannel};

/// One scripted log-fetch response.
#[derive(Debug, Clone)]
pub enum LogEvent {
    /// Bytes appended to the channel since the last fetch.
    Bytes(Vec<u8>),
    /// A transient fetch error.
    Error(String),
}

/// A fake backend driven entirely by a script:
/// - `poll` walks through the queued states, then repeats the last one
/// - `fetch_logs` replays queued per-channel events (empty queue = no new
///   bytes)
/// - `submit` optionally fails, and records every submitted spec name
/// - `kill` is recorded and forces the remaining states to `Killed`.
pub struct ScriptedBackend {
    submit_error: Option<String>,
    states: Mutex<VecDeque<JobState>>,
    last_state: Mutex<JobState>,
    stdout: Mutex<VecDeque<LogEvent>>,
    stderr: Mutex<VecDeque<LogEvent>>,
    submitted: Mutex<Vec<String>>,
    kills: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            submit_error: None,
            states: Mutex::new(VecDeque::new()),
            last_state: Mutex::new(JobState::Pending),
            stdout: Mutex::new(VecDeque::new()),
            stderr: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            kills: Mutex::new(Vec::new()),
        }
    }

    /// Make `submit` fail with the given message.
    pub fn failing_submission(mut self, message: &str) -> Self {
        self.submit_error = Some(message.to_string());
        self
    }

    /// Queue the states `poll` walks through; the last one repeats.
    pub fn with_states(self, states: impl IntoIterator<Item = JobState>) -> Self {
        self.states.lock().unwrap().extend(states);
        self
    }

    pub fn with_stdout(self, event: LogEvent) -> Self {
        self.stdout.lock().unwrap().push_back(event);
        self
    }

    pub fn with_stderr(self, event: LogEvent) -> Self {
        self.stderr.lock().unwrap().push_back(event);
        self
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn kills(&self) -> Vec<String> {
        self.kills.lock().unwrap().clone()
    }

    fn next_state(&self) -> JobState {
        let mut queue = self.states.lock().unwrap();
        match queue.pop_front() {
            Some(state) => {
                *self.last_state.lock().unwrap() = state;
                state
            }
            None => *self.last_state.lock().unwrap(),
        }
    }

    fn next_log_event(&self, channel: LogChannel) -> Option<LogEvent> {
        let queue = match channel {
            LogChannel::Stdout => &self.stdout,
            LogChannel::Stderr => &self.stderr,
        };
        queue.lock().unwrap().pop_front()
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl JobBackend for ScriptedBackend {
    fn submit<'a>(
        &'a self,
        spec: &'a JobSpec,
    ) -> Pin<Box<dyn Future<Output = Result<JobHandle>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(message) = &self.submit_error {
                return Err(StepJobError::Backend(message.clone()));
            }
            self.submitted.lock().unwrap().push(spec.name.clone());
            Ok(JobHandle {
                job_id: format!("fake-{}", spec.name),
            })
        })
    }

    fn poll<'a>(
        &'a self,
        _handle: &'a JobHandle,
    ) -> Pin<Box<dyn Future<Output = Result<JobState>> + Send + 'a>> {
        Box::pin(async move { Ok(self.next_state()) })
    }

    fn fetch_logs<'a>(
        &'a self,
        _handle: &'a JobHandle,
        channel: LogChannel,
        _location: &'a str,
        _offset: u64,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            match self.next_log_event(channel) {
                Some(LogEvent::Bytes(bytes)) => Ok(bytes),
                Some(LogEvent::Error(message)) => Err(StepJobError::Backend(message)),
                None => Ok(Vec::new()),
            }
        })
    }

    fn kill<'a>(
        &'a self,
        handle: &'a JobHandle,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.kills.lock().unwrap().push(handle.job_id.clone());
            let mut queue = self.states.lock().unwrap();
            queue.clear();
            *self.last_state.lock().unwrap() = JobState::Killed;
            Ok(())
        })
    }
}
