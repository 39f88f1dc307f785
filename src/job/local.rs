// src/job/local.rs

//! Local process backend.
//!
//! Runs the rendered command line as a local `sh -c` process, redirecting
//! the two log channels to the attempt's log locations. Exists so flows can
//! be developed and tested without a cluster; it still honours the backend
//! contract the monitor relies on, including enforcement of the run-time
//! limit (an overrunning job is killed and reported as `Killed`).

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::errors::{Result, StepJobError};
use crate::job::backend::{JobBackend, JobHandle};
use crate::job::spec::JobSpec;
use crate::types::{JobState, LogChannel};

use std::future::Future;
use std::pin::Pin;

#[derive(Default)]
pub struct LocalProcessBackend {
    next_id: AtomicU64,
    jobs: Mutex<HashMap<String, Arc<LocalJob>>>,
}

struct LocalJob {
    state: Mutex<JobState>,
    cancel: Mutex<Option<oneshot::Sender<()>>>,
}

impl LocalProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn job(&self, handle: &JobHandle) -> Result<Arc<LocalJob>> {
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&handle.job_id)
            .cloned()
            .ok_or_else(|| StepJobError::Backend(format!("unknown job: {}", handle.job_id)))
    }
}

impl JobBackend for LocalProcessBackend {
    fn submit<'a>(
        &'a self,
        spec: &'a JobSpec,
    ) -> Pin<Box<dyn Future<Output = Result<JobHandle>> + Send + 'a>> {
        Box::pin(async move {
            let stdout = open_log_file(&spec.log_location.stdout)?;
            let stderr = open_log_file(&spec.log_location.stderr)?;

            let mut cmd = Command::new("sh");
            cmd.arg("-c")
                .arg(&spec.command_line)
                .envs(&spec.env)
                .stdout(Stdio::from(stdout))
                .stderr(Stdio::from(stderr))
                .kill_on_drop(true);

            let mut child = cmd
                .spawn()
                .with_context(|| format!("spawning local process for job '{}'", spec.name))?;

            let job_id = format!(
                "{}-{}",
                spec.name,
                self.next_id.fetch_add(1, Ordering::Relaxed)
            );
            info!(job_id = %job_id, "local job started");

            let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
            let job = Arc::new(LocalJob {
                state: Mutex::new(JobState::Running),
                cancel: Mutex::new(Some(cancel_tx)),
            });
            self.jobs
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(job_id.clone(), Arc::clone(&job));

            let limit = Duration::from_secs(spec.run_time_limit_secs);
            let supervised = Arc::clone(&job);
            let supervised_id = job_id.clone();
            tokio::spawn(async move {
                let final_state = tokio::select! {
                    status_res = child.wait() => match status_res {
                        Ok(status) if status.success() => JobState::Succeeded,
                        Ok(status) => JobState::Failed(status.code().unwrap_or(-1)),
                        Err(err) => {
                            warn!(job_id = %supervised_id, error = %err, "waiting for local job failed");
                            JobState::Failed(-1)
                        }
                    },
                    _ = tokio::time::sleep(limit) => {
                        warn!(job_id = %supervised_id, limit_secs = limit.as_secs(), "run time limit exceeded; killing job");
                        kill_child(&mut child, &supervised_id).await;
                        JobState::Killed
                    }
                    _ = &mut cancel_rx => {
                        debug!(job_id = %supervised_id, "kill requested");
                        kill_child(&mut child, &supervised_id).await;
                        JobState::Killed
                    }
                };

                *supervised.state.lock().unwrap_or_else(|e| e.into_inner()) = final_state;
                debug!(job_id = %supervised_id, state = ?final_state, "local job reached terminal state");
            });

            Ok(JobHandle { job_id })
        })
    }

    fn poll<'a>(
        &'a self,
        handle: &'a JobHandle,
    ) -> Pin<Box<dyn Future<Output = Result<JobState>> + Send + 'a>> {
        Box::pin(async move {
            let job = self.job(handle)?;
            let state = *job.state.lock().unwrap_or_else(|e| e.into_inner());
            Ok(state)
        })
    }

    fn fetch_logs<'a>(
        &'a self,
        handle: &'a JobHandle,
        _channel: LogChannel,
        location: &'a str,
        offset: u64,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            // Validates the handle even though the read only needs the path.
            self.job(handle)?;

            let contents = tokio::fs::read(location)
                .await
                .with_context(|| format!("reading log location {location}"))?;
            let offset = usize::min(offset as usize, contents.len());
            Ok(contents[offset..].to_vec())
        })
    }

    fn kill<'a>(
        &'a self,
        handle: &'a JobHandle,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let job = self.job(handle)?;
            let cancel = job
                .cancel
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take();
            match cancel {
                Some(tx) => {
                    // A closed receiver means the job already finished.
                    let _ = tx.send(());
                }
                None => debug!(job_id = %handle.job_id, "kill already requested"),
            }
            Ok(())
        })
    }
}

fn open_log_file(location: &str) -> Result<std::fs::File> {
    if let Some(parent) = std::path::Path::new(location).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory for {location}"))?;
    }
    let file = std::fs::File::create(location)
        .with_context(|| format!("creating log file {location}"))?;
    Ok(file)
}

async fn kill_child(child: &mut tokio::process::Child, job_id: &str) {
    if let Err(err) = child.kill().await {
        warn!(job_id = %job_id, error = %err, "failed to kill local job process");
    }
}
