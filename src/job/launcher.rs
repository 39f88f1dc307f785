// src/job/launcher.rs

//! One-shot job submission.

use tracing::{error, info};

use crate::errors::{Result, StepJobError};
use crate::job::backend::{JobBackend, JobHandle};
use crate::job::spec::JobSpec;
use crate::types::TaskIdentity;

/// Submits exactly one [`JobSpec`] per process invocation.
///
/// Submission failures are never retried here: the full diagnostic is
/// logged for the operator and the error surfaces as
/// [`StepJobError::Submission`], which the driver maps to the non-retryable
/// exit code after reconciliation. Re-invoking the attempt (e.g. after a
/// quota fix) is the external supervisor's decision.
pub struct JobLauncher<'a> {
    backend: &'a dyn JobBackend,
}

impl<'a> JobLauncher<'a> {
    pub fn new(backend: &'a dyn JobBackend) -> Self {
        Self { backend }
    }

    pub async fn launch(&self, identity: &TaskIdentity, spec: &JobSpec) -> Result<JobHandle> {
        info!(
            task = %identity,
            job = %spec.name,
            image = spec.image.as_deref().unwrap_or("<default>"),
            "submitting job"
        );

        match self.backend.submit(spec).await {
            Ok(handle) => {
                info!(task = %identity, job_id = %handle.job_id, "job submitted");
                Ok(handle)
            }
            Err(err) => {
                error!(
                    task = %identity,
                    job = %spec.name,
                    error = ?err,
                    "job submission failed"
                );
                Err(StepJobError::Submission(err.to_string()))
            }
        }
    }
}
