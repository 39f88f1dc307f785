// src/job/backend.rs

//! Pluggable execution backend abstraction.
//!
//! The launcher and monitor talk to a `JobBackend` instead of a concrete
//! orchestration client. This keeps the pipeline testable against scripted
//! fakes while the production implementation lives behind the same seam.
//!
//! - [`crate::job::local::LocalProcessBackend`] runs jobs as local
//!   processes for development and tests.
//! - Tests can provide their own `JobBackend` that, for example, rejects
//!   submission or walks a handle through a scripted state sequence.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::job::spec::JobSpec;
use crate::types::{JobState, LogChannel};

/// Opaque handle to one submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: String,
}

/// Trait abstracting the execution backend.
///
/// Methods take `&self` so a single backend instance can be shared between
/// the monitor's poll loop and a cancellation path that needs `kill`.
pub trait JobBackend: Send + Sync {
    /// Submit one job. Exactly-one-submission-per-call; deduplication is
    /// the supervisor's business.
    fn submit<'a>(
        &'a self,
        spec: &'a JobSpec,
    ) -> Pin<Box<dyn Future<Output = Result<JobHandle>> + Send + 'a>>;

    /// Current lifecycle state of the job.
    fn poll<'a>(
        &'a self,
        handle: &'a JobHandle,
    ) -> Pin<Box<dyn Future<Output = Result<JobState>> + Send + 'a>>;

    /// Fetch log bytes for one channel starting at `offset` within the
    /// given log location. May return an empty buffer when nothing new has
    /// been written.
    fn fetch_logs<'a>(
        &'a self,
        handle: &'a JobHandle,
        channel: LogChannel,
        location: &'a str,
        offset: u64,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;

    /// Terminate the job. Used on external cancellation so the attempt does
    /// not leave an orphaned billable job behind.
    fn kill<'a>(
        &'a self,
        handle: &'a JobHandle,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
