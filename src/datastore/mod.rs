// src/datastore/mod.rs

//! Task datastore access.
//!
//! The durable metadata/artifact store is an external collaborator; this
//! crate consumes it for exactly two things: obtaining the log locations of
//! an attempt before submission, and serving as the source of truth for the
//! metadata reconciler. The trait seam keeps the monitor and reconciler
//! testable against in-memory fakes; [`local`] provides the filesystem
//! implementation used in development and tests.

pub mod local;
pub mod reconcile;

use crate::errors::Result;
use crate::types::{LogChannel, LogLocation, TaskIdentity};

pub use local::LocalDatastore;
pub use reconcile::{MetadataReconciler, Reconciler};

/// One metadata record of an attempt, as stored durably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    /// Record name, unique within the attempt (e.g. `attempt_ok`).
    pub name: String,
    /// Opaque JSON payload.
    pub payload: serde_json::Value,
}

/// Flow-level datastore handle.
pub trait FlowDatastore: Send + Sync {
    /// Datastore backend type, forwarded to the job as the code-package
    /// datastore kind.
    fn kind(&self) -> &'static str;

    /// Open (creating if needed) the per-attempt datastore for `identity`.
    fn task_datastore(&self, identity: &TaskIdentity) -> Result<Box<dyn TaskDatastore>>;
}

/// Per-attempt datastore handle.
pub trait TaskDatastore: Send {
    /// Location the given log channel is written to / tailed from.
    fn log_location(&self, channel: LogChannel) -> String;

    /// All metadata records currently stored for this attempt.
    fn metadata_records(&self) -> Result<Vec<MetadataRecord>>;
}

/// Fetch both log locations for an attempt in one call.
pub fn log_locations(ds: &dyn TaskDatastore) -> LogLocation {
    LogLocation {
        stdout: ds.log_location(LogChannel::Stdout),
        stderr: ds.log_location(LogChannel::Stderr),
    }
}
