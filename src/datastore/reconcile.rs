// src/datastore/reconcile.rs

//! Best-effort metadata reconciliation.
//!
//! After a remote attempt ends (however it ends), the durable datastore
//! holds metadata the local cache may not. When the configured metadata
//! backend is the local variant, the reconciler copies every record for the
//! attempt into the cache; a metadata service keeps itself current, so the
//! service variant is a no-op.
//!
//! The sync is idempotent (records are overwritten with identical bytes)
//! and infallible from the caller's point of view: failures are logged and
//! swallowed so they can never mask the primary outcome of the attempt.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use tracing::{debug, warn};

use crate::datastore::FlowDatastore;
use crate::errors::Result;
use crate::types::{MetadataKind, TaskIdentity};

/// Seam for the reconciliation step, so exit-path tests can count
/// invocations without touching a filesystem.
pub trait Reconciler: Send + Sync {
    /// Sync metadata for `identity` from the datastore. Must be safe to
    /// call repeatedly and after partial failure of any prior stage.
    fn sync(&self, datastore: &dyn FlowDatastore, identity: &TaskIdentity);
}

/// Production reconciler writing into the local metadata cache directory.
#[derive(Debug, Clone)]
pub struct MetadataReconciler {
    kind: MetadataKind,
    cache_dir: PathBuf,
}

impl MetadataReconciler {
    pub fn new(kind: MetadataKind, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            cache_dir: cache_dir.into(),
        }
    }

    fn sync_inner(&self, datastore: &dyn FlowDatastore, identity: &TaskIdentity) -> Result<usize> {
        let ds = datastore.task_datastore(identity)?;
        let records = ds.metadata_records()?;

        let dir = self
            .cache_dir
            .join(&identity.flow_name)
            .join(&identity.run_id)
            .join(&identity.step_name)
            .join(&identity.task_id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating metadata cache dir {}", dir.display()))?;

        for record in &records {
            let path = dir.join(format!("{}.json", record.name));
            let contents = serde_json::to_string_pretty(&record.payload)?;
            fs::write(&path, contents)
                .with_context(|| format!("writing metadata record {}", path.display()))?;
        }

        Ok(records.len())
    }
}

impl Reconciler for MetadataReconciler {
    fn sync(&self, datastore: &dyn FlowDatastore, identity: &TaskIdentity) {
        if self.kind != MetadataKind::Local {
            debug!(task = %identity, "metadata backend is not local; skipping sync");
            return;
        }

        match self.sync_inner(datastore, identity) {
            Ok(count) => {
                debug!(task = %identity, records = count, "synced metadata from datastore");
            }
            Err(err) => {
                warn!(
                    task = %identity,
                    error = %err,
                    "metadata sync failed; local cache may be stale"
                );
            }
        }
    }
}
