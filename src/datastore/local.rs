// src/datastore/local.rs

//! Filesystem datastore.
//!
//! Layout: `<root>/<flow>/<run>/<step>/<task>/<attempt>/` holding
//! `stdout.log`, `stderr.log` and `metadata/<name>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::datastore::{FlowDatastore, MetadataRecord, TaskDatastore};
use crate::errors::{Result, StepJobError};
use crate::types::{LogChannel, TaskIdentity};

#[derive(Debug, Clone)]
pub struct LocalDatastore {
    root: PathBuf,
}

impl LocalDatastore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn attempt_dir(&self, identity: &TaskIdentity) -> PathBuf {
        self.root
            .join(&identity.flow_name)
            .join(&identity.run_id)
            .join(&identity.step_name)
            .join(&identity.task_id)
            .join(identity.attempt.to_string())
    }
}

impl FlowDatastore for LocalDatastore {
    fn kind(&self) -> &'static str {
        "local"
    }

    fn task_datastore(&self, identity: &TaskIdentity) -> Result<Box<dyn TaskDatastore>> {
        let dir = self.attempt_dir(identity);
        fs::create_dir_all(dir.join("metadata"))
            .with_context(|| format!("creating attempt datastore at {}", dir.display()))?;
        Ok(Box::new(LocalTaskDatastore { dir }))
    }
}

struct LocalTaskDatastore {
    dir: PathBuf,
}

impl TaskDatastore for LocalTaskDatastore {
    fn log_location(&self, channel: LogChannel) -> String {
        self.dir
            .join(format!("{channel}.log"))
            .to_string_lossy()
            .into_owned()
    }

    fn metadata_records(&self) -> Result<Vec<MetadataRecord>> {
        read_metadata_dir(&self.dir.join("metadata"))
    }
}

fn read_metadata_dir(dir: &Path) -> Result<Vec<MetadataRecord>> {
    let mut records = Vec::new();
    if !dir.is_dir() {
        return Ok(records);
    }

    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                StepJobError::Datastore(format!("unreadable metadata name: {}", path.display()))
            })?
            .to_string();
        let contents = fs::read_to_string(&path)?;
        let payload = serde_json::from_str(&contents)?;
        records.push(MetadataRecord { name, payload });
    }

    Ok(records)
}
