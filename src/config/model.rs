// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Launcher configuration, loaded from `Stepjob.toml`.
///
/// Every field has a default so a missing config file is equivalent to an
/// empty one.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    /// Interval between backend status polls, in milliseconds.
    pub poll_interval_ms: u64,

    /// Consecutive transient log-fetch failures after which tailing of a
    /// channel goes quiet for the rest of the attempt. `0` means retry
    /// forever; tailing never aborts the wait either way.
    pub log_fetch_max_failures: u32,

    /// Root directory of the local datastore.
    pub datastore_root: PathBuf,

    /// Directory of the local metadata cache the reconciler syncs into.
    pub local_metadata_dir: PathBuf,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5000,
            log_fetch_max_failures: 0,
            datastore_root: PathBuf::from(".stepjob/datastore"),
            local_metadata_dir: PathBuf::from(".stepjob/metadata"),
        }
    }
}

impl LauncherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
