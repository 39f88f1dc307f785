// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::LauncherConfig;
use crate::errors::{Result, StepJobError};

/// Load the launcher config from a given path.
///
/// A missing file yields the built-in defaults; a present but malformed
/// file is an error. Semantic validation runs in both cases.
pub fn load_config(path: impl AsRef<Path>) -> Result<LauncherConfig> {
    let path = path.as_ref();

    let config = if path.exists() {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)?
    } else {
        debug!(path = %path.display(), "no config file; using defaults");
        LauncherConfig::default()
    };

    validate(&config)?;
    Ok(config)
}

fn validate(config: &LauncherConfig) -> Result<()> {
    if config.poll_interval_ms == 0 {
        return Err(StepJobError::ConfigError(
            "poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
