// src/flow/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::errors::{Result, StepJobError};

/// Default pause between retries when a step declares retries without a
/// `minutes_between_retries` value.
pub const DEFAULT_MINUTES_BETWEEN_RETRIES: u64 = 2;

/// Raw flow file as deserialized from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFlowFile {
    pub name: String,
    #[serde(default)]
    pub step: BTreeMap<String, RawStepOptions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawStepOptions {
    #[serde(default)]
    pub env: Option<EnvOptions>,
    #[serde(default)]
    pub retry: Option<RetryOptions>,
    #[serde(default)]
    pub conda: Option<CondaOptions>,
}

/// Environment variables a step declares for its job.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EnvOptions {
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

/// Retry declaration of a step.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RetryOptions {
    /// How many retries the supervisor may attempt for this step.
    #[serde(default)]
    pub times: u32,
    /// Pause before a retry attempt launches.
    pub minutes_between_retries: Option<u64>,
}

impl RetryOptions {
    pub fn minutes_between_retries(&self) -> u64 {
        self.minutes_between_retries
            .unwrap_or(DEFAULT_MINUTES_BETWEEN_RETRIES)
    }
}

/// Conda environment declaration of a step.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CondaOptions {
    pub python: Option<String>,
    #[serde(default)]
    pub libraries: BTreeMap<String, String>,
}

/// Typed options of one step, built once at flow load.
#[derive(Debug, Clone, Default)]
pub struct StepOptions {
    pub env: Option<EnvOptions>,
    pub retry: Option<RetryOptions>,
    pub conda: Option<CondaOptions>,
}

impl StepOptions {
    /// Declared job environment variables, empty when none were declared.
    pub fn env_vars(&self) -> BTreeMap<String, String> {
        self.env
            .as_ref()
            .map(|e| e.vars.clone())
            .unwrap_or_default()
    }
}

/// Validated flow definition: flow name plus the typed per-step table.
#[derive(Debug, Clone)]
pub struct FlowSpec {
    pub name: String,
    steps: BTreeMap<String, StepOptions>,
}

impl FlowSpec {
    pub fn step_options(&self, step_name: &str) -> Result<&StepOptions> {
        self.steps
            .get(step_name)
            .ok_or_else(|| StepJobError::StepNotFound(step_name.to_string()))
    }
}

impl TryFrom<RawFlowFile> for FlowSpec {
    type Error = StepJobError;

    fn try_from(raw: RawFlowFile) -> std::result::Result<Self, Self::Error> {
        if raw.name.trim().is_empty() {
            return Err(StepJobError::ConfigError(
                "flow file must declare a non-empty `name`".to_string(),
            ));
        }

        let steps = raw
            .step
            .into_iter()
            .map(|(name, raw)| {
                (
                    name,
                    StepOptions {
                        env: raw.env,
                        retry: raw.retry,
                        conda: raw.conda,
                    },
                )
            })
            .collect();

        Ok(FlowSpec {
            name: raw.name,
            steps,
        })
    }
}
