// src/job/spec.rs

//! The fully-resolved job submission request.

use std::collections::BTreeMap;

use crate::types::LogLocation;

/// Identity of the code bundle the backend fetches and unpacks before
/// running the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePackage {
    pub sha: String,
    pub url: String,
    /// Datastore backend type the package lives in.
    pub ds_type: String,
}

/// Everything the backend needs to run one attempt.
///
/// Resource quantities and placement constraints are free-form strings and
/// opaque values passed through verbatim; validating them is the backend's
/// business. A `JobSpec` is fully constructed before submission and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// Backend-visible job name, derived from the task identity.
    pub name: String,
    /// Shell command line the job executes (bootstrap + step command).
    pub command_line: String,
    /// Container image, if the step pinned one.
    pub image: Option<String>,

    pub cpu: Option<String>,
    pub gpu: Option<String>,
    pub memory: Option<String>,
    pub disk: Option<String>,

    pub service_account: Option<String>,
    pub namespace: Option<String>,
    pub node_selector: Vec<String>,
    pub tolerations: Vec<serde_json::Value>,
    pub secrets: Vec<String>,

    /// Job process environment, set verbatim (step-declared vars plus any
    /// synthesized chunk variables).
    pub env: BTreeMap<String, String>,

    /// Wall-clock limit in seconds the backend enforces.
    pub run_time_limit_secs: u64,

    pub code_package: CodePackage,

    /// Where the backend writes (and the monitor tails) the two log
    /// channels.
    pub log_location: LogLocation,
}
