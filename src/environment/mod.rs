// src/environment/mod.rs

//! Environment shim.
//!
//! Resolves, per step, the interpreter the remote job should invoke and the
//! bootstrap shell commands that run before the step command (environment
//! materialization, code-package unpack). Under the conda shim, steps with a
//! conda declaration get a dedicated environment rooted at a
//! content-addressed env id; everything else falls through to the base
//! interpreter.

use std::collections::HashMap;

use crate::flow::{FlowSpec, StepOptions};
use crate::types::EnvironmentKind;

/// Cache of computed environment ids.
///
/// Created once at startup by the caller and passed by reference wherever
/// the shim is consulted; the shim itself holds no hidden state.
#[derive(Debug, Default)]
pub struct PackageCache {
    env_ids: HashMap<String, Option<String>>,
}

impl PackageCache {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-flow environment resolver.
pub struct StepEnvironment<'a> {
    flow: &'a FlowSpec,
    kind: EnvironmentKind,
    base_executable: String,
}

impl<'a> StepEnvironment<'a> {
    pub fn new(flow: &'a FlowSpec, kind: EnvironmentKind) -> Self {
        Self {
            flow,
            kind,
            base_executable: "python".to_string(),
        }
    }

    /// Content-addressed environment id for a step, or `None` when the step
    /// runs in the base environment.
    ///
    /// Under the default shim every step runs in the base environment and
    /// conda declarations are inert. Under the conda shim the id hashes the
    /// step's interpreter version and pinned libraries, so two steps with
    /// identical declarations share an environment.
    pub fn env_id(&self, step_name: &str, cache: &mut PackageCache) -> Option<String> {
        if self.kind != EnvironmentKind::Conda {
            return None;
        }
        if let Some(cached) = cache.env_ids.get(step_name) {
            return cached.clone();
        }

        let id = self
            .flow
            .step_options(step_name)
            .ok()
            .and_then(|options| self.compute_env_id(options));
        cache.env_ids.insert(step_name.to_string(), id.clone());
        id
    }

    /// Interpreter invocation for a step.
    ///
    /// Conda steps get the interpreter inside their environment prefix; the
    /// `-s` keeps user site-packages from leaking into the job.
    pub fn executable(&self, step_name: &str, cache: &mut PackageCache) -> String {
        match self.env_id(step_name, cache) {
            Some(env_id) => format!("{env_id}/bin/python -s"),
            None => self.base_executable.clone(),
        }
    }

    /// Shell commands the job runs before the step command.
    pub fn bootstrap_commands(&self, step_name: &str, cache: &mut PackageCache) -> Vec<String> {
        match self.env_id(step_name, cache) {
            Some(env_id) => vec![
                "echo 'Bootstrapping environment...'".to_string(),
                format!(
                    "python -m stepjob.bootstrap \"{}\" {}",
                    self.flow.name, env_id
                ),
                "echo 'Environment bootstrapped.'".to_string(),
            ],
            None => Vec::new(),
        }
    }

    fn compute_env_id(&self, options: &StepOptions) -> Option<String> {
        let conda = options.conda.as_ref()?;

        let mut hasher = blake3::Hasher::new();
        if let Some(python) = &conda.python {
            hasher.update(b"python=");
            hasher.update(python.as_bytes());
            hasher.update(b"\n");
        }
        // BTreeMap iteration is ordered, so the id is deterministic.
        for (lib, version) in &conda.libraries {
            hasher.update(lib.as_bytes());
            hasher.update(b"=");
            hasher.update(version.as_bytes());
            hasher.update(b"\n");
        }

        let digest = hasher.finalize().to_hex();
        Some(format!("stepjob_{}_{}", self.flow.name, &digest[..16]))
    }
}
