#![allow(dead_code)]

use std::collections::BTreeMap;

use stepjob::job::{CodePackage, JobSpec};
use stepjob::types::{LogLocation, TaskIdentity};

/// Builder for `TaskIdentity` to simplify test setup.
pub struct TaskIdentityBuilder {
    identity: TaskIdentity,
}

impl TaskIdentityBuilder {
    pub fn new() -> Self {
        Self {
            identity: TaskIdentity {
                flow_name: "TestFlow".to_string(),
                run_id: "1".to_string(),
                step_name: "start".to_string(),
                task_id: "42".to_string(),
                attempt: 0,
            },
        }
    }

    pub fn step(mut self, name: &str) -> Self {
        self.identity.step_name = name.to_string();
        self
    }

    pub fn attempt(mut self, attempt: u32) -> Self {
        self.identity.attempt = attempt;
        self
    }

    pub fn build(self) -> TaskIdentity {
        self.identity
    }
}

impl Default for TaskIdentityBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a minimal `JobSpec`.
pub struct JobSpecBuilder {
    spec: JobSpec,
}

impl JobSpecBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            spec: JobSpec {
                name: name.to_string(),
                command_line: "echo test".to_string(),
                image: None,
                cpu: None,
                gpu: None,
                memory: None,
                disk: None,
                service_account: None,
                namespace: None,
                node_selector: Vec::new(),
                tolerations: Vec::new(),
                secrets: Vec::new(),
                env: BTreeMap::new(),
                run_time_limit_secs: 60,
                code_package: CodePackage {
                    sha: "deadbeef".to_string(),
                    url: "local:///packages/deadbeef".to_string(),
                    ds_type: "local".to_string(),
                },
                log_location: LogLocation {
                    stdout: "unused://stdout".to_string(),
                    stderr: "unused://stderr".to_string(),
                },
            },
        }
    }

    pub fn command(mut self, command_line: &str) -> Self {
        self.spec.command_line = command_line.to_string();
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.spec.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn run_time_limit_secs(mut self, secs: u64) -> Self {
        self.spec.run_time_limit_secs = secs;
        self
    }

    pub fn log_location(mut self, stdout: &str, stderr: &str) -> Self {
        self.spec.log_location = LogLocation {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        };
        self
    }

    pub fn build(self) -> JobSpec {
        self.spec
    }
}
