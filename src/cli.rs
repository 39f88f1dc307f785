// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! `stepjob` is normally invoked by a workflow supervisor, not by hand: the
//! supervisor renders one `step` invocation per attempt, and the encoder in
//! [`crate::encode`] re-serializes these same options into the command line
//! the remote job runs.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::encode::OptionMap;
use crate::types::{EnvironmentKind, MetadataKind};

/// Command-line arguments for `stepjob`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stepjob",
    version,
    about = "Launch one workflow step attempt as a remote containerized job and monitor it.",
    long_about = None
)]
pub struct CliArgs {
    /// Suppress informational output; only warnings and errors are logged.
    #[arg(long)]
    pub quiet: bool,

    /// Datastore backend type (currently only "local").
    #[arg(long, value_name = "TYPE", default_value = "local")]
    pub datastore: String,

    /// Root directory of the datastore. Overrides the config file value.
    #[arg(long, value_name = "PATH")]
    pub datastore_root: Option<String>,

    /// Metadata backend type ("local" or "service").
    ///
    /// Reconciliation after an attempt only applies to the local backend.
    #[arg(long, value_name = "TYPE", default_value = "local")]
    pub metadata: MetadataKind,

    /// Environment shim ("default" or "conda").
    ///
    /// Conda declarations in the flow file only take effect under "conda".
    #[arg(long, value_name = "TYPE", default_value = "default")]
    pub environment: EnvironmentKind,

    /// Path to the flow definition file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Flowfile.toml")]
    pub flow_file: String,

    /// Path to the launcher config file (TOML).
    ///
    /// A missing file is not an error; built-in defaults apply.
    #[arg(long, value_name = "PATH", default_value = "Stepjob.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STEPJOB_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Execute a single step attempt as a remote job.
    ///
    /// This re-invokes the top-level `step` command inside the job with the
    /// given options. Typically you do not call this directly; it is issued
    /// by the workflow supervisor.
    Step(StepArgs),
}

/// Arguments of the `step` subcommand.
#[derive(Debug, Clone, Args)]
pub struct StepArgs {
    /// Name of the step to execute.
    pub step_name: String,

    /// Content hash of the code package.
    pub code_package_sha: String,

    /// Retrieval URL of the code package.
    pub code_package_url: String,

    /// Executable requirement for the job. Defaults to the environment
    /// shim's choice for this step.
    #[arg(long)]
    pub executable: Option<String>,

    /// Container image requirement for the job.
    #[arg(long)]
    pub image: Option<String>,

    /// Service account requirement for the job.
    #[arg(long)]
    pub service_account: Option<String>,

    /// Secrets for the job.
    #[arg(long = "secrets", value_name = "NAME")]
    pub secrets: Vec<String>,

    /// Node selectors for the job (`key=value`).
    #[arg(long = "node-selector", value_name = "KEY=VALUE")]
    pub node_selector: Vec<String>,

    /// Namespace for the job in the execution backend.
    ///
    /// `--namespace` is already taken by the workflow-level namespace.
    #[arg(long = "k8s-namespace", value_name = "NAME")]
    pub k8s_namespace: Option<String>,

    /// CPU requirement for the job, passed through verbatim.
    #[arg(long)]
    pub cpu: Option<String>,

    /// GPU requirement for the job, passed through verbatim.
    #[arg(long)]
    pub gpu: Option<String>,

    /// Disk requirement for the job, passed through verbatim.
    #[arg(long)]
    pub disk: Option<String>,

    /// Memory requirement for the job, passed through verbatim.
    #[arg(long)]
    pub memory: Option<String>,

    /// Passed to the top-level 'step'.
    #[arg(long)]
    pub run_id: String,

    /// Passed to the top-level 'step'.
    #[arg(long)]
    pub task_id: String,

    /// Passed to the top-level 'step'.
    #[arg(long)]
    pub input_paths: Option<String>,

    /// Passed to the top-level 'step'.
    #[arg(long)]
    pub split_index: Option<String>,

    /// Passed to the top-level 'step'.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Passed to the top-level 'step'.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Passed to the top-level 'step'. Doubles as the attempt number.
    #[arg(long, default_value_t = 0)]
    pub retry_count: u32,

    /// Passed to the top-level 'step'.
    #[arg(long, default_value_t = 0)]
    pub max_user_code_retries: u32,

    /// Run time limit in seconds for the job, enforced by the backend.
    /// Default is 5 days.
    #[arg(long, default_value_t = 5 * 24 * 60 * 60)]
    pub run_time_limit: u64,

    /// Tolerations for the job, as JSON objects.
    #[arg(long = "tolerations", value_name = "JSON")]
    pub tolerations: Vec<String>,
}

impl CliArgs {
    /// Top-level options re-serialized for the remote invocation, so the job
    /// runs against the same datastore/metadata configuration as the
    /// launcher.
    pub fn top_level_options(&self) -> OptionMap {
        OptionMap::new()
            .switch("quiet", self.quiet)
            .single("datastore", &self.datastore)
            .maybe("datastore_root", self.datastore_root.as_deref())
            .single("metadata", self.metadata.as_str())
            .single("environment", self.environment.as_str())
            .single("flow_file", &self.flow_file)
            .single("config", &self.config)
            .maybe("log_level", self.log_level.map(LogLevel::as_str))
    }
}

impl StepArgs {
    /// Step-level options re-serialized for the remote `step` invocation.
    ///
    /// Job-placement options (image, resources, secrets, ...) are consumed
    /// by the launcher itself and deliberately not forwarded.
    pub fn step_options(&self) -> OptionMap {
        OptionMap::new()
            .single("run_id", &self.run_id)
            .single("task_id", &self.task_id)
            .maybe("input_paths", self.input_paths.as_deref())
            .maybe("split_index", self.split_index.as_deref())
            .repeated("tag", &self.tags)
            .maybe("namespace", self.namespace.as_deref())
            .single("retry_count", self.retry_count.to_string())
            .single(
                "max_user_code_retries",
                self.max_user_code_retries.to_string(),
            )
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
