// src/lib.rs

pub mod cli;
pub mod config;
pub mod datastore;
pub mod encode;
pub mod environment;
pub mod errors;
pub mod flow;
pub mod job;
pub mod logging;
pub mod retry;
pub mod types;

use std::time::Duration;

use tracing::{error, info, warn};

use crate::cli::{CliArgs, Command, StepArgs};
use crate::config::load_config;
use crate::datastore::{log_locations, FlowDatastore, LocalDatastore, MetadataReconciler, Reconciler};
use crate::encode::encode_step_command;
use crate::environment::{PackageCache, StepEnvironment};
use crate::errors::{Result, StepJobError, EXIT_DISALLOW_RETRY};
use crate::flow::load_flow;
use crate::job::{
    CodePackage, ConsoleSink, JobBackend, JobLauncher, JobMonitor, JobSpec, LocalProcessBackend,
    LogSink,
};
use crate::retry::{RetrySpec, TokioSleeper};
use crate::types::{LogLocation, TaskIdentity, TerminalOutcome};

/// High-level entry point used by `main.rs`.
///
/// Wires together config, flow lookup, command encoding, the retry wait,
/// launch, monitoring and metadata reconciliation, and returns the process
/// exit code for the supervisor.
pub async fn run(args: CliArgs) -> Result<i32> {
    let mut config = load_config(&args.config)?;
    if let Some(root) = &args.datastore_root {
        config.datastore_root = root.into();
    }

    let flow = load_flow(&args.flow_file)?;

    let Command::Step(step) = &args.command;
    let options = flow.step_options(&step.step_name)?.clone();

    // Fail fast on malformed placement constraints, before anything sleeps
    // or submits.
    let tolerations = parse_tolerations(step)?;

    let identity = TaskIdentity {
        flow_name: flow.name.clone(),
        run_id: step.run_id.clone(),
        step_name: step.step_name.clone(),
        task_id: step.task_id.clone(),
        attempt: step.retry_count,
    };

    if args.datastore != "local" {
        return Err(StepJobError::ConfigError(format!(
            "unsupported datastore backend: {} (only \"local\" is available)",
            args.datastore
        )));
    }
    let datastore = LocalDatastore::new(&config.datastore_root);

    // Log locations are resolved once, before submission, and passed
    // unchanged to both the launcher and the monitor.
    let task_ds = datastore.task_datastore(&identity)?;
    let location = log_locations(task_ds.as_ref());

    // Environment shim; the package cache is owned here and passed down.
    let mut cache = PackageCache::new();
    let environment = StepEnvironment::new(&flow, args.environment);
    let executable = match &step.executable {
        Some(exe) => exe.clone(),
        None => environment.executable(&step.step_name, &mut cache),
    };
    let entrypoint = format!("{executable} {}", launcher_name());

    let encoded = encode_step_command(
        &entrypoint,
        &args.top_level_options(),
        &step.step_name,
        step.step_options(),
        options.env_vars(),
    );

    let mut commands = environment.bootstrap_commands(&step.step_name, &mut cache);
    commands.push(encoded.command_line);
    let command_line = commands.join(" && ");

    // Backpressure before a retry attempt; submission waits this out.
    let retry = RetrySpec::from_options(step.retry_count, options.retry.as_ref());
    retry.wait_before_launch(&TokioSleeper).await;

    let spec = JobSpec {
        name: job_name(&identity),
        command_line,
        image: step.image.clone(),
        cpu: step.cpu.clone(),
        gpu: step.gpu.clone(),
        memory: step.memory.clone(),
        disk: step.disk.clone(),
        service_account: step.service_account.clone(),
        namespace: step.k8s_namespace.clone(),
        node_selector: step.node_selector.clone(),
        tolerations,
        secrets: step.secrets.clone(),
        env: encoded.env,
        run_time_limit_secs: step.run_time_limit,
        code_package: CodePackage {
            sha: step.code_package_sha.clone(),
            url: step.code_package_url.clone(),
            ds_type: datastore.kind().to_string(),
        },
        log_location: location.clone(),
    };

    let backend = LocalProcessBackend::new();
    let reconciler = MetadataReconciler::new(args.metadata, &config.local_metadata_dir);

    let ctx = AttemptContext {
        identity: &identity,
        backend: &backend,
        datastore: &datastore,
        reconciler: &reconciler,
        poll_interval: config.poll_interval(),
        log_fetch_max_failures: config.log_fetch_max_failures,
    };
    let mut sink = ConsoleSink::new();
    launch_and_monitor(&ctx, &spec, &location, &mut sink).await
}

/// Everything the launch-and-monitor pipeline needs, behind trait seams so
/// tests can substitute fakes for the backend and the reconciler.
pub struct AttemptContext<'a> {
    pub identity: &'a TaskIdentity,
    pub backend: &'a dyn JobBackend,
    pub datastore: &'a dyn FlowDatastore,
    pub reconciler: &'a dyn Reconciler,
    pub poll_interval: Duration,
    pub log_fetch_max_failures: u32,
}

/// Launch one attempt, wait for its terminal state and map it to the
/// process exit code.
///
/// Metadata reconciliation runs exactly once on every exit path - launch
/// failure, kill, execution failure, success and cancellation alike -
/// before the outcome is reported. The innermost stage's outcome is the one
/// that surfaces; reconciliation can never mask it.
pub async fn launch_and_monitor(
    ctx: &AttemptContext<'_>,
    spec: &JobSpec,
    location: &LogLocation,
    sink: &mut dyn LogSink,
) -> Result<i32> {
    let primary = drive_attempt(ctx, spec, location, sink).await;

    ctx.reconciler.sync(ctx.datastore, ctx.identity);

    match primary {
        Ok(TerminalOutcome::Succeeded) => {
            info!(task = %ctx.identity, "step attempt succeeded");
            Ok(0)
        }
        Ok(TerminalOutcome::Failed(code)) => {
            warn!(task = %ctx.identity, exit_code = code, "step attempt failed");
            Ok(code)
        }
        Ok(TerminalOutcome::Killed) => {
            error!(task = %ctx.identity, "job was killed; the attempt will not be retried");
            Ok(EXIT_DISALLOW_RETRY)
        }
        // Submission failures are non-retryable at this layer; the full
        // diagnostic was already logged by the launcher.
        Err(StepJobError::Submission(_)) => Ok(EXIT_DISALLOW_RETRY),
        Err(err) => Err(err),
    }
}

async fn drive_attempt(
    ctx: &AttemptContext<'_>,
    spec: &JobSpec,
    location: &LogLocation,
    sink: &mut dyn LogSink,
) -> Result<TerminalOutcome> {
    let launcher = JobLauncher::new(ctx.backend);
    let handle = launcher.launch(ctx.identity, spec).await?;
    sink.attach(&handle.job_id);

    let monitor = JobMonitor::new(ctx.backend, ctx.poll_interval, ctx.log_fetch_max_failures);

    // An external stop must not leave an orphaned billable job behind: kill
    // the remote job first, then unwind through the normal kill path.
    tokio::select! {
        res = monitor.wait(&handle, location, sink) => res,
        _ = tokio::signal::ctrl_c() => {
            warn!(job_id = %handle.job_id, "interrupt received; killing remote job");
            if let Err(err) = ctx.backend.kill(&handle).await {
                warn!(job_id = %handle.job_id, error = %err, "failed to kill remote job");
            }
            Ok(TerminalOutcome::Killed)
        }
    }
}

/// Backend-visible job name for an attempt.
fn job_name(identity: &TaskIdentity) -> String {
    identity
        .pathspec()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Name this launcher was invoked as, re-used in the remote command line.
fn launcher_name() -> String {
    std::env::args()
        .next()
        .as_deref()
        .and_then(|arg0| {
            std::path::Path::new(arg0)
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "stepjob".to_string())
}

fn parse_tolerations(step: &StepArgs) -> Result<Vec<serde_json::Value>> {
    step.tolerations
        .iter()
        .map(|raw| serde_json::from_str(raw).map_err(StepJobError::from))
        .collect()
}
