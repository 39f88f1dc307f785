// tests/local_backend_e2e.rs

//! End-to-end runs against the process backend: a real `sh -c` job writing
//! into the datastore layout, monitored to a terminal state.

#![cfg(unix)]

use std::time::Duration;

use stepjob::datastore::{log_locations, FlowDatastore, LocalDatastore};
use stepjob::job::{JobMonitor, JobBackend, LocalProcessBackend};
use stepjob::types::{LogChannel, TerminalOutcome};
use stepjob_test_utils::builders::{JobSpecBuilder, TaskIdentityBuilder};
use stepjob_test_utils::recording::RecordingSink;
use stepjob_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn job_writes_logs_and_succeeds() {
    init_tracing();

    let store_dir = tempfile::tempdir().unwrap();
    let identity = TaskIdentityBuilder::new().build();
    let datastore = LocalDatastore::new(store_dir.path());
    let task_ds = datastore.task_datastore(&identity).unwrap();
    let location = log_locations(task_ds.as_ref());

    let spec = JobSpecBuilder::new("start")
        .command("echo out-line && echo err-line >&2")
        .log_location(&location.stdout, &location.stderr)
        .build();

    let backend = LocalProcessBackend::new();
    let handle = backend.submit(&spec).await.expect("submit should succeed");

    let monitor = JobMonitor::new(&backend, Duration::from_millis(20), 0);
    let mut sink = RecordingSink::new();
    let lines = sink.lines_handle();

    let outcome = with_timeout(monitor.wait(&handle, &location, &mut sink))
        .await
        .expect("wait should succeed");

    assert_eq!(outcome, TerminalOutcome::Succeeded);
    let lines = lines.lock().unwrap();
    assert!(lines.contains(&(LogChannel::Stdout, "out-line".to_string())));
    assert!(lines.contains(&(LogChannel::Stderr, "err-line".to_string())));

    // The datastore files hold the same content the monitor tailed.
    let stored = std::fs::read_to_string(&location.stdout).unwrap();
    assert_eq!(stored, "out-line\n");
}

#[tokio::test]
async fn job_env_is_set_verbatim() {
    init_tracing();

    let store_dir = tempfile::tempdir().unwrap();
    let identity = TaskIdentityBuilder::new().step("env-check").build();
    let datastore = LocalDatastore::new(store_dir.path());
    let task_ds = datastore.task_datastore(&identity).unwrap();
    let location = log_locations(task_ds.as_ref());

    let spec = JobSpecBuilder::new("env-check")
        .command("printf '%s' \"${STEPJOB_INPUT_PATHS_0}${STEPJOB_INPUT_PATHS_1}\"")
        .env("STEPJOB_INPUT_PATHS_0", "first-half,")
        .env("STEPJOB_INPUT_PATHS_1", "second-half")
        .log_location(&location.stdout, &location.stderr)
        .build();

    let backend = LocalProcessBackend::new();
    let handle = backend.submit(&spec).await.unwrap();

    let monitor = JobMonitor::new(&backend, Duration::from_millis(20), 0);
    let mut sink = RecordingSink::new();
    let outcome = with_timeout(monitor.wait(&handle, &location, &mut sink))
        .await
        .unwrap();

    assert_eq!(outcome, TerminalOutcome::Succeeded);
    let stored = std::fs::read_to_string(&location.stdout).unwrap();
    assert_eq!(stored, "first-half,second-half");
}

#[tokio::test]
async fn nonzero_exit_reports_failed_with_code() {
    init_tracing();

    let store_dir = tempfile::tempdir().unwrap();
    let identity = TaskIdentityBuilder::new().build();
    let datastore = LocalDatastore::new(store_dir.path());
    let task_ds = datastore.task_datastore(&identity).unwrap();
    let location = log_locations(task_ds.as_ref());

    let spec = JobSpecBuilder::new("start")
        .command("exit 7")
        .log_location(&location.stdout, &location.stderr)
        .build();

    let backend = LocalProcessBackend::new();
    let handle = backend.submit(&spec).await.unwrap();

    let monitor = JobMonitor::new(&backend, Duration::from_millis(20), 0);
    let mut sink = RecordingSink::new();
    let outcome = with_timeout(monitor.wait(&handle, &location, &mut sink))
        .await
        .unwrap();

    assert_eq!(outcome, TerminalOutcome::Failed(7));
}

#[tokio::test]
async fn run_time_limit_overrun_is_reported_as_killed() {
    init_tracing();

    let store_dir = tempfile::tempdir().unwrap();
    let identity = TaskIdentityBuilder::new().build();
    let datastore = LocalDatastore::new(store_dir.path());
    let task_ds = datastore.task_datastore(&identity).unwrap();
    let location = log_locations(task_ds.as_ref());

    let spec = JobSpecBuilder::new("start")
        .command("sleep 30")
        .run_time_limit_secs(1)
        .log_location(&location.stdout, &location.stderr)
        .build();

    let backend = LocalProcessBackend::new();
    let handle = backend.submit(&spec).await.unwrap();

    let monitor = JobMonitor::new(&backend, Duration::from_millis(20), 0);
    let mut sink = RecordingSink::new();
    let outcome = with_timeout(monitor.wait(&handle, &location, &mut sink))
        .await
        .unwrap();

    assert_eq!(outcome, TerminalOutcome::Killed);
}

#[tokio::test]
async fn kill_terminates_a_running_job() {
    init_tracing();

    let store_dir = tempfile::tempdir().unwrap();
    let identity = TaskIdentityBuilder::new().build();
    let datastore = LocalDatastore::new(store_dir.path());
    let task_ds = datastore.task_datastore(&identity).unwrap();
    let location = log_locations(task_ds.as_ref());

    let spec = JobSpecBuilder::new("start")
        .command("sleep 30")
        .log_location(&location.stdout, &location.stderr)
        .build();

    let backend = LocalProcessBackend::new();
    let handle = backend.submit(&spec).await.unwrap();

    backend.kill(&handle).await.expect("kill should succeed");

    let monitor = JobMonitor::new(&backend, Duration::from_millis(20), 0);
    let mut sink = RecordingSink::new();
    let outcome = with_timeout(monitor.wait(&handle, &location, &mut sink))
        .await
        .unwrap();

    assert_eq!(outcome, TerminalOutcome::Killed);
}
