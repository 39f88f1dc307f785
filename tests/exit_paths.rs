// tests/exit_paths.rs

//! Every exit path of the launch-and-monitor pipeline must reconcile
//! metadata exactly once and map to the conventional exit code.

use std::time::Duration;

use stepjob::errors::EXIT_DISALLOW_RETRY;
use stepjob::job::JobSpec;
use stepjob::types::{JobState, TaskIdentity};
use stepjob::{launch_and_monitor, AttemptContext};
use stepjob_test_utils::builders::{JobSpecBuilder, TaskIdentityBuilder};
use stepjob_test_utils::fake_backend::ScriptedBackend;
use stepjob_test_utils::recording::{RecordingReconciler, RecordingSink, StaticDatastore};
use stepjob_test_utils::{init_tracing, with_timeout};

fn context<'a>(
    identity: &'a TaskIdentity,
    backend: &'a ScriptedBackend,
    datastore: &'a StaticDatastore,
    reconciler: &'a RecordingReconciler,
) -> AttemptContext<'a> {
    AttemptContext {
        identity,
        backend,
        datastore,
        reconciler,
        poll_interval: Duration::from_millis(5),
        log_fetch_max_failures: 0,
    }
}

fn spec_for(identity: &TaskIdentity) -> JobSpec {
    JobSpecBuilder::new(&identity.step_name).build()
}

#[tokio::test]
async fn success_exits_zero_and_reconciles_once() {
    init_tracing();

    let identity = TaskIdentityBuilder::new().build();
    let backend = ScriptedBackend::new().with_states([
        JobState::Pending,
        JobState::Running,
        JobState::Succeeded,
    ]);
    let datastore = StaticDatastore::empty();
    let reconciler = RecordingReconciler::new();
    let ctx = context(&identity, &backend, &datastore, &reconciler);

    let spec = spec_for(&identity);
    let mut sink = RecordingSink::new();
    let code = with_timeout(launch_and_monitor(
        &ctx,
        &spec,
        &spec.log_location,
        &mut sink,
    ))
    .await
    .expect("pipeline should not error");

    assert_eq!(code, 0);
    assert_eq!(reconciler.invocations(), 1);
    assert_eq!(backend.submitted(), vec!["start".to_string()]);
}

#[tokio::test]
async fn execution_failure_propagates_backend_exit_code() {
    init_tracing();

    let identity = TaskIdentityBuilder::new().build();
    let backend =
        ScriptedBackend::new().with_states([JobState::Running, JobState::Failed(77)]);
    let datastore = StaticDatastore::empty();
    let reconciler = RecordingReconciler::new();
    let ctx = context(&identity, &backend, &datastore, &reconciler);

    let spec = spec_for(&identity);
    let mut sink = RecordingSink::new();
    let code = with_timeout(launch_and_monitor(
        &ctx,
        &spec,
        &spec.log_location,
        &mut sink,
    ))
    .await
    .expect("pipeline should not error");

    assert_eq!(code, 77);
    assert_eq!(reconciler.invocations(), 1);
}

#[tokio::test]
async fn killed_job_is_never_retried() {
    init_tracing();

    let identity = TaskIdentityBuilder::new().build();
    let backend = ScriptedBackend::new().with_states([
        JobState::Pending,
        JobState::Running,
        JobState::Killed,
    ]);
    let datastore = StaticDatastore::empty();
    let reconciler = RecordingReconciler::new();
    let ctx = context(&identity, &backend, &datastore, &reconciler);

    let spec = spec_for(&identity);
    let mut sink = RecordingSink::new();
    let code = with_timeout(launch_and_monitor(
        &ctx,
        &spec,
        &spec.log_location,
        &mut sink,
    ))
    .await
    .expect("pipeline should not error");

    assert_eq!(code, EXIT_DISALLOW_RETRY);
    assert_eq!(reconciler.invocations(), 1);
}

#[tokio::test]
async fn submission_failure_reconciles_and_disallows_retry() {
    init_tracing();

    let identity = TaskIdentityBuilder::new().build();
    let backend = ScriptedBackend::new().failing_submission("quota exceeded for namespace");
    let datastore = StaticDatastore::empty();
    let reconciler = RecordingReconciler::new();
    let ctx = context(&identity, &backend, &datastore, &reconciler);

    let spec = spec_for(&identity);
    let mut sink = RecordingSink::new();
    let code = with_timeout(launch_and_monitor(
        &ctx,
        &spec,
        &spec.log_location,
        &mut sink,
    ))
    .await
    .expect("submission failure maps to an exit code, not an error");

    assert_eq!(code, EXIT_DISALLOW_RETRY);
    assert_eq!(reconciler.invocations(), 1);
    assert!(backend.submitted().is_empty());
    // No job id exists if submission never produced a handle.
    assert!(sink.attached_job_id().is_none());
}

#[tokio::test]
async fn sink_learns_backend_job_id_after_submission() {
    init_tracing();

    let identity = TaskIdentityBuilder::new().build();
    let backend = ScriptedBackend::new().with_states([JobState::Running, JobState::Succeeded]);
    let datastore = StaticDatastore::empty();
    let reconciler = RecordingReconciler::new();
    let ctx = context(&identity, &backend, &datastore, &reconciler);

    let spec = spec_for(&identity);
    let mut sink = RecordingSink::new();
    with_timeout(launch_and_monitor(
        &ctx,
        &spec,
        &spec.log_location,
        &mut sink,
    ))
    .await
    .expect("pipeline should not error");

    // Tailed lines are attributed to the id the backend handed back, not
    // to anything chosen before submission.
    assert_eq!(sink.attached_job_id(), Some("fake-start"));
}
