// tests/monitor_tailing.rs

//! The monitor streams both channels while waiting and treats log-fetch
//! errors as transient.

use std::time::Duration;

use stepjob::job::{JobHandle, JobMonitor};
use stepjob::types::{JobState, LogChannel, LogLocation, TerminalOutcome};
use stepjob_test_utils::fake_backend::{LogEvent, ScriptedBackend};
use stepjob_test_utils::recording::RecordingSink;
use stepjob_test_utils::{init_tracing, with_timeout};

fn location() -> LogLocation {
    LogLocation {
        stdout: "fake://stdout".to_string(),
        stderr: "fake://stderr".to_string(),
    }
}

fn handle() -> JobHandle {
    JobHandle {
        job_id: "fake-job".to_string(),
    }
}

#[tokio::test]
async fn streams_lines_to_sink_until_terminal() {
    init_tracing();

    let backend = ScriptedBackend::new()
        .with_states([JobState::Running, JobState::Running, JobState::Succeeded])
        .with_stdout(LogEvent::Bytes(b"first line\nsecond ".to_vec()))
        .with_stdout(LogEvent::Bytes(b"line\n".to_vec()))
        .with_stderr(LogEvent::Bytes(b"a warning\n".to_vec()));

    let monitor = JobMonitor::new(&backend, Duration::from_millis(5), 0);
    let mut sink = RecordingSink::new();
    let lines = sink.lines_handle();

    let outcome = with_timeout(monitor.wait(&handle(), &location(), &mut sink))
        .await
        .expect("wait should succeed");

    assert_eq!(outcome, TerminalOutcome::Succeeded);
    let lines = lines.lock().unwrap();
    assert!(lines.contains(&(LogChannel::Stdout, "first line".to_string())));
    assert!(lines.contains(&(LogChannel::Stdout, "second line".to_string())));
    assert!(lines.contains(&(LogChannel::Stderr, "a warning".to_string())));
}

#[tokio::test]
async fn no_tailing_while_pending() {
    init_tracing();

    // Log bytes are queued, but the first two polls report Pending; the
    // first drain happens only after the job leaves Pending.
    let backend = ScriptedBackend::new()
        .with_states([
            JobState::Pending,
            JobState::Pending,
            JobState::Running,
            JobState::Succeeded,
        ])
        .with_stdout(LogEvent::Bytes(b"hello\n".to_vec()));

    let monitor = JobMonitor::new(&backend, Duration::from_millis(5), 0);
    let mut sink = RecordingSink::new();
    let lines = sink.lines_handle();

    let outcome = with_timeout(monitor.wait(&handle(), &location(), &mut sink))
        .await
        .expect("wait should succeed");

    assert_eq!(outcome, TerminalOutcome::Succeeded);
    assert_eq!(
        *lines.lock().unwrap(),
        vec![(LogChannel::Stdout, "hello".to_string())]
    );
}

#[tokio::test]
async fn transient_fetch_error_does_not_abort_the_wait() {
    init_tracing();

    let backend = ScriptedBackend::new()
        .with_states([JobState::Running, JobState::Running, JobState::Failed(1)])
        .with_stdout(LogEvent::Error("log store briefly unavailable".to_string()))
        .with_stdout(LogEvent::Bytes(b"recovered\n".to_vec()));

    let monitor = JobMonitor::new(&backend, Duration::from_millis(5), 0);
    let mut sink = RecordingSink::new();
    let lines = sink.lines_handle();

    let outcome = with_timeout(monitor.wait(&handle(), &location(), &mut sink))
        .await
        .expect("fetch errors must not abort the wait");

    assert_eq!(outcome, TerminalOutcome::Failed(1));
    assert!(lines
        .lock()
        .unwrap()
        .contains(&(LogChannel::Stdout, "recovered".to_string())));
}

#[tokio::test]
async fn tailing_goes_quiet_after_max_consecutive_failures() {
    init_tracing();

    let backend = ScriptedBackend::new()
        .with_states([
            JobState::Running,
            JobState::Running,
            JobState::Running,
            JobState::Succeeded,
        ])
        .with_stdout(LogEvent::Error("down".to_string()))
        .with_stdout(LogEvent::Error("still down".to_string()))
        // Would be delivered, but tailing gave up after two failures.
        .with_stdout(LogEvent::Bytes(b"never seen\n".to_vec()));

    let monitor = JobMonitor::new(&backend, Duration::from_millis(5), 2);
    let mut sink = RecordingSink::new();
    let lines = sink.lines_handle();

    let outcome = with_timeout(monitor.wait(&handle(), &location(), &mut sink))
        .await
        .expect("wait should still succeed");

    assert_eq!(outcome, TerminalOutcome::Succeeded);
    assert!(lines
        .lock()
        .unwrap()
        .iter()
        .all(|(_, line)| line != "never seen"));
}

#[tokio::test]
async fn final_partial_line_is_flushed_at_terminal_state() {
    init_tracing();

    let backend = ScriptedBackend::new()
        .with_states([JobState::Running, JobState::Succeeded])
        .with_stdout(LogEvent::Bytes(b"no trailing newline".to_vec()));

    let monitor = JobMonitor::new(&backend, Duration::from_millis(5), 0);
    let mut sink = RecordingSink::new();
    let lines = sink.lines_handle();

    with_timeout(monitor.wait(&handle(), &location(), &mut sink))
        .await
        .expect("wait should succeed");

    assert!(lines
        .lock()
        .unwrap()
        .contains(&(LogChannel::Stdout, "no trailing newline".to_string())));
}
