use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stepjob::datastore::{FlowDatastore, MetadataRecord, Reconciler, TaskDatastore};
use stepjob::errors::Result;
use stepjob::job::LogSink;
use stepjob::retry::Sleeper;
use stepjob::types::{LogChannel, TaskIdentity};

/// Reconciler double that only counts invocations.
#[derive(Default)]
pub struct RecordingReconciler {
    invocations: AtomicUsize,
}

impl RecordingReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl Reconciler for RecordingReconciler {
    fn sync(&self, _datastore: &dyn FlowDatastore, _identity: &TaskIdentity) {
        self.invocations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Log sink that records every appended line.
///
/// Clone the handle before handing the sink to the monitor so assertions
/// can read the lines afterwards.
#[derive(Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<(LogChannel, String)>>>,
    attached: Option<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines_handle(&self) -> Arc<Mutex<Vec<(LogChannel, String)>>> {
        Arc::clone(&self.lines)
    }

    /// Job id the pipeline attached after submission, if any.
    pub fn attached_job_id(&self) -> Option<&str> {
        self.attached.as_deref()
    }
}

impl LogSink for RecordingSink {
    fn attach(&mut self, job_id: &str) {
        self.attached = Some(job_id.to_string());
    }

    fn append(&mut self, channel: LogChannel, line: &str) {
        self.lines.lock().unwrap().push((channel, line.to_string()));
    }
}

/// Sleeper double: records each requested duration and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.slept.lock().unwrap().push(duration);
        Box::pin(std::future::ready(()))
    }
}

/// Datastore double: a fixed set of metadata records, no filesystem.
pub struct StaticDatastore {
    records: Vec<MetadataRecord>,
}

impl StaticDatastore {
    pub fn new(records: Vec<MetadataRecord>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl FlowDatastore for StaticDatastore {
    fn kind(&self) -> &'static str {
        "static"
    }

    fn task_datastore(&self, _identity: &TaskIdentity) -> Result<Box<dyn TaskDatastore>> {
        Ok(Box::new(StaticTaskDatastore {
            records: self.records.clone(),
        }))
    }
}

struct StaticTaskDatastore {
    records: Vec<MetadataRecord>,
}

impl TaskDatastore for StaticTaskDatastore {
    fn log_location(&self, channel: LogChannel) -> String {
        format!("static://{channel}")
    }

    fn metadata_records(&self) -> Result<Vec<MetadataRecord>> {
        Ok(self.records.clone())
    }
}
