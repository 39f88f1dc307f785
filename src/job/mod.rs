// src/job/mod.rs

//! Job submission and monitoring.
//!
//! The execution backend (the system that actually runs containers) is
//! consumed through the [`JobBackend`] trait: submit a fully-resolved
//! [`JobSpec`], then poll the returned handle for lifecycle state and log
//! content. Modules:
//!
//! - [`spec`]: the fully-resolved submission request.
//! - [`backend`]: the `JobBackend` trait and job handle.
//! - [`local`]: a process-based backend for development and tests.
//! - [`launcher`]: one-shot submission with failure classification.
//! - [`monitor`]: terminal-state wait with best-effort log tailing.

pub mod backend;
pub mod launcher;
pub mod local;
pub mod monitor;
pub mod spec;

pub use backend::{JobBackend, JobHandle};
pub use launcher::JobLauncher;
pub use local::LocalProcessBackend;
pub use monitor::{ConsoleSink, JobMonitor, LogSink};
pub use spec::{CodePackage, JobSpec};
