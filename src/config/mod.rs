// src/config/mod.rs

//! Launcher configuration.
//!
//! Small set of operator-facing knobs: how often the
//! monitor polls the backend, how tolerant log tailing is of transient
//! fetch errors, and where the local datastore and metadata cache live.

pub mod loader;
pub mod model;

pub use loader::load_config;
pub use model::LauncherConfig;
