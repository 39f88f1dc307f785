// src/flow/mod.rs

//! Flow definition lookup.
//!
//! The workflow graph itself is an external collaborator; this crate only
//! needs the per-step option tables it declares. The flow file is parsed
//! once into typed [`StepOptions`] structs, and everything downstream
//! queries typed fields instead of scanning a heterogeneous decorator list
//! by name.

pub mod loader;
pub mod model;

pub use loader::load_flow;
pub use model::{CondaOptions, EnvOptions, FlowSpec, RetryOptions, StepOptions};
