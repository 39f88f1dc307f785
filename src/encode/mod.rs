// src/encode/mod.rs

//! Command encoding for the remote invocation.
//!
//! The remote job does not receive structured arguments; it receives one
//! shell command line that re-invokes the equivalent of "run this one step
//! with these options". This module owns:
//!
//! - [`command`]: re-serialization of option maps into CLI flags and
//!   assembly of the full step command line.
//! - [`chunk`]: encoding of oversized option values into numbered
//!   environment-variable chunks with a shell-expansion placeholder.

pub mod chunk;
pub mod command;

pub use chunk::{chunk_env_value, ChunkedValue, MAX_ENV_VALUE_BYTES};
pub use command::{encode_step_command, EncodedCommand, OptionMap, OptionValue};
