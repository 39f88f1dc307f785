// src/flow/loader.rs

use std::fs;
use std::path::Path;

use crate::errors::Result;
use crate::flow::model::{FlowSpec, RawFlowFile};

/// Load and validate a flow definition file.
///
/// Unlike the launcher config, the flow file is required: without it there
/// is no flow name and no step table to look options up in.
pub fn load_flow(path: impl AsRef<Path>) -> Result<FlowSpec> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let raw: RawFlowFile = toml::from_str(&contents)?;
    FlowSpec::try_from(raw)
}
