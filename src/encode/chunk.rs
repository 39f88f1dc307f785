// src/encode/chunk.rs

//! Oversized-value chunking.
//!
//! Execution backends cap the length of a single environment value, and the
//! serialized input-paths option of a wide fan-in can blow well past that
//! cap. Any option value longer than [`MAX_ENV_VALUE_BYTES`] is split into
//! zero-indexed slices, each bound to its own environment variable; the
//! option value itself is replaced by a shell placeholder that expands the
//! chunk variables back together, in index order, inside the job.

/// Maximum length of a single environment value before chunking kicks in.
pub const MAX_ENV_VALUE_BYTES: usize = 30 * 1024;

/// Result of chunking one oversized option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedValue {
    /// Placeholder that replaces the original option value on the command
    /// line, e.g. `${STEPJOB_INPUT_PATHS_0}${STEPJOB_INPUT_PATHS_1}`.
    pub placeholder: String,
    /// Chunk variables in index order: `(name, slice)`.
    pub vars: Vec<(String, String)>,
}

/// Split `value` into 30 KiB env chunks if it exceeds the threshold.
///
/// Returns `None` when the value fits in a single environment variable; the
/// caller then uses the original value unmodified. Concatenating the chunk
/// values in index order reproduces `value` byte-for-byte.
pub fn chunk_env_value(option: &str, value: &str) -> Option<ChunkedValue> {
    if value.len() <= MAX_ENV_VALUE_BYTES {
        return None;
    }

    let prefix = chunk_var_prefix(option);
    let mut vars = Vec::new();
    let mut placeholder = String::new();

    let mut start = 0;
    let mut index = 0;
    while start < value.len() {
        let mut end = usize::min(start + MAX_ENV_VALUE_BYTES, value.len());
        // Slice boundaries must not split a multi-byte character; walking
        // the boundary back keeps every chunk valid UTF-8 while the
        // concatenation invariant still holds.
        while !value.is_char_boundary(end) {
            end -= 1;
        }

        let name = format!("{prefix}_{index}");
        placeholder.push_str(&format!("${{{name}}}"));
        vars.push((name, value[start..end].to_string()));

        start = end;
        index += 1;
    }

    Some(ChunkedValue { placeholder, vars })
}

/// Derive the env-var prefix for an option name: upper-cased, with every
/// non-alphanumeric character folded to `_`, under the crate's namespace.
fn chunk_var_prefix(option: &str) -> String {
    let upper: String = option
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("STEPJOB_{upper}")
}
