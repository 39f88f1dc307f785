// src/encode/command.rs

//! Option re-serialization and step command-line assembly.

use std::collections::BTreeMap;

use crate::encode::chunk::chunk_env_value;

/// Value of one CLI option in an [`OptionMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Boolean flag: rendered as a bare `--key` when true, skipped when
    /// false.
    Switch(bool),
    /// Single-valued option: `--key value`.
    Single(String),
    /// Multi-valued option: the flag is repeated once per value.
    Repeated(Vec<String>),
}

/// Ordered option map, rendered back into CLI flags for the remote
/// invocation.
///
/// Insertion order is preserved so the rendered command line is stable and
/// diffable across attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionMap {
    entries: Vec<(String, OptionValue)>,
}

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn switch(mut self, key: &str, on: bool) -> Self {
        self.entries.push((key.to_string(), OptionValue::Switch(on)));
        self
    }

    pub fn single(mut self, key: &str, value: impl Into<String>) -> Self {
        self.entries
            .push((key.to_string(), OptionValue::Single(value.into())));
        self
    }

    /// Insert a single-valued option only when the value is present.
    pub fn maybe(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.single(key, v),
            None => self,
        }
    }

    pub fn repeated(mut self, key: &str, values: &[String]) -> Self {
        self.entries
            .push((key.to_string(), OptionValue::Repeated(values.to_vec())));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every oversized single value with its chunk placeholder and
    /// collect the synthesized chunk variables into `env`.
    pub fn chunk_oversized(&mut self, env: &mut BTreeMap<String, String>) {
        for (key, value) in self.entries.iter_mut() {
            if let OptionValue::Single(v) = value {
                if let Some(chunked) = chunk_env_value(key, v) {
                    *v = chunked.placeholder;
                    env.extend(chunked.vars);
                }
            }
        }
    }

    /// Render the map as CLI flags: `--key value --other ...`.
    ///
    /// Keys use hyphens on the command line regardless of how they are
    /// spelled internally.
    pub fn render(&self) -> String {
        let mut parts = Vec::new();
        for (key, value) in &self.entries {
            let flag = format!("--{}", key.replace('_', "-"));
            match value {
                OptionValue::Switch(true) => parts.push(flag),
                OptionValue::Switch(false) => {}
                OptionValue::Single(v) => {
                    parts.push(flag);
                    parts.push(quote_value(v));
                }
                OptionValue::Repeated(values) => {
                    for v in values {
                        parts.push(flag.clone());
                        parts.push(quote_value(v));
                    }
                }
            }
        }
        parts.join(" ")
    }
}

/// Single-quote a value when the shell would otherwise split or mangle it.
///
/// `$` is intentionally left unquoted: chunk placeholders (`${VAR_0}...`)
/// must stay expandable by the remote shell.
fn quote_value(value: &str) -> String {
    let needs_quoting = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '\\' | ';' | '&' | '|' | '<' | '>' | '(' | ')' | '*' | '?' | '#' | '`'));
    if !needs_quoting {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Fully encoded remote invocation: the command line plus any environment
/// variables the encoding synthesized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCommand {
    pub command_line: String,
    pub env: BTreeMap<String, String>,
}

/// Build the command line the remote job executes.
///
/// Shape: `<entrypoint> <top-level options> step <step-name> <step options>`.
/// Oversized step-option values are chunked into `env` first, so the
/// rendered line carries their placeholders instead. Encoding is pure; the
/// inputs are assumed well-formed by the CLI layer.
pub fn encode_step_command(
    entrypoint: &str,
    top_level: &OptionMap,
    step_name: &str,
    mut step_options: OptionMap,
    mut env: BTreeMap<String, String>,
) -> EncodedCommand {
    step_options.chunk_oversized(&mut env);

    let mut command_line = String::from(entrypoint);
    if !top_level.is_empty() {
        let rendered = top_level.render();
        if !rendered.is_empty() {
            command_line.push(' ');
            command_line.push_str(&rendered);
        }
    }
    command_line.push_str(" step ");
    command_line.push_str(step_name);
    if !step_options.is_empty() {
        let rendered = step_options.render();
        if !rendered.is_empty() {
            command_line.push(' ');
            command_line.push_str(&rendered);
        }
    }

    EncodedCommand { command_line, env }
}
