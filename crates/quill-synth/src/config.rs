// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Backend configuration, read from the environment.

use tracing::warn;

pub const COMPILE_THRESHOLD_VAR: &str = "QUILL_COMPILE_THRESHOLD";
pub const TRACE_INTERPRETER_VAR: &str = "QUILL_TRACE_INTERPRETER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthConfig {
    /// Invocations a prepared form is interpreted for before it is compiled.
    /// Zero compiles eagerly.
    pub compile_threshold: u32,
    /// Emit a `trace` event for every name the interpreter evaluates.
    pub trace_interpreter: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig { compile_threshold: 30, trace_interpreter: false }
    }
}

impl SynthConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = SynthConfig::default();
        if let Some(raw) = lookup(COMPILE_THRESHOLD_VAR) {
            match raw.trim().parse::<u32>() {
                Ok(threshold) => config.compile_threshold = threshold,
                Err(_) => warn!(
                    value = %raw,
                    default = config.compile_threshold,
                    "ignoring invalid {COMPILE_THRESHOLD_VAR}"
                ),
            }
        }
        config.trace_interpreter = lookup(TRACE_INTERPRETER_VAR).is_some();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        assert_eq!(SynthConfig::from_lookup(lookup(&[])), SynthConfig::default());
    }

    #[test]
    fn reads_threshold_and_trace_flag() {
        let config = SynthConfig::from_lookup(lookup(&[
            (COMPILE_THRESHOLD_VAR, " 0 "),
            (TRACE_INTERPRETER_VAR, "1"),
        ]));
        assert_eq!(config.compile_threshold, 0);
        assert!(config.trace_interpreter);
    }

    #[test]
    fn invalid_threshold_keeps_default() {
        let config = SynthConfig::from_lookup(lookup(&[(COMPILE_THRESHOLD_VAR, "soon")]));
        assert_eq!(config.compile_threshold, 30);
    }
}
