// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tracing subscriber setup. Library crates only emit events; the binary
//! decides where they go.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

/// Filter directives, e.g. `QUILL_LOG=quill_resolve=debug`.
pub const LOG_VAR: &str = "QUILL_LOG";

static INIT: OnceLock<()> = OnceLock::new();

/// Installs the stderr subscriber. `verbose` overrides `QUILL_LOG` with
/// `debug`; otherwise the default level is `warn`.
pub fn init(verbose: bool) {
    use std::io::IsTerminal;

    INIT.get_or_init(|| {
        let use_ansi = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        let filter = if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("warn"))
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(use_ansi)
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact()
            .try_init();
    });
}
