//! Diagnostic logging.
//!
//! Structured events go to stderr through `tracing`, so they never mix with
//! the tables and status lines the CLI prints on stdout. `RUST_LOG` overrides
//! the default directive.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const DEFAULT_DIRECTIVE: &str = "plmatch=info";

/// Installs the global subscriber. Returns `false` when one was already set,
/// which is harmless and happens when tests share a process.
pub fn init_logging(default_directive: &str) -> bool {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(default_directive));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}
