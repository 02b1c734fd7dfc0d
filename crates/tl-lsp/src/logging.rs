//! Logging setup shared by the `tl-lsp` and `tl` binaries

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "TL_LOG";

/// Install a stderr subscriber filtered by `TL_LOG` (default `warn`).
///
/// Stdout stays free for JSON-RPC and command output. Calling this twice is
/// harmless.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init();
}
