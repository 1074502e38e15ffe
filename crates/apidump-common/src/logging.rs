use tracing_subscriber::{fmt, EnvFilter};

/// Initialize structured logging with environment filter.
/// Set APIDUMP_LOG=debug (or trace, info, warn, error) for verbosity control.
///
/// Logs go to stderr so they never mix with dump output on stdout. Safe to
/// call more than once; only the first call installs a subscriber.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Same as [`init_logging`] with a caller-chosen default level.
pub fn init_logging_with_default(default_level: &str) {
    let filter = EnvFilter::try_from_env("APIDUMP_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();
}
