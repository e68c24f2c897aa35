use tracing_subscriber::EnvFilter;

/// Log level used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info";

/// Initializes structured logging for the binaries.
///
/// Verbosity comes from `RUST_LOG` (`RUST_LOG=debug` also logs request payloads), falling back
/// to [`DEFAULT_FILTER`]. Logs go to stderr so the client can keep stdout for responses.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    // Tests and embedders may have installed a subscriber already
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
