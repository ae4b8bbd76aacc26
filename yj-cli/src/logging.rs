use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for the CLI.
///
/// Verbosity comes from `RUST_LOG`; the default shows `info` and above.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}
