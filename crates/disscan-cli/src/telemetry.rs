use tracing_subscriber::EnvFilter;

/// Logs go to stderr so they never mix with the per-invite lines on stdout.
/// `RUST_LOG` overrides the default `warn` level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
}
