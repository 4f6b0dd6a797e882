use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber used by the binaries. Logs go to stderr so
/// stdout only carries program output. `RUST_LOG` overrides the default
/// `info` level. Does nothing if a subscriber is already set.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
