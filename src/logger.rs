//! Logging setup for the binary.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global subscriber.
///
/// Honors `RUST_LOG`, falling back to `info`. Fails if a subscriber is
/// already installed.
pub fn init_logger() -> crate::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| crate::Error::Config(format!("cannot install logger: {e}")))
}
