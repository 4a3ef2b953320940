use tracing_subscriber::EnvFilter;

use crate::{LogFormat, LoggingConfig};

/// Initialize logging with the default settings (JSON, `info`).
pub fn init() {
    init_with(&LoggingConfig::default());
}

/// Initialize logging for the process.
///
/// `RUST_LOG` takes precedence over `config.level`. Safe to call more than
/// once; only the first call installs a subscriber.
pub fn init_with(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}
