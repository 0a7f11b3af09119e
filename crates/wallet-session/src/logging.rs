use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::WalletError;

fn filter(config: &LoggingConfig) -> Result<EnvFilter, WalletError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| WalletError::Config(format!("log level {:?}: {e}", config.level))),
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured
/// level. Fails if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), WalletError> {
    let filter = filter(config)?;
    let registry = Registry::default().with(filter);

    let installed = match config.format {
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).try_init(),
        LogFormat::Text => registry.with(fmt::layer().with_target(false)).try_init(),
    };
    installed.map_err(|e| WalletError::Config(format!("logging already initialised: {e}")))
}
