use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("log filter '{value}' is not a valid tracing directive")]
    InvalidFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInitialized(Box<dyn std::error::Error + Send + Sync>),
}

/// Install the process-wide tracing subscriber. An explicit `RUST_LOG` wins
/// over the configured level so operators can raise verbosity per deployment
/// without touching configuration.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => {
            EnvFilter::try_new(&config.log_level).map_err(|source| {
                TelemetryError::InvalidFilter {
                    value: config.log_level.clone(),
                    source,
                }
            })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .try_init()
        .map_err(TelemetryError::AlreadyInitialized)
}
