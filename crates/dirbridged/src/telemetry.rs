//! Structured telemetry initialisation for the bridge.
//!
//! Events go to stderr through a single `fmt` layer on top of the registry.
//! The subscriber is global, so only the first configuration to reach
//! [`initialise`] takes effect for the life of the process.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, registry};

use dirbridge_config::{Config, LogFormat};

static INSTALLED_FORMAT: OnceCell<LogFormat> = OnceCell::new();

const FALLBACK_FILTER: &str = "info";

/// Proof that the global subscriber is in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Output format of the installed subscriber.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter directives did not parse.
    #[error("invalid log filter '{directives}': {message}")]
    Filter {
        /// Directives as configured.
        directives: String,
        /// Parser message.
        message: String,
    },
    /// Another global subscriber was already registered.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Installs the global subscriber on first use.
///
/// Later calls return a handle describing the subscriber already in place
/// and never touch global state, so bootstrap can run repeatedly in one
/// process.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED_FORMAT
        .get_or_try_init(|| install_subscriber(config).map(|()| config.log_format()))
        .map(|format| TelemetryHandle { format: *format })
}

fn directive_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    let directives = match directives.trim() {
        "" => FALLBACK_FILTER,
        trimmed => trimmed,
    };
    EnvFilter::try_new(directives).map_err(|error| TelemetryError::Filter {
        directives: directives.to_owned(),
        message: error.to_string(),
    })
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = directive_filter(config.log_filter())?;
    let format = config.log_format();
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(!format.is_structured() && io::stderr().is_terminal())
        .with_target(true)
        .with_thread_names(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let base = registry().with(filter);
    match format {
        LogFormat::Json => base.with(layer.json().flatten_event(true)).try_init()?,
        LogFormat::Compact => base.with(layer.compact()).try_init()?,
        LogFormat::Pretty => base.with(layer.pretty()).try_init()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("dirbridged=notalevel")]
    #[case("dirbridged=loud")]
    fn rejects_unparseable_filters(#[case] directives: &str) {
        let error = directive_filter(directives).expect_err("invalid directives");
        assert!(matches!(error, TelemetryError::Filter { .. }));
    }

    #[test]
    fn blank_filter_falls_back_to_info() {
        let filter = directive_filter("   ").expect("fallback filter");
        assert!(filter.to_string().contains(FALLBACK_FILTER));
    }

    #[test]
    fn first_configuration_wins() {
        let compact = Config {
            log_format: LogFormat::Compact,
            ..Config::default()
        };
        let json = Config {
            log_format: LogFormat::Json,
            ..Config::default()
        };
        let first = initialise(&compact).expect("first initialise");
        let second = initialise(&json).expect("second initialise");
        assert_eq!(first, second);
    }
}
