//! Bridge bootstrap orchestration.

use std::sync::Arc;

use ortho_config::{OrthoConfig as _, OrthoError};
use thiserror::Error;

use dirbridge_config::{Config, DirectoryNaming, NamingError, SocketPreparationError};

use crate::directory::FrontendStats;
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the bridge configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The configured naming conventions are unusable.
    #[error("invalid directory naming: {source}")]
    Naming {
        /// Validation failure.
        #[source]
        source: NamingError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare listener socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
}

/// Everything the launch sequence needs once bootstrap succeeded.
pub struct Bridge {
    config: Config,
    naming: DirectoryNaming,
    stats: Arc<FrontendStats>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Bridge {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validated naming conventions.
    #[must_use]
    pub fn naming(&self) -> &DirectoryNaming {
        &self.naming
    }

    /// Shared request counters.
    #[must_use]
    pub fn stats(&self) -> &Arc<FrontendStats> {
        &self.stats
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Reporter that observed bootstrap.
    #[must_use]
    pub fn reporter(&self) -> &Arc<dyn HealthReporter> {
        &self.reporter
    }
}

/// Bootstraps the bridge using the supplied collaborators.
///
/// Every failure is passed to [`HealthReporter::bootstrap_failed`] before it
/// is returned.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Bridge, BootstrapError> {
    reporter.bootstrap_starting();
    let fail = |error: BootstrapError| {
        reporter.bootstrap_failed(&error);
        error
    };

    let config = loader
        .load()
        .map_err(|source| fail(BootstrapError::Configuration { source }))?;
    let telemetry = telemetry::initialise(&config)
        .map_err(|source| fail(BootstrapError::Telemetry { source }))?;
    let naming = DirectoryNaming::from_config(&config)
        .map_err(|source| fail(BootstrapError::Naming { source }))?;
    config
        .listen_socket()
        .prepare_filesystem()
        .map_err(|source| fail(BootstrapError::Socket { source }))?;

    reporter.bootstrap_succeeded(&config);
    Ok(Bridge {
        config,
        naming,
        stats: Arc::new(FrontendStats::default()),
        telemetry,
        reporter,
    })
}
