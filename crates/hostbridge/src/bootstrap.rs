//! Bridge bootstrap orchestration.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use hostbridge_config::Config;

use crate::context::{BridgeContext, BridgeHost};
use crate::health::HealthReporter;
use crate::response::ResponseSink;
use crate::telemetry::{self, TelemetryError};
use crate::worker::WorkerError;

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the bridge configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader error when any configuration layer is invalid.
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

/// Loader returning a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
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
    /// The I/O worker could not start.
    #[error("failed to start bridge worker: {source}")]
    Worker {
        /// Underlying worker error.
        #[source]
        source: WorkerError,
    },
}

/// Loads configuration, initialises telemetry and builds a bridge.
///
/// `host` receives the resolved configuration so that collaborators can be
/// chosen from it.
///
/// # Errors
///
/// Returns [`BootstrapError`] for the first stage that fails; the reporter
/// is told before the error is returned.
pub fn bootstrap_with<H>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    host: H,
    sink: Box<dyn ResponseSink>,
) -> Result<BridgeContext, BootstrapError>
where
    H: FnOnce(&Config) -> BridgeHost,
{
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    if let Err(source) = telemetry::initialise(&config) {
        let error = BootstrapError::Telemetry { source };
        reporter.bootstrap_failed(&error);
        return Err(error);
    }

    let host = host(&config);
    let context = match BridgeContext::new(config.clone(), host, sink) {
        Ok(context) => context,
        Err(source) => {
            let error = BootstrapError::Worker { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    reporter.bootstrap_succeeded(&config);
    Ok(context.with_reporter(reporter))
}
