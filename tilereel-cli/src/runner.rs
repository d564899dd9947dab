//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and service
//! creation so command handlers stay small.

use crate::error::CliError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tilereel::config::ConfigFile;
use tilereel::encode::create_encoder;
use tilereel::job::InMemoryJobStore;
use tilereel::logging::{init_logging, LoggingGuard};
use tilereel::provider::{AsyncReqwestClient, TileSource};
use tilereel::service::{AnimationService, ServiceConfig};
use tracing::info;

/// Finished jobs kept pollable by a CLI-created service.
const RETAINED_FINISHED_JOBS: usize = 10_000;

/// Service type used by every command.
pub type CliService = AnimationService<AsyncReqwestClient>;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// `config_path` overrides `~/.tilereel/config.ini`.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = load_config(config_path)?;

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("tilereel v{}", tilereel::VERSION);
        info!("tilereel CLI: {} command", command);
    }

    /// Builds the multi-threaded runtime commands run on.
    pub fn runtime(&self) -> Result<tokio::runtime::Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)
    }

    /// Service configuration from the config file, with an optional output
    /// directory override.
    pub fn service_config(&self, output_dir: Option<PathBuf>) -> ServiceConfig {
        let config = ServiceConfig::from_config_file(&self.config);
        match output_dir {
            Some(dir) => config.with_output_dir(dir),
            None => config,
        }
    }

    /// Create the animation service backed by the configured tile source.
    pub fn create_service(&self, service_config: ServiceConfig) -> Result<CliService, CliError> {
        let client = AsyncReqwestClient::with_timeout(self.config.download.timeout)?;
        let source = TileSource::new(&self.config.source.url_template, self.config.source.zoom)?;
        let encoder = create_encoder(self.config.render.encoder, &self.config.render.ffmpeg_path);

        info!(
            source = source.url_template(),
            zoom = source.zoom(),
            encoder = encoder.name(),
            output_dir = %service_config.output_dir().display(),
            "Service created"
        );

        Ok(AnimationService::new(
            client,
            source,
            encoder,
            Arc::new(InMemoryJobStore::with_retention(RETAINED_FINISHED_JOBS)),
            service_config,
        ))
    }
}

/// Loads the config file from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}
