//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use tilereel::config::ConfigFileError;
use tilereel::provider::ProviderError;
use tilereel::request::RequestError;
use tilereel::service::SubmitError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to set up the tile source or HTTP client
    Source(ProviderError),
    /// Request rejected before any work started
    InvalidRequest(RequestError),
    /// Job could not be created
    Submit(SubmitError),
    /// Job ran and ended failed
    JobFailed { job_id: String, reason: String },
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// HTTP server error
    Serve(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::JobFailed { reason, .. } if reason.contains("ffmpeg") => {
                eprintln!();
                eprintln!("The ffmpeg encoder could not run. Either:");
                eprintln!("  1. Install ffmpeg and set render.ffmpeg_path in config.ini");
                eprintln!("  2. Switch to the built-in encoder: render.encoder = gif");
            }
            CliError::Serve(_) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Address in use: pick another with --bind or server.bind");
                eprintln!("  2. Privileged port: use a port above 1024");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Source(e) => write!(f, "Tile source error: {}", e),
            CliError::InvalidRequest(e) => write!(f, "Invalid request: {}", e),
            CliError::Submit(e) => write!(f, "Failed to submit job: {}", e),
            CliError::JobFailed { job_id, reason } => {
                write!(f, "Job {} failed: {}", job_id, reason)
            }
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Serve(e) => write!(f, "HTTP server error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Source(e) => Some(e),
            CliError::InvalidRequest(e) => Some(e),
            CliError::Submit(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Serve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Source(e)
    }
}

impl From<RequestError> for CliError {
    fn from(e: RequestError) -> Self {
        CliError::InvalidRequest(e)
    }
}

impl From<SubmitError> for CliError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Invalid(e) => CliError::InvalidRequest(e),
            other => CliError::Submit(other),
        }
    }
}
