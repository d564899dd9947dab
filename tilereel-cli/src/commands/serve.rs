//! Serve command - run the HTTP job API.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::api;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the serve command.
pub struct ServeArgs {
    pub bind: Option<String>,
    pub output_dir: Option<PathBuf>,
}

/// Run the serve command until the process is interrupted.
pub fn run(config_path: Option<&Path>, args: ServeArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path)?;
    runner.log_startup("serve");

    // CLI > config
    let bind = args
        .bind
        .unwrap_or_else(|| runner.config().server.bind.clone());
    let service_config = runner.service_config(args.output_dir);

    let runtime = runner.runtime()?;
    runtime.block_on(async {
        let service = runner.create_service(service_config)?;
        let listener = tokio::net::TcpListener::bind(&bind)
            .await
            .map_err(CliError::Serve)?;

        info!(bind = %bind, "HTTP server listening");
        println!("Listening on http://{}", bind);

        axum::serve(listener, api::router(service))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown requested");
            })
            .await
            .map_err(CliError::Serve)
    })
}
