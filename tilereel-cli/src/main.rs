//! tilereel CLI - Command-line interface
//!
//! Renders daily satellite imagery over an area into an animation, either
//! once from the command line or as a long-running HTTP job service.

mod api;
mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::common::RequestArgs;
use commands::config::ConfigCommands;

#[derive(Parser)]
#[command(name = "tilereel")]
#[command(version, about = "Turn daily map tiles into animations", long_about = None)]
struct Cli {
    /// Config file (default: ~/.tilereel/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an animation and wait for it to finish
    Render {
        #[command(flatten)]
        request: RequestArgs,

        /// Directory for the finished animation (overrides output.directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Show tiles, batches and fetch count without downloading anything
    Plan {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Run the HTTP job API
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,

        /// Directory for finished animations (overrides output.directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Render {
            request,
            output_dir,
        } => commands::render::run(
            config_path,
            commands::render::RenderArgs {
                request,
                output_dir,
            },
        ),
        Commands::Plan { request } => commands::plan::run(config_path, request),
        Commands::Serve { bind, output_dir } => commands::serve::run(
            config_path,
            commands::serve::ServeArgs { bind, output_dir },
        ),
        Commands::Config { command } => commands::config::run(config_path, command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
