//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (path, show, init)
//! - [`plan`] - Dry run: tiles, batches and fetch count for a request
//! - [`render`] - Render one animation and wait for it
//! - [`serve`] - HTTP job API

pub mod common;
pub mod config;
pub mod plan;
pub mod render;
pub mod serve;
