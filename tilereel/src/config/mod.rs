//! Configuration for tilereel components.
//!
//! [`ConfigFile`] mirrors `~/.tilereel/config.ini` section by section;
//! [`RenderSettings`] is the immutable subset the render pipeline consumes.
//!
//! # Example
//!
//! ```
//! use tilereel::config::{ConfigFile, RenderSettings};
//!
//! let config = ConfigFile::default();
//! let settings: RenderSettings = config.render_settings();
//! assert_eq!(settings.max_batch_dim(), 16);
//! ```

mod color;
mod defaults;
mod file;
mod parser;
mod render;
mod settings;
mod writer;

pub use color::{format_hex_color, parse_hex_color, ColorParseError};
pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use render::RenderSettings;
pub use settings::{
    ConfigFile, DownloadSettings, LoggingSettings, OutputSettings, RenderFileSettings,
    ServerSettings, SourceSettings,
};
