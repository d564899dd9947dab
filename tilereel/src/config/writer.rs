//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::color::format_hex_color;
use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[source]
; Tile URL template. Placeholders: {{date}} (YYYY-MM-DD), {{z}}, {{x}}, {{y}}
url_template = {}
; Zoom level tiles are fetched at (0-22)
zoom = {}

[download]
; Per-tile request timeout in seconds. Tiles that time out become placeholders.
timeout = {}

[render]
; Maximum batch edge length in tiles. Larger areas are split into batches
; that are encoded separately and stitched together.
max_batch_dim = {}
; Tile edge length in pixels; fetched tiles are resized to this size
tile_size = {}
; Output frame rate (one frame per day)
fps = {}
; Colour of tiles that could not be fetched
placeholder_color = {}
; Maximum number of days in one animation
max_days = {}
; Maximum number of tiles in one frame
max_tiles = {}
; Clip encoder: gif (built in) or ffmpeg (H.264 MP4, requires ffmpeg)
encoder = {}
ffmpeg_path = {}

[output]
; Directory finished animations are written to
directory = {}
; Root for per-job working directories
work_dir = {}
; URL prefix artifacts are served under
url_prefix = {}

[server]
bind = {}

[logging]
directory = {}
file = {}
"#,
        config.source.url_template,
        config.source.zoom,
        config.download.timeout,
        config.render.max_batch_dim,
        config.render.tile_size,
        config.render.fps,
        format_hex_color(config.render.placeholder_color),
        config.render.max_days,
        config.render.max_tiles,
        config.render.encoder,
        path_to_string(&config.render.ffmpeg_path),
        path_to_string(&config.output.directory),
        path_to_string(&config.output.work_dir),
        config.output.url_prefix,
        config.server.bind,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
