//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::color::parse_hex_color;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::MAX_ZOOM;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [source] section
    if let Some(section) = ini.section(Some("source")) {
        if let Some(v) = section.get("url_template") {
            let v = v.trim();
            if !v.contains("{x}") || !v.contains("{y}") {
                return Err(invalid(
                    "source",
                    "url_template",
                    v,
                    "must contain {x} and {y} placeholders",
                ));
            }
            config.source.url_template = v.to_string();
        }
        if let Some(v) = section.get("zoom") {
            let zoom: u8 = parse_number("source", "zoom", v, "must be an integer 0-22")?;
            if zoom > MAX_ZOOM {
                return Err(invalid("source", "zoom", v, "must be an integer 0-22"));
            }
            config.source.zoom = zoom;
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("timeout") {
            config.download.timeout =
                parse_positive("download", "timeout", v, "must be a positive integer (seconds)")?;
        }
    }

    // [render] section
    if let Some(section) = ini.section(Some("render")) {
        if let Some(v) = section.get("max_batch_dim") {
            config.render.max_batch_dim =
                parse_positive("render", "max_batch_dim", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("tile_size") {
            config.render.tile_size = parse_positive(
                "render",
                "tile_size",
                v,
                "must be a positive integer (pixels)",
            )?;
        }
        if let Some(v) = section.get("fps") {
            config.render.fps = parse_positive("render", "fps", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("placeholder_color") {
            config.render.placeholder_color = parse_hex_color(v).map_err(|_| {
                invalid(
                    "render",
                    "placeholder_color",
                    v,
                    "expected hex format like '#000000'",
                )
            })?;
        }
        if let Some(v) = section.get("max_days") {
            config.render.max_days =
                parse_positive("render", "max_days", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("max_tiles") {
            config.render.max_tiles =
                parse_positive("render", "max_tiles", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("encoder") {
            config.render.encoder = v
                .parse()
                .map_err(|_| invalid("render", "encoder", v, "must be 'gif' or 'ffmpeg'"))?;
        }
        if let Some(v) = section.get("ffmpeg_path") {
            let v = v.trim();
            if !v.is_empty() {
                config.render.ffmpeg_path = expand_tilde(v);
            }
        }
    }

    // [output] section
    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.output.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("work_dir") {
            let v = v.trim();
            if !v.is_empty() {
                config.output.work_dir = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("url_prefix") {
            config.output.url_prefix = v.trim().trim_end_matches('/').to_string();
        }
    }

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("bind") {
            let v = v.trim();
            if v.parse::<std::net::SocketAddr>().is_err() {
                return Err(invalid(
                    "server",
                    "bind",
                    v,
                    "expected socket address like '127.0.0.1:8080'",
                ));
            }
            config.server.bind = v.to_string();
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_positive<T>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    let parsed: T = parse_number(section, key, value, reason)?;
    if parsed <= T::default() {
        return Err(invalid(section, key, value, reason));
    }
    Ok(parsed)
}

/// Expand a leading `~` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::EncoderKind;
    use image::Rgba;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.render.max_batch_dim, 16);
        assert_eq!(config.render.encoder, EncoderKind::Gif);
    }

    #[test]
    fn test_overlay_values() {
        let config = parse(
            "[source]\nurl_template = http://t/{date}/{z}/{x}/{y}.png\nzoom = 4\n\
             [render]\nmax_batch_dim = 8\nfps = 5\nplaceholder_color = #ff00ff\nencoder = ffmpeg\n\
             [output]\nurl_prefix = /animations/\n",
        )
        .unwrap();

        assert_eq!(config.source.url_template, "http://t/{date}/{z}/{x}/{y}.png");
        assert_eq!(config.source.zoom, 4);
        assert_eq!(config.render.max_batch_dim, 8);
        assert_eq!(config.render.fps, 5);
        assert_eq!(config.render.placeholder_color, Rgba([255, 0, 255, 255]));
        assert_eq!(config.render.encoder, EncoderKind::Ffmpeg);
        assert_eq!(config.output.url_prefix, "/animations");
    }

    #[test]
    fn test_invalid_zoom_rejected() {
        let err = parse("[source]\nzoom = 30\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "zoom"));
    }

    #[test]
    fn test_zero_batch_dim_rejected() {
        let err = parse("[render]\nmax_batch_dim = 0\n").unwrap_err();
        assert!(
            matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "max_batch_dim")
        );
    }

    #[test]
    fn test_template_without_placeholders_rejected() {
        assert!(parse("[source]\nurl_template = http://t/tile.png\n").is_err());
    }

    #[test]
    fn test_unknown_encoder_rejected() {
        assert!(parse("[render]\nencoder = webm\n").is_err());
    }

    #[test]
    fn test_bad_bind_rejected() {
        assert!(parse("[server]\nbind = localhost\n").is_err());
    }
}
