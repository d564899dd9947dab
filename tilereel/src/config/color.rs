//! Hex colour parsing (e.g., "#1e1e1e", "000000").

use image::Rgba;
use thiserror::Error;

/// Error parsing a colour string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid colour '{input}' - expected hex format like '#000000' or '#ff00ff'")]
pub struct ColorParseError {
    input: String,
}

/// Parse a `#RRGGBB` (or `RRGGBB`) string into an opaque RGBA pixel.
///
/// # Examples
///
/// ```
/// use tilereel::config::parse_hex_color;
///
/// assert_eq!(parse_hex_color("#ff00ff").unwrap().0, [255, 0, 255, 255]);
/// assert_eq!(parse_hex_color("000000").unwrap().0, [0, 0, 0, 255]);
/// ```
pub fn parse_hex_color(s: &str) -> Result<Rgba<u8>, ColorParseError> {
    let err = || ColorParseError {
        input: s.to_string(),
    };

    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(err());
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, 255]))
}

/// Format a pixel as `#rrggbb`, ignoring alpha.
pub fn format_hex_color(color: Rgba<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}
