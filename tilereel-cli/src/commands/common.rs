//! Common types and utilities shared across CLI commands.

use clap::Args;
use tilereel::request::AnimationRequest;

/// Area and date range shared by `render` and `plan`.
#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    /// Bounding box as minLon,minLat,maxLon,maxLat (degrees)
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    pub bbox: [f64; 4],

    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub start: String,

    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end: String,

    /// Imagery recipe (true-color, grayscale, enhanced)
    #[arg(long)]
    pub recipe: Option<String>,
}

impl RequestArgs {
    pub fn to_request(&self) -> AnimationRequest {
        let request = AnimationRequest::new(self.bbox, &self.start, &self.end);
        match &self.recipe {
            Some(recipe) => request.with_recipe(recipe),
            None => request,
        }
    }
}

/// Parses `minLon,minLat,maxLon,maxLat`.
///
/// Only the shape is checked here; range and ordering are validated with
/// the rest of the request.
pub fn parse_bbox(value: &str) -> Result<[f64; 4], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!(
            "expected 4 comma-separated numbers, got {}",
            parts.len()
        ));
    }

    let mut bbox = [0.0; 4];
    for (slot, part) in bbox.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", part))?;
    }
    Ok(bbox)
}
