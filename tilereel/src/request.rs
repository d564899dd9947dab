//! Animation request payload and validation errors.

use crate::coord::CoordError;
use crate::dates::DateRangeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A client's request for one animation.
///
/// JSON form:
///
/// ```json
/// {"bbox": [-10.0, 35.0, 5.0, 45.0], "startDate": "2021-06-01", "endDate": "2021-06-10"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationRequest {
    /// `[minLon, minLat, maxLon, maxLat]` in degrees
    #[serde(alias = "boundingBox")]
    pub bbox: [f64; 4],
    /// First day, `YYYY-MM-DD`
    pub start_date: String,
    /// Last day (inclusive), `YYYY-MM-DD`
    pub end_date: String,
    /// Recipe key; the default recipe when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
}

impl AnimationRequest {
    pub fn new(bbox: [f64; 4], start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            bbox,
            start_date: start_date.into(),
            end_date: end_date.into(),
            recipe: None,
        }
    }

    pub fn with_recipe(mut self, recipe: impl Into<String>) -> Self {
        self.recipe = Some(recipe.into());
        self
    }
}

/// Reasons a request is rejected before a job is created.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error(transparent)]
    InvalidBoundingBox(#[from] CoordError),

    #[error(transparent)]
    InvalidDates(#[from] DateRangeError),

    #[error("Date range spans {days} days, the limit is {max}")]
    TooManyDays { days: usize, max: u32 },

    #[error("Area covers {tiles} tiles per frame, the limit is {max}")]
    TooManyTiles { tiles: u64, max: u64 },

    #[error("Unknown recipe '{name}' (available: {available})")]
    UnknownRecipe { name: String, available: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case() {
        let request: AnimationRequest = serde_json::from_str(
            r#"{"bbox":[-1,-1,1,1],"startDate":"2020-01-01","endDate":"2020-01-03"}"#,
        )
        .unwrap();
        assert_eq!(request, AnimationRequest::new([-1.0, -1.0, 1.0, 1.0], "2020-01-01", "2020-01-03"));
    }

    #[test]
    fn test_recipe_is_optional() {
        let request: AnimationRequest = serde_json::from_str(
            r#"{"bbox":[0,0,1,1],"startDate":"2020-01-01","endDate":"2020-01-01","recipe":"grayscale"}"#,
        )
        .unwrap();
        assert_eq!(request.recipe.as_deref(), Some("grayscale"));

        let json = serde_json::to_value(AnimationRequest::new([0.0; 4], "a", "b")).unwrap();
        assert!(json.get("recipe").is_none());
    }

    #[test]
    fn test_wrong_bbox_length_rejected() {
        let result: Result<AnimationRequest, _> = serde_json::from_str(
            r#"{"bbox":[0,0,1],"startDate":"2020-01-01","endDate":"2020-01-01"}"#,
        );
        assert!(result.is_err());
    }
}
