//! Request validation and render planning.

use crate::batch::{plan_batches, BatchGrid};
use crate::config::RenderSettings;
use crate::coord::{tile_rectangle, BoundingBox, TileRectangle};
use crate::dates::DateSequence;
use crate::recipe::{Recipe, RecipeRegistry, DEFAULT_RECIPE};
use crate::request::{AnimationRequest, RequestError};

/// Everything a render needs, derived from a validated request.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub bbox: BoundingBox,
    pub rect: TileRectangle,
    pub dates: DateSequence,
    pub grid: BatchGrid,
    pub recipe: Recipe,
}

impl RenderPlan {
    /// Validates `request` and derives the tile rectangle, days and batches.
    ///
    /// # Errors
    ///
    /// Rejects a malformed bounding box, malformed or inverted dates, an
    /// unknown recipe, and requests over the configured day or tile limits.
    pub fn build(
        request: &AnimationRequest,
        zoom: u8,
        settings: &RenderSettings,
        recipes: &RecipeRegistry,
    ) -> Result<Self, RequestError> {
        let bbox = BoundingBox::from_array(request.bbox)?;
        let dates = DateSequence::from_strs(&request.start_date, &request.end_date)?;

        if dates.len() > settings.max_days() as usize {
            return Err(RequestError::TooManyDays {
                days: dates.len(),
                max: settings.max_days(),
            });
        }

        let recipe_name = request.recipe.as_deref().unwrap_or(DEFAULT_RECIPE);
        let recipe = recipes
            .get(recipe_name)
            .ok_or_else(|| RequestError::UnknownRecipe {
                name: recipe_name.to_string(),
                available: recipes.names().collect::<Vec<_>>().join(", "),
            })?;

        let rect = tile_rectangle(&bbox, zoom);
        if rect.tile_count() > settings.max_tiles() {
            return Err(RequestError::TooManyTiles {
                tiles: rect.tile_count(),
                max: settings.max_tiles(),
            });
        }

        let grid = plan_batches(&rect, settings.max_batch_dim());

        Ok(Self {
            bbox,
            rect,
            dates,
            grid,
            recipe,
        })
    }

    /// Total tile requests the render will issue.
    pub fn fetch_count(&self) -> u64 {
        self.rect.tile_count() * self.dates.len() as u64
    }

    /// Final artifact size in pixels.
    pub fn output_dimensions(&self, tile_size: u32) -> (u64, u64) {
        (
            self.rect.width() as u64 * tile_size as u64,
            self.rect.height() as u64 * tile_size as u64,
        )
    }
}
