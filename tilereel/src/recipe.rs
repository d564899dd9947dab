//! Named frame transforms.
//!
//! A recipe is applied to each composited frame before it is encoded. The
//! registry is fixed at startup; requests name a recipe by key and an
//! unknown key is rejected before any work starts.

use image::{Rgba, RgbaImage};
use std::collections::BTreeMap;
use std::fmt;

/// Recipe used when a request does not name one.
pub const DEFAULT_RECIPE: &str = "true-color";

/// In-place frame transform.
pub type RecipeFn = fn(&mut RgbaImage);

/// A named frame transform.
#[derive(Clone, Copy)]
pub struct Recipe {
    name: &'static str,
    description: &'static str,
    apply: RecipeFn,
}

impl Recipe {
    pub const fn new(name: &'static str, description: &'static str, apply: RecipeFn) -> Self {
        Self {
            name,
            description,
            apply,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn apply(&self, frame: &mut RgbaImage) {
        (self.apply)(frame)
    }
}

impl fmt::Debug for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recipe").field("name", &self.name).finish()
    }
}

impl PartialEq for Recipe {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Lookup table of available recipes.
#[derive(Debug, Clone)]
pub struct RecipeRegistry {
    recipes: BTreeMap<&'static str, Recipe>,
}

impl RecipeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            recipes: BTreeMap::new(),
        }
    }

    /// Registry with the built-in recipes.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Recipe::new(
            DEFAULT_RECIPE,
            "Source imagery unchanged",
            identity,
        ));
        registry.register(Recipe::new(
            "grayscale",
            "Luma-weighted grayscale",
            grayscale,
        ));
        registry.register(Recipe::new(
            "enhanced",
            "Per-channel contrast stretch",
            contrast_stretch,
        ));
        registry
    }

    /// Adds or replaces a recipe.
    pub fn register(&mut self, recipe: Recipe) {
        self.recipes.insert(recipe.name, recipe);
    }

    pub fn get(&self, name: &str) -> Option<Recipe> {
        self.recipes.get(name).copied()
    }

    /// Recipe names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.recipes.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> + '_ {
        self.recipes.values()
    }
}

impl Default for RecipeRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

fn identity(_frame: &mut RgbaImage) {}

fn grayscale(frame: &mut RgbaImage) {
    for pixel in frame.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        // Rec. 601 luma
        let luma = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u8;
        *pixel = Rgba([luma, luma, luma, a]);
    }
}

/// Stretches each colour channel so its observed range spans 0..=255.
fn contrast_stretch(frame: &mut RgbaImage) {
    let mut low = [u8::MAX; 3];
    let mut high = [u8::MIN; 3];
    for pixel in frame.pixels() {
        for c in 0..3 {
            low[c] = low[c].min(pixel.0[c]);
            high[c] = high[c].max(pixel.0[c]);
        }
    }

    for pixel in frame.pixels_mut() {
        for c in 0..3 {
            let range = high[c].saturating_sub(low[c]);
            if range == 0 {
                continue;
            }
            let v = (pixel.0[c] - low[c]) as u32 * 255 / range as u32;
            pixel.0[c] = v as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_recipes() {
        let registry = RecipeRegistry::with_builtin();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["enhanced", "grayscale", "true-color"]);
        assert!(registry.get(DEFAULT_RECIPE).is_some());
        assert!(registry.get("infrared").is_none());
    }

    #[test]
    fn test_true_color_is_identity() {
        let mut frame = RgbaImage::from_pixel(2, 2, Rgba([10, 200, 30, 255]));
        let before = frame.clone();
        RecipeRegistry::default()
            .get(DEFAULT_RECIPE)
            .unwrap()
            .apply(&mut frame);
        assert_eq!(frame, before);
    }

    #[test]
    fn test_grayscale_equalizes_channels() {
        let mut frame = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 200]));
        grayscale(&mut frame);
        let p = frame.get_pixel(0, 0);
        assert_eq!(p.0[0], p.0[1]);
        assert_eq!(p.0[1], p.0[2]);
        assert_eq!(p.0[0], 76);
        assert_eq!(p.0[3], 200);
    }

    #[test]
    fn test_contrast_stretch_spans_full_range() {
        let mut frame = RgbaImage::new(2, 1);
        frame.put_pixel(0, 0, Rgba([100, 50, 50, 255]));
        frame.put_pixel(1, 0, Rgba([150, 50, 60, 255]));
        contrast_stretch(&mut frame);

        assert_eq!(frame.get_pixel(0, 0).0, [0, 50, 0, 255]);
        assert_eq!(frame.get_pixel(1, 0).0, [255, 50, 255, 255]);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = RecipeRegistry::new();
        registry.register(Recipe::new("x", "first", identity));
        registry.register(Recipe::new("x", "second", grayscale));
        assert_eq!(registry.get("x").unwrap().description(), "second");
    }
}
