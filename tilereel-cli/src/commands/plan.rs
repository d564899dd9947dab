//! Plan command - show what a render would fetch and encode.

use std::path::Path;

use tilereel::config::ConfigFile;
use tilereel::pipeline::RenderPlan;
use tilereel::recipe::RecipeRegistry;

use super::common::RequestArgs;
use crate::error::CliError;
use crate::runner::load_config;

/// Run the plan command.
pub fn run(config_path: Option<&Path>, args: RequestArgs) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let plan = build_plan(&config, &args)?;
    print!("{}", describe(&plan, &config));
    Ok(())
}

fn build_plan(config: &ConfigFile, args: &RequestArgs) -> Result<RenderPlan, CliError> {
    let plan = RenderPlan::build(
        &args.to_request(),
        config.source.zoom,
        &config.render_settings(),
        &RecipeRegistry::with_builtin(),
    )?;
    Ok(plan)
}

fn describe(plan: &RenderPlan, config: &ConfigFile) -> String {
    let rect = &plan.rect;
    let tile_size = config.render.tile_size;
    let (width, height) = plan.output_dimensions(tile_size);
    let first = plan.dates.first().map(tilereel::dates::format_date);
    let last = plan.dates.last().map(tilereel::dates::format_date);

    let mut out = String::new();
    out.push_str(&format!("Zoom:         {}\n", rect.zoom()));
    out.push_str(&format!(
        "Tiles:        x {}..={}, y {}..={} ({}x{} = {})\n",
        rect.top_left.x,
        rect.bottom_right.x,
        rect.top_left.y,
        rect.bottom_right.y,
        rect.width(),
        rect.height(),
        rect.tile_count()
    ));
    out.push_str(&format!(
        "Dates:        {} to {} ({} frames)\n",
        first.unwrap_or_default(),
        last.unwrap_or_default(),
        plan.dates.len()
    ));
    out.push_str(&format!(
        "Batches:      {} rows x {} cols (max {} tiles per side)\n",
        plan.grid.rows(),
        plan.grid.cols(),
        plan.grid.max_dim()
    ));
    out.push_str(&format!("Tile fetches: {}\n", plan.fetch_count()));
    out.push_str(&format!(
        "Output:       {}x{} px, {} at {} fps\n",
        width, height, config.render.encoder, config.render.fps
    ));
    out.push_str(&format!("Recipe:       {}\n", plan.recipe.name()));
    out
}
