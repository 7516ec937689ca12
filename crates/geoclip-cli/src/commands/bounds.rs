use anyhow::{Context, Result};
use geoclip_core::config::LayeredConfig;
use geoclip_core::models::Crs;
use geoclip_geo::geo_bounds;
use geoclip_raster::read_geotiff;
use serde::Serialize;

use crate::cli::BoundsArgs;
use crate::output::OutputWriter;

#[derive(Serialize)]
struct BoundsReport {
    path: String,
    crs: String,
    width: usize,
    height: usize,
    north: f64,
    south: f64,
    east: f64,
    west: f64,
}

pub fn execute(args: BoundsArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let raster =
        read_geotiff(&args.path).with_context(|| format!("Failed to read GeoTIFF {}", args.path.display()))?;
    let source = raster
        .crs()
        .with_context(|| format!("{} has no coordinate reference system", args.path.display()))?;
    let target = Crs::from_epsg(args.epsg.unwrap_or(config.output_epsg.value));

    let bounds = geo_bounds(&raster.extent(), source, &target)?;

    if output.is_json() {
        return output.data(&BoundsReport {
            path: args.path.display().to_string(),
            crs: target.label(),
            width: raster.width(),
            height: raster.height(),
            north: bounds.north,
            south: bounds.south,
            east: bounds.east,
            west: bounds.west,
        });
    }

    output.section(format!("Bounds of {}", args.path.display()));
    output.kv("Source CRS", source.label());
    output.kv("Size", format!("{} x {} px, {} band(s)", raster.width(), raster.height(), raster.bands()));
    output.kv("Target CRS", target.label());
    output.kv("North", bounds.north);
    output.kv("South", bounds.south);
    output.kv("East", bounds.east);
    output.kv("West", bounds.west);
    Ok(())
}
