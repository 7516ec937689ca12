use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// geoclip - clip a vector and a raster layer to a boundary polygon
#[derive(Parser, Debug)]
#[command(name = "geoclip")]
#[command(about = "Clip a shapefile and a GeoTIFF to a boundary and publish the results", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory job workspaces are created in
    #[arg(long, global = true)]
    pub work_dir: Option<PathBuf>,

    /// Directory acting as the object store bucket
    #[arg(long, global = true)]
    pub store_root: Option<PathBuf>,

    /// EPSG code of the vector outputs and reported bounds (e.g. 4326)
    #[arg(long, global = true, value_parser = parse_epsg_arg)]
    pub output_epsg: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one clip job from an event file
    Run(RunArgs),

    /// Print the geographic bounds of a local GeoTIFF
    Bounds(BoundsArgs),

    /// Show the effective configuration and where each value comes from
    Config,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Event or job JSON file, `-` for stdin
    #[arg(long)]
    pub job: PathBuf,
}

#[derive(Parser, Debug)]
pub struct BoundsArgs {
    /// GeoTIFF to inspect
    pub path: PathBuf,

    /// Target EPSG code (defaults to the configured output EPSG)
    #[arg(long, value_parser = parse_epsg_arg)]
    pub epsg: Option<u32>,
}

fn parse_epsg_arg(s: &str) -> Result<u32, String> {
    geoclip_core::config::parse_epsg(s).map_err(|e| e.to_string())
}
