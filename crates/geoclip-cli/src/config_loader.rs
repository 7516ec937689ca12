//! Configuration loading for CLI commands

use anyhow::{Context, Result};
use geoclip_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "geoclip.toml";

/// Defaults, then the config file, then the environment, then CLI flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_file(cli.config.as_deref()) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
        tracing::debug!("Loaded configuration from {}", path.display());
    }

    let mut config = config.load_from_env();
    config.update_from_cli(CliConfigOverrides {
        work_dir: cli.work_dir.clone(),
        output_epsg: cli.output_epsg,
        store_root: cli.store_root.clone(),
    });

    Ok(config)
}

fn config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            fallback.is_file().then_some(fallback)
        }
    }
}
