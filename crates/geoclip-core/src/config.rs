use crate::error::{GeoclipError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for GeoClip
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// Directory under which per-job workspaces are created
    pub work_dir: ConfigValue<PathBuf>,
    /// EPSG code of the published vector outputs and bounds
    pub output_epsg: ConfigValue<u32>,
    /// Storage key prefix for published artifacts
    pub output_prefix: ConfigValue<String>,
    /// Root directory of the local object store
    pub store_root: ConfigValue<PathBuf>,
    /// Public base URL prepended to published keys
    pub public_url: ConfigValue<Option<String>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            work_dir: ConfigValue::new(env::temp_dir(), ConfigSource::Default),
            output_epsg: ConfigValue::new(4326, ConfigSource::Default),
            output_prefix: ConfigValue::new("uploads".to_string(), ConfigSource::Default),
            store_root: ConfigValue::new(PathBuf::from("./bucket"), ConfigSource::Default),
            public_url: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| GeoclipError::Config {
            key: "file".to_string(),
            reason: format!("Failed to read config file: {}", e),
        })?;

        let file_config: FileConfig = toml::from_str(&content).map_err(|e| GeoclipError::Config {
            key: "file".to_string(),
            reason: format!("Failed to parse TOML: {}", e),
        })?;

        if let Some(work_dir) = file_config.work_dir {
            self.work_dir.update(work_dir, ConfigSource::File);
        }

        if let Some(output_epsg) = file_config.output_epsg {
            self.output_epsg.update(output_epsg, ConfigSource::File);
        }

        if let Some(output_prefix) = file_config.output_prefix {
            let prefix = parse_output_prefix(&output_prefix)?;
            self.output_prefix.update(prefix, ConfigSource::File);
        }

        if let Some(store_root) = file_config.store_root {
            self.store_root.update(store_root, ConfigSource::File);
        }

        if let Some(public_url) = file_config.public_url {
            self.public_url.update(Some(public_url), ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // GEOCLIP_WORK_DIR
        if let Ok(dir) = env::var("GEOCLIP_WORK_DIR") {
            if dir.trim().is_empty() {
                tracing::warn!("Ignoring empty GEOCLIP_WORK_DIR");
            } else {
                self.work_dir.update(PathBuf::from(dir), ConfigSource::Environment);
            }
        }

        // GEOCLIP_OUTPUT_EPSG
        if let Ok(epsg_str) = env::var("GEOCLIP_OUTPUT_EPSG") {
            match parse_epsg(&epsg_str) {
                Ok(epsg) => self.output_epsg.update(epsg, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOCLIP_OUTPUT_EPSG value '{}': expected an EPSG code such as 4326",
                    epsg_str
                ),
            }
        }

        // GEOCLIP_OUTPUT_PREFIX
        if let Ok(prefix_str) = env::var("GEOCLIP_OUTPUT_PREFIX") {
            match parse_output_prefix(&prefix_str) {
                Ok(prefix) => self.output_prefix.update(prefix, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOCLIP_OUTPUT_PREFIX value '{}': expected a non-empty key prefix",
                    prefix_str
                ),
            }
        }

        // GEOCLIP_STORE_ROOT
        if let Ok(root) = env::var("GEOCLIP_STORE_ROOT") {
            if root.trim().is_empty() {
                tracing::warn!("Ignoring empty GEOCLIP_STORE_ROOT");
            } else {
                self.store_root.update(PathBuf::from(root), ConfigSource::Environment);
            }
        }

        // GEOCLIP_PUBLIC_URL
        if let Ok(url) = env::var("GEOCLIP_PUBLIC_URL") {
            self.public_url.update(Some(url), ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(work_dir) = overrides.work_dir {
            self.work_dir.update(work_dir, ConfigSource::Cli);
        }

        if let Some(output_epsg) = overrides.output_epsg {
            self.output_epsg.update(output_epsg, ConfigSource::Cli);
        }

        if let Some(store_root) = overrides.store_root {
            self.store_root.update(store_root, ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "work_dir".to_string(),
            (self.work_dir.value.display().to_string(), self.work_dir.source),
        );

        map.insert(
            "output_epsg".to_string(),
            (format!("EPSG:{}", self.output_epsg.value), self.output_epsg.source),
        );

        map.insert(
            "output_prefix".to_string(),
            (self.output_prefix.value.clone(), self.output_prefix.source),
        );

        map.insert(
            "store_root".to_string(),
            (self.store_root.value.display().to_string(), self.store_root.source),
        );

        map.insert(
            "public_url".to_string(),
            (
                self.public_url.value.clone().unwrap_or_else(|| "(none)".to_string()),
                self.public_url.source,
            ),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    work_dir: Option<PathBuf>,
    output_epsg: Option<u32>,
    output_prefix: Option<String>,
    store_root: Option<PathBuf>,
    public_url: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub work_dir: Option<PathBuf>,
    pub output_epsg: Option<u32>,
    pub store_root: Option<PathBuf>,
}

/// Parse an EPSG code given as `4326` or `EPSG:4326`
pub fn parse_epsg(s: &str) -> Result<u32> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("EPSG:")
        .or_else(|| trimmed.strip_prefix("epsg:"))
        .unwrap_or(trimmed);

    match digits.parse::<u32>() {
        Ok(code) if code > 0 => Ok(code),
        _ => Err(GeoclipError::Config {
            key: "output_epsg".to_string(),
            reason: format!("Invalid EPSG code: {}. Use a number such as 4326", s),
        }),
    }
}

/// Normalize a storage key prefix (no leading/trailing slashes)
pub fn parse_output_prefix(s: &str) -> Result<String> {
    let prefix = s.trim().trim_matches('/');
    if prefix.is_empty() || prefix.split('/').any(|part| part.is_empty() || part == "..") {
        return Err(GeoclipError::Config {
            key: "output_prefix".to_string(),
            reason: format!("Invalid output prefix: '{}'", s),
        });
    }
    Ok(prefix.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.output_epsg.value, 4326);
        assert_eq!(config.output_epsg.source, ConfigSource::Default);
        assert_eq!(config.output_prefix.value, "uploads");
        assert_eq!(config.store_root.value, PathBuf::from("./bucket"));
        assert_eq!(config.public_url.value, None);
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
work_dir = "/var/tmp/geoclip"
output_epsg = 3857
output_prefix = "/results/"
store_root = "/srv/bucket"
public_url = "https://cdn.example.com"
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.work_dir.value, PathBuf::from("/var/tmp/geoclip"));
        assert_eq!(config.output_epsg.value, 3857);
        assert_eq!(config.output_epsg.source, ConfigSource::File);
        assert_eq!(config.output_prefix.value, "results");
        assert_eq!(config.store_root.value, PathBuf::from("/srv/bucket"));
        assert_eq!(config.public_url.value.as_deref(), Some("https://cdn.example.com"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            work_dir: None,
            output_epsg: Some(32748),
            store_root: Some(PathBuf::from("/data")),
        });

        assert_eq!(config.output_epsg.value, 32748);
        assert_eq!(config.output_epsg.source, ConfigSource::Cli);
        assert_eq!(config.store_root.source, ConfigSource::Cli);
        assert_eq!(config.work_dir.source, ConfigSource::Default);
    }

    #[test]
    fn test_parse_epsg() {
        assert_eq!(parse_epsg("4326").unwrap(), 4326);
        assert_eq!(parse_epsg(" EPSG:3857 ").unwrap(), 3857);
        assert!(parse_epsg("0").is_err());
        assert!(parse_epsg("wgs84").is_err());
    }

    #[test]
    fn test_parse_output_prefix() {
        assert_eq!(parse_output_prefix("uploads").unwrap(), "uploads");
        assert_eq!(parse_output_prefix("/a/b/").unwrap(), "a/b");
        assert!(parse_output_prefix("").is_err());
        assert!(parse_output_prefix("//").is_err());
        assert!(parse_output_prefix("a/../b").is_err());
    }

    #[test]
    fn test_inspection_map() {
        let config = LayeredConfig::with_defaults();
        let map = config.to_inspection_map();

        assert_eq!(map.len(), 5);
        let (epsg, source) = &map["output_epsg"];
        assert_eq!(epsg, "EPSG:4326");
        assert_eq!(*source, ConfigSource::Default);
        assert_eq!(map["public_url"].0, "(none)");
    }
}
