//! Configuration loading and output folder resolution
//!
//! Resolution priority for every path-valued setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is never fatal: the run continues with compiled
//! defaults after a warning. A config file that exists but does not parse is
//! a configuration error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "EMC_CONFIG";
/// Environment variable overriding the output folder
pub const OUTPUT_DIR_ENV_VAR: &str = "EMC_OUTPUT_DIR";

/// SIMBAD TAP service used by the default name and cone resolver
pub const DEFAULT_SIMBAD_TAP_URL: &str = "https://simbad.cds.unistra.fr/simbad/sim-tap";

/// Compiled defaults, used when neither CLI, ENV nor TOML provide a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn new() -> Self {
        Self {
            input_file: PathBuf::from("UniformSources").join("fullcatalog.csv"),
            output_dir: PathBuf::from("Exo-MerCat"),
            log_dir: PathBuf::from("Logs"),
            log_level: "info".to_string(),
        }
    }
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self::new()
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing level filter ("error", "warn", "info", "debug", "trace")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: CompiledDefaults::new().log_level,
        }
    }
}

/// `[resolver]` section: external name/coordinate resolution service
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    pub simbad_tap_url: String,
    /// Single fixed client timeout; large enough to be effectively unbounded
    pub timeout_secs: u64,
    pub max_requests_per_second: u32,
    /// Maximum number of names per bulk lookup query
    pub name_batch_size: usize,
    /// Growing cone-search radii in degrees, tried in order
    pub cone_radii_deg: Vec<f64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            simbad_tap_url: DEFAULT_SIMBAD_TAP_URL.to_string(),
            timeout_secs: 100_000,
            max_requests_per_second: 5,
            name_batch_size: 200,
            cone_radii_deg: vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5],
        }
    }
}

/// `[merge]` section: conflict and merge policy constants
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MergeConfig {
    /// Coordinate disagreement tolerance in degrees
    pub coordinate_tolerance_deg: f64,
    /// Number of logarithmic bins for period / semi-major axis grouping
    pub period_bins: usize,
    /// Entries heavier than this (Jupiter masses) are split off as brown dwarfs
    pub brown_dwarf_mass_limit: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            coordinate_tolerance_deg: 0.01,
            period_bins: 300,
            brown_dwarf_mass_limit: 20.0,
        }
    }
}

/// Full TOML configuration file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    /// Audit log folder, relative to `output_dir` unless absolute
    pub log_dir: PathBuf,
    /// Known-mistake replacement table (see [`crate::ReplacementPolicy`])
    pub replacements_file: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub resolver: ResolverConfig,
    pub merge: MergeConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        let defaults = CompiledDefaults::new();
        Self {
            input_file: defaults.input_file,
            output_dir: defaults.output_dir,
            log_dir: defaults.log_dir,
            replacements_file: None,
            logging: LoggingConfig::default(),
            resolver: ResolverConfig::default(),
            merge: MergeConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse a config file. The file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the merge engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.resolver.max_requests_per_second == 0 {
            return Err(Error::Config(
                "resolver.max_requests_per_second must be positive".to_string(),
            ));
        }
        if self.resolver.name_batch_size == 0 {
            return Err(Error::Config(
                "resolver.name_batch_size must be positive".to_string(),
            ));
        }
        if self.resolver.cone_radii_deg.iter().any(|r| !r.is_finite() || *r <= 0.0) {
            return Err(Error::Config(
                "resolver.cone_radii_deg entries must be positive".to_string(),
            ));
        }
        if self
            .resolver
            .cone_radii_deg
            .windows(2)
            .any(|pair| pair[0] >= pair[1])
        {
            return Err(Error::Config(
                "resolver.cone_radii_deg must be strictly increasing".to_string(),
            ));
        }
        let tolerance = self.merge.coordinate_tolerance_deg;
        if tolerance.is_nan() || tolerance <= 0.0 {
            return Err(Error::Config(
                "merge.coordinate_tolerance_deg must be positive".to_string(),
            ));
        }
        if self.merge.period_bins == 0 {
            return Err(Error::Config("merge.period_bins must be positive".to_string()));
        }
        Ok(())
    }

    /// Audit log folder resolved against the output folder
    pub fn log_dir_in(&self, output_dir: &Path) -> PathBuf {
        if self.log_dir.is_absolute() {
            self.log_dir.clone()
        } else {
            output_dir.join(&self.log_dir)
        }
    }
}

/// Locates and loads the TOML config file
pub struct ConfigResolver {
    cli_config: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_config: Option<PathBuf>) -> Self {
        Self { cli_config }
    }

    /// Config file path by priority: CLI, then ENV, then the per-user config dir
    pub fn config_path(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_config {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: ~/.config/exomercat/config.toml (platform equivalent)
        default_config_path().filter(|p| p.exists())
    }

    /// Load the config, falling back to compiled defaults if no file exists
    pub fn load(&self) -> Result<TomlConfig> {
        match self.config_path() {
            Some(path) if path.exists() => {
                tracing::info!("Loading configuration from {}", path.display());
                TomlConfig::load(&path)
            }
            Some(path) => {
                tracing::warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                Ok(TomlConfig::default())
            }
            None => {
                tracing::debug!("No config file configured, using compiled defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}

/// Output folder resolution: CLI, then ENV, then TOML (which carries the compiled default)
pub fn resolve_output_dir(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(OUTPUT_DIR_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    config.output_dir.clone()
}

/// Per-user config file location for the platform
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("exomercat").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TomlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolver.cone_radii_deg.len(), 7);
        assert_eq!(config.merge.period_bins, 300);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TomlConfig = toml::from_str("[merge]\nperiod_bins = 50\n").unwrap();
        assert_eq!(config.merge.period_bins, 50);
        assert_eq!(config.merge.coordinate_tolerance_deg, 0.01);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_unsorted_radii() {
        let mut config = TomlConfig::default();
        config.resolver.cone_radii_deg = vec![0.1, 0.01];
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_log_dir_relative_to_output() {
        let config = TomlConfig::default();
        assert_eq!(
            config.log_dir_in(Path::new("out")),
            PathBuf::from("out").join("Logs")
        );
    }
}
