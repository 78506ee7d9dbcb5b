//! Configuration loading and typed config structures for the Annals simulation.
//!
//! The canonical configuration lives in `annals-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads the file. Every section and
//! every field is optional and falls back to the defaults below.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable that overrides `engine.autosave_dir`.
pub const AUTOSAVE_DIR_ENV: &str = "ANNALS_AUTOSAVE_DIR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `annals-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// World identity and calendar.
    #[serde(default)]
    pub world: WorldConfig,

    /// Turn loop, autosave, and persistence settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Parameters of the built-in AI.
    #[serde(default)]
    pub ai: AiConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `ANNALS_AUTOSAVE_DIR` overrides `engine.autosave_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.engine.apply_env_overrides();
        Ok(config)
    }
}

/// World identity and calendar.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable world name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Seed string for the UUID namespace all entity ids derive from.
    /// Two engines with the same seed allocate the same ids.
    #[serde(default = "default_namespace_seed")]
    pub namespace_seed: String,

    /// Explicit world id. Derived from the namespace when absent.
    #[serde(default)]
    pub world_id: Option<uuid::Uuid>,

    /// Calendar year before the first turn.
    #[serde(default = "default_start_year")]
    pub start_year: i32,

    /// Years that pass per turn.
    #[serde(default = "default_years_per_turn")]
    pub years_per_turn: u32,

    /// Seed for starting-trait generation. Never used inside a turn.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Names of the nations spawned at startup.
    #[serde(default = "default_nations")]
    pub nations: Vec<String>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            namespace_seed: default_namespace_seed(),
            world_id: None,
            start_year: default_start_year(),
            years_per_turn: default_years_per_turn(),
            seed: default_seed(),
            nations: default_nations(),
        }
    }
}

/// Turn loop, autosave, and persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Stop after this many turns. 0 runs until victory or operator stop.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Write a snapshot every N turns. 0 disables autosave.
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval: u32,

    /// Directory for autosave snapshots.
    #[serde(default)]
    pub autosave_dir: Option<PathBuf>,

    /// Real-time milliseconds between turns in the runner loop.
    #[serde(default = "default_turn_interval_ms")]
    pub turn_interval_ms: u64,

    /// Whether to push each turn's changes to the durable store.
    #[serde(default)]
    pub sync_enabled: bool,

    /// Root directory of the JSON durable store.
    #[serde(default = "default_sync_dir")]
    pub sync_dir: PathBuf,

    /// End the game when exactly one nation is left alive. Turn off for
    /// single-nation sandboxes.
    #[serde(default = "default_victory_check")]
    pub victory_check: bool,
}

impl EngineConfig {
    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(AUTOSAVE_DIR_ENV) {
            self.autosave_dir = Some(PathBuf::from(val));
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            autosave_interval: default_autosave_interval(),
            autosave_dir: None,
            turn_interval_ms: default_turn_interval_ms(),
            sync_enabled: false,
            sync_dir: default_sync_dir(),
            victory_check: default_victory_check(),
        }
    }
}

/// Parameters of the built-in AI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AiConfig {
    /// Turns between foundings before the expansionist discount.
    #[serde(default = "default_turns_per_city_base")]
    pub turns_per_city_base: u32,

    /// Lower bound on turns between foundings.
    #[serde(default = "default_turns_per_city_min")]
    pub turns_per_city_min: u32,

    /// The AI stops founding at this many cities.
    #[serde(default = "default_max_cities")]
    pub max_cities: usize,

    /// Minimum Manhattan distance between city centers.
    #[serde(default = "default_min_city_distance")]
    pub min_city_distance: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            turns_per_city_base: default_turns_per_city_base(),
            turns_per_city_min: default_turns_per_city_min(),
            max_cities: default_max_cities(),
            min_city_distance: default_min_city_distance(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit one JSON object per line instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_world_name() -> String {
    String::from("Annals")
}

fn default_namespace_seed() -> String {
    String::from("annals-world")
}

const fn default_start_year() -> i32 {
    -4000
}

const fn default_years_per_turn() -> u32 {
    40
}

const fn default_seed() -> u64 {
    42
}

fn default_nations() -> Vec<String> {
    vec![
        String::from("Akkad"),
        String::from("Elam"),
        String::from("Mari"),
    ]
}

const fn default_max_turns() -> u32 {
    200
}

const fn default_autosave_interval() -> u32 {
    25
}

const fn default_turn_interval_ms() -> u64 {
    250
}

fn default_sync_dir() -> PathBuf {
    PathBuf::from("data/annals")
}

const fn default_victory_check() -> bool {
    true
}

const fn default_turns_per_city_base() -> u32 {
    15
}

const fn default_turns_per_city_min() -> u32 {
    5
}

const fn default_max_cities() -> usize {
    5
}

const fn default_min_city_distance() -> u32 {
    4
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.world.start_year, -4000);
        assert_eq!(config.world.years_per_turn, 40);
        assert_eq!(config.world.nations.len(), 3);
        assert_eq!(config.ai.turns_per_city_base, 15);
        assert_eq!(config.ai.turns_per_city_min, 5);
        assert_eq!(config.ai.max_cities, 5);
        assert_eq!(config.ai.min_city_distance, 4);
        assert!(!config.engine.sync_enabled);
        assert!(config.engine.victory_check);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  name: "Test World"
  namespace_seed: "test-seed"
  start_year: -3000
  years_per_turn: 20
  seed: 7
  nations: ["Ur", "Uruk"]

engine:
  max_turns: 50
  autosave_interval: 10
  turn_interval_ms: 500
  sync_enabled: true
  sync_dir: "/tmp/annals"
  victory_check: false

ai:
  turns_per_city_base: 12
  turns_per_city_min: 4
  max_cities: 3
  min_city_distance: 5

logging:
  level: "debug"
  json: true
"#;
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.world.name, "Test World");
        assert_eq!(config.world.namespace_seed, "test-seed");
        assert_eq!(config.world.start_year, -3000);
        assert_eq!(config.world.years_per_turn, 20);
        assert_eq!(config.world.nations, vec!["Ur", "Uruk"]);
        assert_eq!(config.engine.max_turns, 50);
        assert_eq!(config.engine.autosave_interval, 10);
        assert!(config.engine.sync_enabled);
        assert_eq!(config.engine.sync_dir, PathBuf::from("/tmp/annals"));
        assert!(!config.engine.victory_check);
        assert_eq!(config.ai.max_cities, 3);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let yaml = "world:\n  name: \"Partial\"\n";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.world.name, "Partial");
        assert_eq!(config.world.years_per_turn, 40);
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.ai, AiConfig::default());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = SimulationConfig::parse("world: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = SimulationConfig::from_file(Path::new("/nonexistent/annals-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
