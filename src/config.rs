//! TOML-based plant configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::tags::TagPaths;
use crate::tags::memory::StoreSeed;
use crate::tags::paths;

/// Top-level configuration parsed from TOML.
///
/// All fields have defaults, so an empty file is a valid configuration.
/// Load from TOML with [`PlantConfig::from_toml_file`] or use
/// [`PlantConfig::default`] for the built-in baseline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlantConfig {
    /// Tick timing and randomness.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Tag store seeding and persistence.
    #[serde(default)]
    pub store: StoreConfig,
    /// Log filtering.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tick timing and randomness.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Root of every tag path.
    pub base_path: String,
    /// Milliseconds between ticks (must be > 0).
    pub tick_interval_ms: u64,
    /// Random seed; OS entropy when absent.
    pub seed: Option<u64>,
    /// Stop after this many ticks; run until interrupted when absent.
    pub max_ticks: Option<u64>,
    /// Save the state file every N ticks (0 = only on shutdown).
    pub snapshot_every_ticks: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_path: "Plant_Energy_Monitoring".to_string(),
            tick_interval_ms: 1000,
            seed: None,
            max_ticks: None,
            snapshot_every_ticks: 60,
        }
    }
}

/// Tag store seeding and persistence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Shift id a fresh store starts in (1..=3).
    pub initial_shift: i64,
    /// Target of the starting shift (kWh).
    pub initial_shift_target_kwh: f64,
    /// Relative counter path -> starting value.
    pub initial_counters: BTreeMap<String, f64>,
    /// JSON snapshot loaded at startup and saved while running.
    pub state_file: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_shift: 1,
            initial_shift_target_kwh: 1500.0,
            initial_counters: BTreeMap::new(),
            state_file: None,
        }
    }
}

/// Log filtering.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"engine.tick_interval_ms"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl PlantConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let e = &self.engine;

        if e.base_path.trim_matches('/').is_empty() {
            errors.push(ConfigError {
                field: "engine.base_path".into(),
                message: "must not be empty".into(),
            });
        }
        if e.tick_interval_ms == 0 {
            errors.push(ConfigError {
                field: "engine.tick_interval_ms".into(),
                message: "must be > 0".into(),
            });
        }
        if e.max_ticks == Some(0) {
            errors.push(ConfigError {
                field: "engine.max_ticks".into(),
                message: "must be > 0 when set".into(),
            });
        }

        let s = &self.store;
        if !(1..=3).contains(&s.initial_shift) {
            errors.push(ConfigError {
                field: "store.initial_shift".into(),
                message: format!("must be 1, 2 or 3, got {}", s.initial_shift),
            });
        }
        if !s.initial_shift_target_kwh.is_finite() || s.initial_shift_target_kwh < 0.0 {
            errors.push(ConfigError {
                field: "store.initial_shift_target_kwh".into(),
                message: "must be a finite value >= 0".into(),
            });
        }
        for (path, value) in &s.initial_counters {
            if !paths::COUNTERS.contains(&path.as_str()) {
                errors.push(ConfigError {
                    field: format!("store.initial_counters.\"{path}\""),
                    message: "not a counter tag".into(),
                });
            } else if !value.is_finite() || *value < 0.0 {
                errors.push(ConfigError {
                    field: format!("store.initial_counters.\"{path}\""),
                    message: "must be a finite value >= 0".into(),
                });
            }
        }

        errors
    }

    /// Tag path resolver for the configured base path.
    pub fn tag_paths(&self) -> TagPaths {
        TagPaths::new(&self.engine.base_path)
    }

    /// Initial values for a fresh tag store.
    pub fn store_seed(&self) -> StoreSeed {
        StoreSeed {
            initial_shift: self.store.initial_shift,
            shift_target_kwh: self.store.initial_shift_target_kwh,
            counters: self.store.initial_counters.clone(),
        }
    }

    /// Interval between ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.engine.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_valid() {
        let cfg = PlantConfig::default();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "default should be valid: {errors:?}");
        assert_eq!(cfg.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg = PlantConfig::from_toml_str("");
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        assert_eq!(
            cfg.as_ref().map(|c| c.engine.base_path.as_str()),
            Some("Plant_Energy_Monitoring")
        );
        assert_eq!(cfg.as_ref().map(|c| c.store.initial_shift), Some(1));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[engine]
base_path = "Bottling/Site_2"
tick_interval_ms = 250
seed = 7
max_ticks = 100
snapshot_every_ticks = 10

[store]
initial_shift = 2
initial_shift_target_kwh = 1800.0
state_file = "tags.json"

[store.initial_counters]
"Energy_Sources/DG_Set/RunHours" = 1520.25
"Filling_Line/Bottles_Produced" = 250000

[logging]
filter = "plant_sim=debug"
"#;
        let cfg = PlantConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.engine.seed), Some(Some(7)));
        assert_eq!(cfg.as_ref().map(|c| c.store.initial_counters.len()), Some(2));
        assert_eq!(
            cfg.as_ref().map(|c| c.tag_paths().resolve("X")),
            Some("Bottling/Site_2/X".to_string())
        );
        let errors = cfg.map(|c| c.validate()).unwrap_or_default();
        assert!(errors.is_empty(), "parsed config should be valid: {errors:?}");
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[engine]
tick_interval_ms = 1000
bogus_field = true
"#;
        let result = PlantConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn validation_catches_zero_interval() {
        let mut cfg = PlantConfig::default();
        cfg.engine.tick_interval_ms = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "engine.tick_interval_ms"));
    }

    #[test]
    fn validation_catches_bad_shift() {
        let mut cfg = PlantConfig::default();
        cfg.store.initial_shift = 4;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "store.initial_shift"));
    }

    #[test]
    fn validation_catches_unknown_counter() {
        let mut cfg = PlantConfig::default();
        cfg.store
            .initial_counters
            .insert("Energy_Sources/Solar_Panel/Power_kW".into(), 5.0);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.message == "not a counter tag"));
    }

    #[test]
    fn validation_catches_negative_counter() {
        let mut cfg = PlantConfig::default();
        cfg.store
            .initial_counters
            .insert("Energy_Sources/DG_Set/RunHours".into(), -1.0);
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn store_seed_carries_counters() {
        let mut cfg = PlantConfig::default();
        cfg.store.initial_shift = 3;
        cfg.store
            .initial_counters
            .insert("Energy_Sources/Main_Line/Energy_kWh".into(), 12.0);
        let seed = cfg.store_seed();
        assert_eq!(seed.initial_shift, 3);
        assert_eq!(
            seed.counters.get("Energy_Sources/Main_Line/Energy_kWh"),
            Some(&12.0)
        );
    }
}
