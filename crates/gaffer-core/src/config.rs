// Configuration loading and parsing (selection.toml, simulation.toml).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::player::Position;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub capacity: CapacityConfig,
    pub simulation: SimulationConfig,
}

// ---------------------------------------------------------------------------
// Per-position tables
// ---------------------------------------------------------------------------

/// One value per position, keyed by the position label in TOML
/// (`GK = 1`, `DEF = 3`, ...). Every position must be present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerPosition<T> {
    #[serde(rename = "GK", alias = "GKP")]
    pub gk: T,
    #[serde(rename = "DEF")]
    pub def: T,
    #[serde(rename = "MID")]
    pub mid: T,
    #[serde(rename = "FWD")]
    pub fwd: T,
}

impl<T: Copy> PerPosition<T> {
    pub fn get(&self, position: Position) -> T {
        match position {
            Position::GK => self.gk,
            Position::DEF => self.def,
            Position::MID => self.mid,
            Position::FWD => self.fwd,
        }
    }

    /// Iterate `(position, value)` pairs in quota order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, T)> + '_ {
        Position::ALL.into_iter().map(move |pos| (pos, self.get(pos)))
    }
}

// ---------------------------------------------------------------------------
// selection.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[capacity]` table in selection.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SelectionFile {
    capacity: CapacityConfig,
}

/// Lineup capacity policy: what a legal squad looks like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapacityConfig {
    /// Required count per position, filled in the quota phase.
    pub position_quota: PerPosition<usize>,
    /// Slots filled by best remaining predicted score, any position.
    pub flex_slots: usize,
    /// Total spend ceiling.
    pub budget_cap: f64,
    /// Maximum players from a single team across the lineup.
    pub max_per_team: usize,
}

impl CapacityConfig {
    /// Sum of all position quotas.
    pub fn quota_total(&self) -> usize {
        self.position_quota.iter().map(|(_, n)| n).sum()
    }

    /// Number of players in a complete squad.
    pub fn target_size(&self) -> usize {
        self.quota_total() + self.flex_slots
    }
}

impl Default for CapacityConfig {
    fn default() -> Self {
        CapacityConfig {
            position_quota: PerPosition {
                gk: 1,
                def: 3,
                mid: 3,
                fwd: 1,
            },
            flex_slots: 3,
            budget_cap: 100.0,
            max_per_team: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// simulation.toml structs
// ---------------------------------------------------------------------------

/// All tunables for the Monte Carlo side, assembled from simulation.toml.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub volatility: VolatilityConfig,
    pub thresholds: OutcomeThresholds,
    pub samples: SampleCounts,
    pub uncertainty: UncertaintyConfig,
}

/// Position-aware volatility parameters used for captaincy simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VolatilityConfig {
    /// Positional floor for the standard deviation.
    pub base_stdev: PerPosition<f64>,
    /// Stdev added per unit of attacking involvement.
    pub explosiveness_factor: f64,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        VolatilityConfig {
            base_stdev: PerPosition {
                gk: 1.2,
                def: 1.6,
                mid: 2.3,
                fwd: 3.0,
            },
            explosiveness_factor: 0.4,
        }
    }
}

/// Fixed policy thresholds for haul/blank outcomes (points, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutcomeThresholds {
    pub haul: f64,
    pub blank: f64,
}

impl Default for OutcomeThresholds {
    fn default() -> Self {
        OutcomeThresholds {
            haul: 12.0,
            blank: 2.0,
        }
    }
}

/// Default sample counts per operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SampleCounts {
    pub captaincy: usize,
    pub uncertainty: usize,
}

impl Default for SampleCounts {
    fn default() -> Self {
        SampleCounts {
            captaincy: 8_000,
            uncertainty: 1_000,
        }
    }
}

/// Position-agnostic stdev heuristic for uncertainty bands:
/// `max(min_stdev, relative_stdev * mean)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UncertaintyConfig {
    pub min_stdev: f64,
    pub relative_stdev: f64,
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        UncertaintyConfig {
            min_stdev: 1.5,
            relative_stdev: 0.35,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/selection.toml` and
/// `config/simulation.toml`, relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config_in()` which handles default initialization.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let selection: SelectionFile = parse_file(&config_dir.join("selection.toml"))?;
    let simulation: SimulationConfig = parse_file(&config_dir.join("simulation.toml"))?;

    let config = Config {
        capacity: selection.capacity,
        simulation,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or pass --base-dir",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Copy any missing defaults into `base_dir/config`, then load.
pub fn load_config_in(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

/// Convenience wrapper: loads config relative to the current working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_in(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn parse_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = read_file(path)?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check a fully assembled config. Also used for configs built in code.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let cap = &config.capacity;

    if !cap.budget_cap.is_finite() || cap.budget_cap <= 0.0 {
        return Err(invalid(
            "capacity.budget_cap",
            format!("must be finite and > 0, got {}", cap.budget_cap),
        ));
    }
    if cap.max_per_team == 0 {
        return Err(invalid("capacity.max_per_team", "must be > 0"));
    }
    if cap.target_size() == 0 {
        return Err(invalid(
            "capacity.flex_slots",
            "position quotas plus flex slots must be > 0",
        ));
    }

    let sim = &config.simulation;

    for (pos, stdev) in sim.volatility.base_stdev.iter() {
        if !stdev.is_finite() || stdev <= 0.0 {
            return Err(invalid(
                &format!("volatility.base_stdev.{pos}"),
                format!("must be finite and > 0, got {stdev}"),
            ));
        }
    }

    let factor = sim.volatility.explosiveness_factor;
    if !factor.is_finite() || factor < 0.0 {
        return Err(invalid(
            "volatility.explosiveness_factor",
            format!("must be finite and >= 0, got {factor}"),
        ));
    }

    let t = &sim.thresholds;
    if !t.haul.is_finite() || !t.blank.is_finite() || t.haul <= t.blank {
        return Err(invalid(
            "thresholds.haul",
            format!("must be greater than thresholds.blank ({} <= {})", t.haul, t.blank),
        ));
    }

    let counts: &[(&str, usize)] = &[
        ("samples.captaincy", sim.samples.captaincy),
        ("samples.uncertainty", sim.samples.uncertainty),
    ];
    for (name, val) in counts {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }

    let u = &sim.uncertainty;
    if !u.min_stdev.is_finite() || u.min_stdev <= 0.0 {
        return Err(invalid(
            "uncertainty.min_stdev",
            format!("must be finite and > 0, got {}", u.min_stdev),
        ));
    }
    if !u.relative_stdev.is_finite() || u.relative_stdev < 0.0 {
        return Err(invalid(
            "uncertainty.relative_stdev",
            format!("must be finite and >= 0, got {}", u.relative_stdev),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
