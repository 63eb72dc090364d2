// Configuration loading and parsing (league.toml).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::ranking::category::{Category, PositionWeights};

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
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub league: LeagueSection,
    /// Weight per skater category in the weighted strategy. Categories
    /// without an entry default to 1.0.
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    #[serde(default)]
    pub face_off_weights: FaceOffWeights,
    #[serde(default)]
    pub filters: FiltersSection,
    pub database: DatabaseSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueSection {
    pub name: String,
    pub skater_categories: Vec<String>,
    pub goalie_categories: Vec<String>,
}

/// Position multipliers for deployment-dependent categories, face-off wins
/// in particular.
#[derive(Debug, Clone, Deserialize)]
pub struct FaceOffWeights {
    pub center: f64,
    pub wing: f64,
    pub defense: f64,
}

impl Default for FaceOffWeights {
    fn default() -> Self {
        let d = PositionWeights::default();
        FaceOffWeights {
            center: d.center,
            wing: d.wing,
            defense: d.defense,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FiltersSection {
    /// Goalies below this games-played floor are excluded from rate-stat
    /// leaderboards by default.
    pub min_goalie_games: u32,
}

impl Default for FiltersSection {
    fn default() -> Self {
        FiltersSection {
            min_goalie_games: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSection {
    pub path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` relative to the
/// given `base_dir`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("league.toml");
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;

    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;
    Ok(config)
}

/// Load configuration from `config/league.toml` in the current directory.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("."))
}

impl Config {
    /// Skater category set with configured weights and the face-off position
    /// multiplier table applied.
    pub fn skater_categories(&self) -> Vec<Category> {
        self.league
            .skater_categories
            .iter()
            .map(|name| {
                let mut cat =
                    Category::new(name).with_weight(self.weights.get(name).copied().unwrap_or(1.0));
                if name == "face_off_wins" {
                    cat = cat.with_position_weights(PositionWeights {
                        center: self.face_off_weights.center,
                        wing: self.face_off_weights.wing,
                        defense: self.face_off_weights.defense,
                    });
                }
                cat
            })
            .collect()
    }

    /// Goalie category set. Weights apply here too when configured.
    pub fn goalie_categories(&self) -> Vec<Category> {
        self.league
            .goalie_categories
            .iter()
            .map(|name| {
                Category::new(name).with_weight(self.weights.get(name).copied().unwrap_or(1.0))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.skater_categories.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.skater_categories".into(),
            message: "must list at least one category".into(),
        });
    }

    if config.league.goalie_categories.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.goalie_categories".into(),
            message: "must list at least one category".into(),
        });
    }

    for (name, weight) in &config.weights {
        if *weight <= 0.0 {
            return Err(ConfigError::ValidationError {
                field: format!("weights.{name}"),
                message: format!("must be > 0, got {weight}"),
            });
        }
    }

    let fow = &config.face_off_weights;
    let fow_fields: &[(&str, f64)] = &[
        ("face_off_weights.center", fow.center),
        ("face_off_weights.wing", fow.wing),
        ("face_off_weights.defense", fow.defense),
    ];
    for (name, val) in fow_fields {
        if *val < 0.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be >= 0, got {val}"),
            });
        }
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
