//! Configuration system for blob environments.
//!
//! Supports YAML configuration files with sensible defaults.

use crate::error::{BlobError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub trials: TrialConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which generation algorithm an environment runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentKind {
    /// Survival and reproduction masking only, no space or food
    Base,
    /// Blobs move toward food; eating guarantees survival
    Foraging,
    /// Foraging plus priority feeding, combat and evasion
    Interactive,
}

impl EnvironmentKind {
    /// Whether generations in this environment need food
    pub fn is_spatial(self) -> bool {
        !matches!(self, EnvironmentKind::Base)
    }
}

/// Environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Generation algorithm
    pub kind: EnvironmentKind,
    /// Pieces of food laid each generation (spatial kinds only)
    pub food_per_generation: usize,
}

/// Range of the uniform draws used by survival/reproduction trials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialConfig {
    /// Lowest possible draw; probabilities below it never succeed
    pub low: f64,
    /// Highest possible draw
    pub high: f64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Generations between info-level summaries
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            kind: EnvironmentKind::Base,
            food_per_generation: 20,
        }
    }
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self { low: 0.1, high: 1.0 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 10,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Default configuration for the given environment kind
    pub fn for_kind(kind: EnvironmentKind) -> Self {
        let mut config = Self::default();
        config.environment.kind = kind;
        config
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let TrialConfig { low, high } = self.trials;
        if !(low.is_finite() && high.is_finite()) || low < 0.0 || high > 1.0 || low > high {
            return Err(invalid("trial range must satisfy 0 <= low <= high <= 1"));
        }
        if self.logging.stats_interval == 0 {
            return Err(invalid("stats_interval must be > 0"));
        }
        if self.environment.kind.is_spatial() && self.environment.food_per_generation == 0 {
            return Err(invalid("spatial environments need food_per_generation > 0"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> BlobError {
    BlobError::InvalidConfiguration(msg.to_string())
}
