//! Configuration schema types for `mosaic.toml`
//!
//! Defines the structure and validation rules for mosaic planner configuration.
//! Every section is optional; a missing key takes its default.

use serde::{Deserialize, Serialize};

use crate::document::DocumentOptions;

/// Defaults for newly created grids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Rows of a new grid
    #[serde(default = "default_dimension")]
    pub rows: usize,
    /// Columns of a new grid
    #[serde(default = "default_dimension")]
    pub columns: usize,
}

fn default_dimension() -> usize {
    32
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { rows: 32, columns: 32 }
    }
}

/// Undo history settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    crate::history::DEFAULT_HISTORY_LIMIT
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { limit: default_history_limit() }
    }
}

/// Image import settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Alpha below this becomes a clear cell
    #[serde(default = "default_alpha_threshold")]
    pub alpha_threshold: u8,
    /// Fraction of finite supply a fitted import aims to use
    #[serde(default = "default_supply_coverage")]
    pub supply_coverage: f64,
    /// Minimum rows and columns of a fitted import
    #[serde(default = "default_min_dimension")]
    pub min_dimension: usize,
    /// Rationing round cap
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

fn default_alpha_threshold() -> u8 {
    crate::import::DEFAULT_ALPHA_THRESHOLD
}

fn default_supply_coverage() -> f64 {
    crate::import::DEFAULT_SUPPLY_COVERAGE
}

fn default_min_dimension() -> usize {
    crate::import::DEFAULT_MIN_DIMENSION
}

fn default_max_rounds() -> usize {
    crate::import::assignment::DEFAULT_MAX_ROUNDS
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            alpha_threshold: default_alpha_threshold(),
            supply_coverage: default_supply_coverage(),
            min_dimension: default_min_dimension(),
            max_rounds: default_max_rounds(),
        }
    }
}

/// Save reminder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between checks of the unsaved marker
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Seconds of unsaved edits before a reminder is raised
    #[serde(default = "default_threshold_secs")]
    pub threshold_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    60
}

fn default_threshold_secs() -> u64 {
    600
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self { enabled: true, interval_secs: 60, threshold_secs: 600 }
    }
}

/// Logging settings. `RUST_LOG` takes precedence when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_level() }
    }
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Complete mosaic.toml configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MosaicConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub reminder: ReminderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "import.supply_coverage")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mosaic.toml: '{}' {}", self.field, self.message)
    }
}

impl MosaicConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut positive = |field: &str, value: u64| {
            if value == 0 {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: "must be a positive integer".to_string(),
                });
            }
        };

        positive("grid.rows", self.grid.rows as u64);
        positive("grid.columns", self.grid.columns as u64);
        positive("history.limit", self.history.limit as u64);
        positive("import.min_dimension", self.import.min_dimension as u64);
        positive("import.max_rounds", self.import.max_rounds as u64);
        positive("reminder.interval_secs", self.reminder.interval_secs);
        positive("reminder.threshold_secs", self.reminder.threshold_secs);

        let coverage = self.import.supply_coverage;
        if !(coverage > 0.0 && coverage <= 1.0) {
            errors.push(ConfigValidationError {
                field: "import.supply_coverage".to_string(),
                message: "must be in the range (0, 1]".to_string(),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            errors.push(ConfigValidationError {
                field: "logging.level".to_string(),
                message: format!("must be one of {}", LOG_LEVELS.join(", ")),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Document tunables derived from this configuration
    pub fn document_options(&self) -> DocumentOptions {
        DocumentOptions {
            history_limit: self.history.limit,
            max_rounds: self.import.max_rounds,
            alpha_threshold: self.import.alpha_threshold,
            supply_coverage: self.import.supply_coverage,
            min_dimension: self.import.min_dimension,
        }
    }
}
