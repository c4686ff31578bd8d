//! Error types for the simulation engine.

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for the simulation engine.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error(
        "Insufficient periods: starting amount leaves {remainder:.2} to invest but only {periods} rebalancing period(s) are available"
    )]
    InsufficientPeriods { periods: usize, remainder: f64 },

    #[error("Empty asset set: no assets in scope after filtering")]
    EmptyAssetSet,

    #[error("Starting amount {starting_amount:.2} exceeds budget {budget:.2}")]
    StartingAmountExceedsBudget { starting_amount: f64, budget: f64 },

    #[error("Invalid budget: {0} (must be a positive, finite amount)")]
    InvalidBudget(f64),

    #[error("No price data available between {start} and {end}")]
    EmptyWindow { start: NaiveDate, end: NaiveDate },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParseError(#[from] chrono::ParseError),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No data loaded")]
    NoData,
}

impl SimulationError {
    /// Whether the error is a rejected simulation precondition.
    ///
    /// `NoData` is the empty state before any prices were supplied and is
    /// deliberately not a precondition failure.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SimulationError::InvalidSchedule(_)
                | SimulationError::InsufficientPeriods { .. }
                | SimulationError::EmptyAssetSet
                | SimulationError::StartingAmountExceedsBudget { .. }
                | SimulationError::InvalidBudget(_)
        )
    }
}

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimulationError>;
