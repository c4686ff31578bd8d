//! Configuration file support.
//!
//! Simulations can be described in a TOML file so a run is reproducible:
//! which prices to load, which window and assets to keep, and the budget
//! schedule to apply.

use crate::data::{parse_date, DataConfig};
use crate::error::{Result, SimulationError};
use crate::lookback::Lookback;
use crate::panel::PricePanel;
use crate::simulation::SimulationConfig;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Complete simulation configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DripFileConfig {
    /// Budget schedule.
    #[serde(default)]
    pub simulation: SimulationSettings,
    /// Price source and selection.
    #[serde(default)]
    pub data: DataSettings,
}

/// Budget schedule settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Total amount to invest.
    #[serde(default = "default_budget")]
    pub budget: f64,
    /// Amount invested on the first date.
    #[serde(default = "default_starting_amount")]
    pub starting_amount: f64,
    /// Days between injections.
    #[serde(default = "default_interval_days")]
    pub interval_days: i64,
}

fn default_budget() -> f64 { SimulationConfig::default().budget }
fn default_starting_amount() -> f64 { SimulationConfig::default().starting_amount }
fn default_interval_days() -> i64 { SimulationConfig::default().interval_days }

impl Default for SimulationSettings {
    fn default() -> Self {
        let defaults = SimulationConfig::default();
        Self {
            budget: defaults.budget,
            starting_amount: defaults.starting_amount,
            interval_days: defaults.interval_days,
        }
    }
}

/// Price source and selection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSettings {
    /// Path to the price CSV.
    pub path: Option<String>,
    /// Assets to keep; all when absent.
    pub assets: Option<Vec<String>>,
    /// First date to keep (overrides the lookback start).
    pub start_date: Option<String>,
    /// Last date to keep (overrides the lookback end).
    pub end_date: Option<String>,
    /// Named window such as "1y" or "covid crash".
    pub lookback: Option<Lookback>,
    /// Date format in the CSV.
    pub date_format: Option<String>,
    /// CSV delimiter; auto-detected when absent.
    pub delimiter: Option<char>,
}

/// Which part of a price panel to simulate over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub assets: Option<Vec<String>>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub lookback: Option<Lookback>,
}

impl Selection {
    /// Restrict `panel` to the selected window and assets.
    ///
    /// Explicit start and end dates take precedence over the lookback.
    pub fn apply(&self, panel: &PricePanel) -> Result<PricePanel> {
        let (first, last) = panel.date_range().ok_or(SimulationError::NoData)?;
        let (window_start, window_end) = match self.lookback {
            Some(lookback) => {
                let (s, e) = lookback.resolve(first, last);
                (Some(s), Some(e))
            }
            None => (None, None),
        };

        let start = self.start.or(window_start);
        let end = self.end.or(window_end);
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(SimulationError::InvalidSchedule(format!(
                    "start date {} is after end date {}",
                    s, e
                )));
            }
        }

        debug!("Selecting {:?}..{:?} for {:?}", start, end, self.assets);
        panel.filter(start, end, self.assets.as_deref())
    }
}

impl DripFileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        let config: DripFileConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SimulationError::ConfigError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn to_simulation_config(&self) -> SimulationConfig {
        SimulationConfig::new(
            self.simulation.budget,
            self.simulation.starting_amount,
            self.simulation.interval_days,
        )
    }

    pub fn to_data_config(&self) -> Result<DataConfig> {
        let delimiter = match self.data.delimiter {
            Some(c) if c.is_ascii() => Some(c as u8),
            Some(c) => {
                return Err(SimulationError::ConfigError(format!(
                    "delimiter {:?} is not an ASCII character",
                    c
                )))
            }
            None => None,
        };

        Ok(DataConfig {
            date_format: self.data.date_format.clone(),
            delimiter,
            ..Default::default()
        })
    }

    pub fn selection(&self) -> Result<Selection> {
        let parse = |s: &Option<String>| -> Result<Option<NaiveDate>> {
            s.as_deref()
                .map(|d| {
                    parse_date(d, None)
                        .map_err(|e| SimulationError::ConfigError(e.to_string()))
                })
                .transpose()
        };

        Ok(Selection {
            assets: self.data.assets.clone(),
            start: parse(&self.data.start_date)?,
            end: parse(&self.data.end_date)?,
            lookback: self.data.lookback,
        })
    }

    /// Generate an example configuration file content.
    pub fn example() -> String {
        r#"# drip configuration file
# Compares investing a budget at once against dollar-cost averaging it

[simulation]
budget = 200000.0
starting_amount = 20000.0   # invested on the first date, 0 to spread evenly
interval_days = 30          # days between injections

[data]
path = "data/prices.csv"    # Date column followed by one column per asset
# assets = ["SPY", "QQQ"]
# lookback = "5y"           # 1w, mtd, 3m, 6m, ytd, 1y, 3y, 5y, max, covid crash, 2022 rate hikes
# start_date = "2019-01-01"
# end_date = "2023-12-31"
# date_format = "%Y-%m-%d"
# delimiter = ","
"#
        .to_string()
    }
}
