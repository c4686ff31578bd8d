//! Portfolio value series produced by the simulation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Total portfolio value per calendar date, with the per-asset breakdown it
/// was summed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSeries {
    pub label: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
    pub assets: Vec<String>,
    /// `by_asset[k][t]` is asset `k`'s value on `dates[t]`.
    pub by_asset: Vec<Vec<f64>>,
}

impl IndexSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_value(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn final_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Value on `date`, if the date is in the index.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|row| self.values[row])
    }

    /// Per-asset values on the last date.
    pub fn final_by_asset(&self) -> Vec<(String, f64)> {
        self.assets
            .iter()
            .zip(&self.by_asset)
            .map(|(asset, values)| (asset.clone(), values.last().copied().unwrap_or(0.0)))
            .collect()
    }

    /// Iterate `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}
