//! Price panels, daily-calendar normalization and derived returns.
//!
//! A [`PricePanel`] is a date-indexed table with one column per asset. Cells
//! hold a positive price or `None` when the asset has no observation on that
//! date. [`PricePanel::normalize`] reindexes the panel onto a contiguous
//! daily calendar so the rebalancing schedule can land on any calendar day.

use crate::error::{Result, SimulationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Date-indexed table of asset prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePanel {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    /// One column per asset, each `dates.len()` long.
    columns: Vec<Vec<Option<f64>>>,
}

/// Statistics gathered while normalizing a panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationReport {
    /// Number of rows in the source panel.
    pub source_rows: usize,
    /// Calendar days inserted to make the index contiguous.
    pub inserted_dates: usize,
    /// Cells that received a forward-filled price.
    pub filled_cells: usize,
    /// Cells still missing at the head of a series.
    pub leading_missing: usize,
}

impl PricePanel {
    /// Build a panel from a date index, asset names and per-asset columns.
    ///
    /// Rows are sorted by date. Duplicate dates, duplicate asset names,
    /// mismatched column lengths and non-positive prices are rejected.
    pub fn new(
        dates: Vec<NaiveDate>,
        assets: Vec<String>,
        columns: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if dates.is_empty() {
            return Err(SimulationError::NoData);
        }

        if columns.len() != assets.len() {
            return Err(SimulationError::DataError(format!(
                "{} asset names but {} price columns",
                assets.len(),
                columns.len()
            )));
        }

        let mut seen = HashSet::with_capacity(assets.len());
        for asset in &assets {
            if !seen.insert(asset.as_str()) {
                return Err(SimulationError::DataError(format!(
                    "duplicate asset column '{}'",
                    asset
                )));
            }
        }

        for (asset, column) in assets.iter().zip(&columns) {
            if column.len() != dates.len() {
                return Err(SimulationError::DataError(format!(
                    "column '{}' has {} values for {} dates",
                    asset,
                    column.len(),
                    dates.len()
                )));
            }
            if let Some(bad) = column
                .iter()
                .flatten()
                .find(|p| !(p.is_finite() && **p > 0.0))
            {
                return Err(SimulationError::DataError(format!(
                    "column '{}' contains non-positive price {}",
                    asset, bad
                )));
            }
        }

        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by_key(|&i| dates[i]);

        let sorted_dates: Vec<NaiveDate> = order.iter().map(|&i| dates[i]).collect();
        if let Some(dup) = sorted_dates.windows(2).find(|w| w[0] == w[1]) {
            return Err(SimulationError::DataError(format!(
                "duplicate date {}",
                dup[0]
            )));
        }

        let sorted_columns = columns
            .iter()
            .map(|column| order.iter().map(|&i| column[i]).collect())
            .collect();

        Ok(Self {
            dates: sorted_dates,
            assets,
            columns: sorted_columns,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn num_assets(&self) -> usize {
        self.assets.len()
    }

    /// Prices for the asset at `index`.
    pub fn column_at(&self, index: usize) -> &[Option<f64>] {
        &self.columns[index]
    }

    /// Prices for a named asset.
    pub fn column(&self, asset: &str) -> Option<&[Option<f64>]> {
        self.asset_index(asset).map(|i| self.column_at(i))
    }

    pub fn asset_index(&self, asset: &str) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.first_date()?, self.last_date()?))
    }

    /// Row of the first observed price for the asset at `index`.
    pub fn first_observation(&self, index: usize) -> Option<usize> {
        self.columns[index].iter().position(Option::is_some)
    }

    /// Whether consecutive dates are exactly one calendar day apart.
    pub fn is_daily_contiguous(&self) -> bool {
        self.dates
            .windows(2)
            .all(|w| (w[1] - w[0]).num_days() == 1)
    }

    /// Restrict the panel to a date window and an optional asset subset.
    ///
    /// Bounds are inclusive. Asset order follows `assets` when given.
    pub fn filter(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        assets: Option<&[String]>,
    ) -> Result<Self> {
        let indices: Vec<usize> = match assets {
            Some(selected) => selected
                .iter()
                .map(|name| {
                    self.asset_index(name).ok_or_else(|| {
                        SimulationError::InvalidInput(format!("unknown asset '{}'", name))
                    })
                })
                .collect::<Result<_>>()?,
            None => (0..self.assets.len()).collect(),
        };

        let rows: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, d)| start.map_or(true, |s| **d >= s) && end.map_or(true, |e| **d <= e))
            .map(|(i, _)| i)
            .collect();

        if rows.is_empty() {
            return Err(SimulationError::EmptyWindow {
                start: start.or(self.first_date()).unwrap_or_default(),
                end: end.or(self.last_date()).unwrap_or_default(),
            });
        }

        debug!(
            "Filtered panel to {} rows and {} assets",
            rows.len(),
            indices.len()
        );

        Ok(Self {
            dates: rows.iter().map(|&r| self.dates[r]).collect(),
            assets: indices.iter().map(|&i| self.assets[i].clone()).collect(),
            columns: indices
                .iter()
                .map(|&i| rows.iter().map(|&r| self.columns[i][r]).collect())
                .collect(),
        })
    }

    /// Reindex onto a contiguous daily calendar, forward-filling prices.
    pub fn normalize(&self) -> Self {
        self.normalize_with_report().0
    }

    /// Like [`normalize`](Self::normalize), also reporting what was filled.
    ///
    /// Each asset carries its most recent observed price forward. Cells
    /// before an asset's first observation remain `None`.
    pub fn normalize_with_report(&self) -> (Self, NormalizationReport) {
        let (first, last) = match self.date_range() {
            Some(range) => range,
            None => return (self.clone(), NormalizationReport::default()),
        };

        let calendar: Vec<NaiveDate> = first.iter_days().take_while(|d| *d <= last).collect();
        let mut report = NormalizationReport {
            source_rows: self.dates.len(),
            inserted_dates: calendar.len() - self.dates.len(),
            ..Default::default()
        };

        let mut columns = vec![Vec::with_capacity(calendar.len()); self.assets.len()];
        let mut last_known: Vec<Option<f64>> = vec![None; self.assets.len()];
        let mut source_row = 0;

        for day in &calendar {
            let observed = source_row < self.dates.len() && self.dates[source_row] == *day;

            for (asset, column) in columns.iter_mut().enumerate() {
                let price = if observed {
                    self.columns[asset][source_row]
                } else {
                    None
                };

                match price {
                    Some(p) => last_known[asset] = Some(p),
                    None if last_known[asset].is_some() => report.filled_cells += 1,
                    None => report.leading_missing += 1,
                }
                column.push(last_known[asset]);
            }

            if observed {
                source_row += 1;
            }
        }

        info!(
            "Normalized {} rows onto {} calendar days ({} dates inserted, {} cells filled)",
            report.source_rows,
            calendar.len(),
            report.inserted_dates,
            report.filled_cells
        );

        (
            Self {
                dates: calendar,
                assets: self.assets.clone(),
                columns,
            },
            report,
        )
    }

    /// Period-over-period percent change of every column.
    pub fn returns(&self) -> ReturnPanel {
        ReturnPanel::from_prices(self)
    }
}

/// Percent-change returns derived from a [`PricePanel`].
///
/// The first row of every column is undefined, as is any row whose current
/// or previous price is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPanel {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    returns: Vec<Vec<Option<f64>>>,
    priced: Vec<Vec<bool>>,
}

impl ReturnPanel {
    pub fn from_prices(prices: &PricePanel) -> Self {
        let returns = prices
            .columns
            .iter()
            .map(|column| {
                std::iter::once(None)
                    .chain(column.windows(2).map(|w| match (w[0], w[1]) {
                        (Some(prev), Some(curr)) => Some(curr / prev - 1.0),
                        _ => None,
                    }))
                    .take(column.len())
                    .collect()
            })
            .collect();

        let priced = prices
            .columns
            .iter()
            .map(|column| column.iter().map(Option::is_some).collect())
            .collect();

        Self {
            dates: prices.dates.clone(),
            assets: prices.assets.clone(),
            returns,
            priced,
        }
    }

    /// Wrap returns prepared elsewhere.
    ///
    /// Dates must be strictly ascending and every return must be finite and
    /// no lower than -100%. A row counts as priced when it carries a return
    /// or is the base row of the next row's return.
    pub fn from_returns(
        dates: Vec<NaiveDate>,
        assets: Vec<String>,
        returns: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if dates.is_empty() {
            return Err(SimulationError::NoData);
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SimulationError::DataError(
                "return dates must be strictly ascending".to_string(),
            ));
        }
        if returns.len() != assets.len() {
            return Err(SimulationError::DataError(format!(
                "{} asset names but {} return columns",
                assets.len(),
                returns.len()
            )));
        }
        for (asset, column) in assets.iter().zip(&returns) {
            if column.len() != dates.len() {
                return Err(SimulationError::DataError(format!(
                    "column '{}' has {} returns for {} dates",
                    asset,
                    column.len(),
                    dates.len()
                )));
            }
            if let Some(bad) = column
                .iter()
                .flatten()
                .find(|r| !(r.is_finite() && **r >= -1.0))
            {
                return Err(SimulationError::DataError(format!(
                    "column '{}' contains invalid return {}",
                    asset, bad
                )));
            }
        }

        let priced = returns
            .iter()
            .map(|column| {
                (0..column.len())
                    .map(|row| {
                        column[row].is_some()
                            || column.get(row + 1).map_or(false, Option::is_some)
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            dates,
            assets,
            returns,
            priced,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn num_assets(&self) -> usize {
        self.assets.len()
    }

    /// First row dated on or after `date`.
    pub fn first_row_from(&self, date: NaiveDate) -> Option<usize> {
        let row = self.dates.partition_point(|d| *d < date);
        (row < self.dates.len()).then_some(row)
    }

    /// Returns of the asset at `index`.
    pub fn column_at(&self, index: usize) -> &[Option<f64>] {
        &self.returns[index]
    }

    /// Whether the asset at `index` has a price on `row`.
    pub fn is_priced(&self, index: usize, row: usize) -> bool {
        self.priced[index][row]
    }
}
