//! Reconciling overlapping sub-indices into one portfolio index, and the
//! cashflow ledger that audits every injection.

use crate::compound::SubIndex;
use crate::index::IndexSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Date format of ledger row labels.
pub const LEDGER_DATE_FORMAT: &str = "%m/%d/%Y";

/// Injections of one rebalancing period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    /// `date` formatted with [`LEDGER_DATE_FORMAT`].
    pub label: String,
    /// Injection per asset, in the ledger's asset order.
    pub amounts: Vec<f64>,
    /// Sum of `amounts`.
    pub total: f64,
}

/// Audit table of injections by period and asset.
///
/// Amounts are kept at full precision; rounding is a presentation concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowLedger {
    pub assets: Vec<String>,
    pub rows: Vec<LedgerRow>,
    /// Column sums across all periods, per asset.
    pub totals: Vec<f64>,
    /// Sum of the Total column.
    pub grand_total: f64,
}

impl CashflowLedger {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of every per-asset cell, excluding the Total row and column.
    pub fn body_sum(&self) -> f64 {
        self.rows.iter().flat_map(|r| r.amounts.iter()).sum()
    }

    /// Total injected into a named asset.
    pub fn total_for(&self, asset: &str) -> Option<f64> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|i| self.totals[i])
    }
}

/// A sub-index zeroed by a -100% return. Legitimate, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wipeout {
    pub asset: String,
    pub injected_on: NaiveDate,
    pub wiped_out_on: NaiveDate,
}

/// Accumulates sub-indices per asset over the full calendar.
///
/// Each asset owns one zero-initialised accumulator; sub-indices are added
/// in place from their own start row, so a period that has not started yet
/// contributes zero.
#[derive(Debug, Clone)]
pub struct IndexReconciler {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    accumulators: Vec<Vec<f64>>,
    rows: Vec<LedgerRow>,
    wipeouts: Vec<Wipeout>,
}

impl IndexReconciler {
    pub fn new(dates: &[NaiveDate], assets: &[String]) -> Self {
        Self {
            dates: dates.to_vec(),
            assets: assets.to_vec(),
            accumulators: vec![vec![0.0; dates.len()]; assets.len()],
            rows: Vec::new(),
            wipeouts: Vec::new(),
        }
    }

    /// Add a sub-index into its asset's accumulator.
    pub fn absorb(&mut self, sub: &SubIndex) {
        let accumulator = &mut self.accumulators[sub.asset];
        for row in sub.start..sub.end().min(accumulator.len()) {
            accumulator[row] += sub.contribution(row);
        }

        if let Some(row) = sub.wiped_out_at {
            let wipeout = Wipeout {
                asset: self.assets[sub.asset].clone(),
                injected_on: self.dates[sub.start],
                wiped_out_on: self.dates[row],
            };
            warn!(
                "Sub-index for {} injected on {} wiped out on {}",
                wipeout.asset, wipeout.injected_on, wipeout.wiped_out_on
            );
            self.wipeouts.push(wipeout);
        }
    }

    /// Record the per-asset injections of one period in the ledger.
    pub fn record_injection(&mut self, date: NaiveDate, amounts: Vec<f64>) {
        let total = amounts.iter().sum();
        self.rows.push(LedgerRow {
            date,
            label: date.format(LEDGER_DATE_FORMAT).to_string(),
            amounts,
            total,
        });
    }

    /// Number of ledger rows recorded so far.
    pub fn periods(&self) -> usize {
        self.rows.len()
    }

    /// Sum accumulators across assets and close the ledger.
    pub fn finish(self, label: impl Into<String>) -> (IndexSeries, CashflowLedger, Vec<Wipeout>) {
        let values = (0..self.dates.len())
            .map(|row| self.accumulators.iter().map(|acc| acc[row]).sum())
            .collect();

        let totals: Vec<f64> = (0..self.assets.len())
            .map(|asset| self.rows.iter().map(|r| r.amounts[asset]).sum())
            .collect();
        let grand_total = self.rows.iter().map(|r| r.total).sum();

        let index = IndexSeries {
            label: label.into(),
            dates: self.dates,
            values,
            assets: self.assets.clone(),
            by_asset: self.accumulators,
        };

        let ledger = CashflowLedger {
            assets: self.assets,
            rows: self.rows,
            totals,
            grand_total,
        };

        (index, ledger, self.wipeouts)
    }
}
