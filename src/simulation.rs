//! DCA simulation entry points.
//!
//! [`build_blended_index`] runs the dollar-cost-averaging strategy over a
//! price panel; [`compare`] runs it next to the lump-sum baseline. Both
//! validate every precondition before computing anything and share no
//! state between calls.

use crate::allocation::{validate_amounts, CashflowAllocation};
use crate::baseline::{baseline_from_returns, BaselineIndex};
use crate::compound::compound;
use crate::error::{Result, SimulationError};
use crate::index::IndexSeries;
use crate::panel::{PricePanel, ReturnPanel};
use crate::reconcile::{CashflowLedger, IndexReconciler, Wipeout};
use crate::report::accounting_format;
use crate::schedule::RebalancingSchedule;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Label of the DCA series.
pub const DCA_LABEL: &str = "DCA";

/// Simulation parameters.
///
/// Defaults: a budget of 200 000 of which 20 000 is invested up front, the
/// rest in equal slices every 30 days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Total amount invested over the whole window.
    pub budget: f64,
    /// Lump invested on the first date; 0 spreads the budget evenly.
    pub starting_amount: f64,
    /// Days between injections.
    pub interval_days: i64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            budget: 200_000.0,
            starting_amount: 20_000.0,
            interval_days: 30,
        }
    }
}

impl SimulationConfig {
    pub fn new(budget: f64, starting_amount: f64, interval_days: i64) -> Self {
        Self {
            budget,
            starting_amount,
            interval_days,
        }
    }

    /// Check the parameters that do not depend on the price data.
    pub fn validate(&self) -> Result<()> {
        validate_amounts(self.budget, self.starting_amount)?;
        if self.interval_days <= 0 {
            return Err(SimulationError::InvalidSchedule(format!(
                "interval must be at least 1 day, got {}",
                self.interval_days
            )));
        }
        Ok(())
    }
}

/// Result of one DCA run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcaSimulation {
    pub index: IndexSeries,
    pub ledger: CashflowLedger,
    pub schedule: RebalancingSchedule,
    pub allocation: CashflowAllocation,
    pub wipeouts: Vec<Wipeout>,
}

impl DcaSimulation {
    pub fn final_value(&self) -> Option<f64> {
        self.index.final_value()
    }
}

/// Run the DCA strategy over a price panel.
///
/// The panel is normalized onto a daily calendar; the simulation starts on
/// its first date and ends on its last.
pub fn build_blended_index(prices: &PricePanel, config: &SimulationConfig) -> Result<DcaSimulation> {
    config.validate()?;
    if prices.num_assets() == 0 {
        return Err(SimulationError::EmptyAssetSet);
    }

    let returns = prices.normalize().returns();
    simulate_returns(&returns, config)
}

/// Run the DCA strategy over returns that are already prepared.
///
/// A schedule date missing from the return index injects on the next
/// available date.
pub fn simulate_returns(returns: &ReturnPanel, config: &SimulationConfig) -> Result<DcaSimulation> {
    config.validate()?;
    let k = returns.num_assets();
    if k == 0 {
        return Err(SimulationError::EmptyAssetSet);
    }
    let (start, end) = match (returns.dates().first(), returns.dates().last()) {
        (Some(s), Some(e)) => (*s, *e),
        _ => return Err(SimulationError::NoData),
    };

    let schedule = RebalancingSchedule::generate(start, end, config.interval_days)?;
    let allocation =
        CashflowAllocation::allocate(config.budget, config.starting_amount, schedule.len(), k)?;

    let rows = schedule
        .dates()
        .iter()
        .map(|date| {
            returns.first_row_from(*date).ok_or_else(|| {
                SimulationError::DataError(format!("no return data on or after {}", date))
            })
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut reconciler = IndexReconciler::new(returns.dates(), returns.assets());
    for (period, (date, row)) in schedule.dates().iter().zip(rows).enumerate() {
        let amount = allocation.per_asset(period);
        for asset in 0..k {
            reconciler.absorb(&compound(returns, asset, row, amount));
        }
        reconciler.record_injection(*date, vec![amount; k]);
    }

    let (index, ledger, wipeouts) = reconciler.finish(DCA_LABEL);
    info!(
        "DCA over {} assets, {} periods: invested {:.2}, final value {:.2}",
        k,
        schedule.len(),
        ledger.grand_total,
        index.final_value().unwrap_or(0.0)
    );

    Ok(DcaSimulation {
        index,
        ledger,
        schedule,
        allocation,
        wipeouts,
    })
}

/// Headline numbers of a DCA vs lump-sum comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub invested: f64,
    pub baseline_final: f64,
    pub dca_final: f64,
    pub baseline_gain: f64,
    pub dca_gain: f64,
    pub baseline_return_pct: f64,
    pub dca_return_pct: f64,
    /// `dca_final - baseline_final`.
    pub difference: f64,
}

impl ComparisonSummary {
    fn new(invested: f64, baseline_final: f64, dca_final: f64) -> Self {
        let baseline_gain = baseline_final - invested;
        let dca_gain = dca_final - invested;
        Self {
            invested,
            baseline_final,
            dca_final,
            baseline_gain,
            dca_gain,
            baseline_return_pct: baseline_gain / invested * 100.0,
            dca_return_pct: dca_gain / invested * 100.0,
            difference: dca_final - baseline_final,
        }
    }

    /// Whether dollar-cost averaging ended ahead of the lump sum.
    pub fn dca_outperformed(&self) -> bool {
        self.difference > 0.0
    }
}

/// DCA and lump-sum indices over the same calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcaComparison {
    pub title: String,
    pub config: SimulationConfig,
    pub baseline: BaselineIndex,
    pub dca: DcaSimulation,
    pub summary: ComparisonSummary,
}

/// Chart title of a comparison.
pub fn comparison_title(config: &SimulationConfig) -> String {
    format!(
        "Investing {} at T0 vs DCAing every {} days",
        accounting_format(config.budget),
        config.interval_days
    )
}

/// Run the DCA strategy and the equal-weight lump-sum baseline side by side.
pub fn compare(prices: &PricePanel, config: &SimulationConfig) -> Result<DcaComparison> {
    config.validate()?;
    if prices.num_assets() == 0 {
        return Err(SimulationError::EmptyAssetSet);
    }

    let returns = prices.normalize().returns();
    let dca = simulate_returns(&returns, config)?;
    let baseline = baseline_from_returns(&returns, config.budget)?;

    let summary = ComparisonSummary::new(
        config.budget,
        baseline.final_value().unwrap_or(0.0),
        dca.final_value().unwrap_or(0.0),
    );

    Ok(DcaComparison {
        title: comparison_title(config),
        config: *config,
        baseline,
        dca,
        summary,
    })
}
