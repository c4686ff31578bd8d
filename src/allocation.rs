//! Per-period cash injection amounts.

use crate::error::{Result, SimulationError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a budget is spread across rebalancing periods and assets.
///
/// Period 0 receives `initial_per_asset` for every asset; every later
/// period receives `recurring_per_asset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashflowAllocation {
    pub budget: f64,
    pub starting_amount: f64,
    pub periods: usize,
    pub assets: usize,
    pub initial_per_asset: f64,
    pub recurring_per_asset: f64,
}

impl CashflowAllocation {
    /// Split `budget` over `periods` periods and `assets` assets.
    ///
    /// With a non-zero `starting_amount` the first period invests exactly
    /// that amount and the remainder is shared equally by the other
    /// periods. Without one, every period invests the same share.
    pub fn allocate(
        budget: f64,
        starting_amount: f64,
        periods: usize,
        assets: usize,
    ) -> Result<Self> {
        validate_amounts(budget, starting_amount)?;
        if assets == 0 {
            return Err(SimulationError::EmptyAssetSet);
        }
        if periods == 0 {
            return Err(SimulationError::InvalidSchedule(
                "schedule contains no rebalancing periods".to_string(),
            ));
        }

        let k = assets as f64;
        let (initial_per_asset, recurring_per_asset) = if starting_amount > 0.0 {
            let remainder = budget - starting_amount;
            if periods == 1 {
                if remainder > 0.0 {
                    return Err(SimulationError::InsufficientPeriods { periods, remainder });
                }
                (starting_amount / k, 0.0)
            } else {
                (
                    starting_amount / k,
                    remainder / (periods - 1) as f64 / k,
                )
            }
        } else {
            let share = budget / periods as f64 / k;
            (share, share)
        };

        debug!(
            "Allocated {:.2}/asset at T0 and {:.2}/asset over {} later periods",
            initial_per_asset,
            recurring_per_asset,
            periods - 1
        );

        Ok(Self {
            budget,
            starting_amount,
            periods,
            assets,
            initial_per_asset,
            recurring_per_asset,
        })
    }

    /// Per-asset injection for `period`.
    pub fn per_asset(&self, period: usize) -> f64 {
        if period == 0 {
            self.initial_per_asset
        } else {
            self.recurring_per_asset
        }
    }

    /// Injection across all assets for `period`.
    pub fn per_period(&self, period: usize) -> f64 {
        self.per_asset(period) * self.assets as f64
    }

    /// Sum of all injections.
    pub fn total(&self) -> f64 {
        (0..self.periods).map(|p| self.per_period(p)).sum()
    }
}

/// Reject budgets and starting amounts no simulation can honour.
pub fn validate_amounts(budget: f64, starting_amount: f64) -> Result<()> {
    if !(budget.is_finite() && budget > 0.0) {
        return Err(SimulationError::InvalidBudget(budget));
    }
    if !(starting_amount.is_finite() && starting_amount >= 0.0) {
        return Err(SimulationError::InvalidInput(format!(
            "starting amount must be a non-negative, finite amount, got {}",
            starting_amount
        )));
    }
    if starting_amount > budget {
        return Err(SimulationError::StartingAmountExceedsBudget {
            starting_amount,
            budget,
        });
    }
    Ok(())
}
