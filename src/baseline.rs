//! Equal-weight lump-sum baseline: the whole budget invested on day one.

use crate::allocation::validate_amounts;
use crate::compound::compound;
use crate::error::{Result, SimulationError};
use crate::index::IndexSeries;
use crate::panel::{PricePanel, ReturnPanel};
use crate::reconcile::{IndexReconciler, Wipeout};
use serde::{Deserialize, Serialize};
use tracing::info;

/// How much one asset added to the baseline's growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetContribution {
    pub asset: String,
    /// Initial weight (1/K).
    pub weight: f64,
    /// Final value over initial value, if the asset is priced at the end.
    pub growth: Option<f64>,
    /// `growth * weight`.
    pub contribution: Option<f64>,
}

/// Lump-sum comparison index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineIndex {
    pub index: IndexSeries,
    pub contributions: Vec<AssetContribution>,
    pub wipeouts: Vec<Wipeout>,
}

impl BaselineIndex {
    pub fn final_value(&self) -> Option<f64> {
        self.index.final_value()
    }
}

/// Label of the baseline series: the asset itself when only one is held.
pub fn baseline_label(assets: &[String]) -> String {
    match assets {
        [single] => format!("{} base", single),
        _ => "EW Index base".to_string(),
    }
}

/// Invest `budget / K` in each of the K assets on the first date and hold.
pub fn build_baseline_index(prices: &PricePanel, budget: f64) -> Result<BaselineIndex> {
    validate_amounts(budget, 0.0)?;
    if prices.num_assets() == 0 {
        return Err(SimulationError::EmptyAssetSet);
    }

    let returns = prices.normalize().returns();
    baseline_from_returns(&returns, budget)
}

/// Baseline over returns that are already prepared.
pub fn baseline_from_returns(returns: &ReturnPanel, budget: f64) -> Result<BaselineIndex> {
    validate_amounts(budget, 0.0)?;
    let k = returns.num_assets();
    if k == 0 {
        return Err(SimulationError::EmptyAssetSet);
    }
    if returns.is_empty() {
        return Err(SimulationError::NoData);
    }

    let weight = 1.0 / k as f64;
    let per_asset = budget / k as f64;
    let last_row = returns.len() - 1;
    let mut reconciler = IndexReconciler::new(returns.dates(), returns.assets());
    let mut contributions = Vec::with_capacity(k);

    for (asset, name) in returns.assets().iter().enumerate() {
        let sub = compound(returns, asset, 0, per_asset);
        let growth = returns
            .is_priced(asset, last_row)
            .then(|| sub.final_value / per_asset);
        contributions.push(AssetContribution {
            asset: name.clone(),
            weight,
            growth,
            contribution: growth.map(|g| g * weight),
        });
        reconciler.absorb(&sub);
    }

    let (index, _, wipeouts) = reconciler.finish(baseline_label(returns.assets()));
    info!(
        "Built {} over {} days: final value {:.2}",
        index.label,
        index.len(),
        index.final_value().unwrap_or(0.0)
    );

    Ok(BaselineIndex {
        index,
        contributions,
        wipeouts,
    })
}
