//! Compounding a single cash injection forward through a return path.

use crate::panel::ReturnPanel;

/// Value trajectory of one injection into one asset.
///
/// `values[i]` is the value on row `start + i`, or `None` while the asset
/// has no price on that row. Unpriced rows do not lose the cash: the
/// running value is carried unchanged until the asset trades again.
#[derive(Debug, Clone, PartialEq)]
pub struct SubIndex {
    pub asset: usize,
    pub start: usize,
    pub amount: f64,
    pub values: Vec<Option<f64>>,
    /// Carried value after the last row, observed or not.
    pub final_value: f64,
    /// Row on which a -100% return zeroed the sub-index.
    pub wiped_out_at: Option<usize>,
}

impl SubIndex {
    /// Row after the last one covered.
    pub fn end(&self) -> usize {
        self.start + self.values.len()
    }

    /// Value on `row`, with rows before the injection counting as zero.
    pub fn contribution(&self, row: usize) -> f64 {
        if row < self.start {
            return 0.0;
        }
        self.values
            .get(row - self.start)
            .copied()
            .flatten()
            .unwrap_or(0.0)
    }

    pub fn is_wiped_out(&self) -> bool {
        self.wiped_out_at.is_some()
    }
}

/// Compound `amount` injected into asset `asset` on row `start`.
///
/// The return on the injection row itself is ignored; every later row
/// multiplies the running value by `1 + return`. Undefined returns leave the
/// value unchanged.
pub fn compound(returns: &ReturnPanel, asset: usize, start: usize, amount: f64) -> SubIndex {
    let column = returns.column_at(asset);
    let rows = column.len().saturating_sub(start);
    let mut values = Vec::with_capacity(rows);
    let mut running = amount;
    let mut wiped_out_at = None;

    for (row, ret) in column.iter().enumerate().skip(start) {
        if row > start {
            if let Some(r) = ret {
                running *= 1.0 + r;
                if wiped_out_at.is_none() && running == 0.0 && amount != 0.0 {
                    wiped_out_at = Some(row);
                }
            }
        }
        values.push(returns.is_priced(asset, row).then_some(running));
    }

    SubIndex {
        asset,
        start,
        amount,
        values,
        final_value: running,
        wiped_out_at,
    }
}
