//! Rebalancing schedule generation.

use crate::error::{Result, SimulationError};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Intervals shorter than this are accepted but almost always a mistake.
pub const RECOMMENDED_MIN_INTERVAL_DAYS: i64 = 10;

/// Ordered injection dates of a DCA simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalancingSchedule {
    dates: Vec<NaiveDate>,
    interval_days: i64,
}

impl RebalancingSchedule {
    /// Generate `start, start + days, start + 2*days, ...` up to `end`.
    ///
    /// `start` is always the first period. A generated date past `end` is
    /// dropped rather than clamped, so the period count (and with it the
    /// per-period allocation) reflects only whole intervals. A date landing
    /// exactly on `end` is kept.
    pub fn generate(start: NaiveDate, end: NaiveDate, days: i64) -> Result<Self> {
        if days <= 0 {
            return Err(SimulationError::InvalidSchedule(format!(
                "interval must be at least 1 day, got {}",
                days
            )));
        }
        if start >= end {
            return Err(SimulationError::InvalidSchedule(format!(
                "start date {} must be before end date {}",
                start, end
            )));
        }
        if days < RECOMMENDED_MIN_INTERVAL_DAYS {
            warn!(
                "Rebalancing every {} days (recommended minimum is {})",
                days, RECOMMENDED_MIN_INTERVAL_DAYS
            );
        }

        let step = Duration::try_days(days).ok_or_else(|| {
            SimulationError::InvalidSchedule(format!("interval of {} days is out of range", days))
        })?;

        // Stepping past the last representable date is also past `end`.
        let mut dates = vec![start];
        let mut next = start.checked_add_signed(step);
        while let Some(date) = next.filter(|d| *d <= end) {
            dates.push(date);
            next = date.checked_add_signed(step);
        }

        debug!(
            "Generated {} rebalancing periods between {} and {} every {} days",
            dates.len(),
            start,
            end,
            days
        );

        Ok(Self {
            dates,
            interval_days: days,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of periods (N).
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn interval_days(&self) -> i64 {
        self.interval_days
    }

    pub fn start(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }
}
