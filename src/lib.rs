//! Drip - dollar-cost averaging versus lump-sum investing on historical prices.
//!
//! # Overview
//!
//! Drip replays a budget over a panel of daily asset prices two ways:
//!
//! - **Lump sum**: the whole budget is split equally across the assets on
//!   the first date and left to compound.
//! - **Dollar-cost averaging**: an optional starting amount is invested on
//!   the first date and the remainder is injected in equal slices every
//!   fixed number of days, each slice split equally across the assets.
//!
//! Every injection compounds on its own from the day it lands; the
//! sub-indices are then summed into one blended index together with a
//! cashflow ledger of what was invested when.
//!
//! # Quick Start
//!
//! ```no_run
//! use drip::{
//!     data::{load_csv, DataConfig},
//!     simulation::{compare, SimulationConfig},
//! };
//!
//! let prices = load_csv("data/prices.csv", &DataConfig::default()).unwrap();
//! let config = SimulationConfig::new(200_000.0, 20_000.0, 30);
//! let comparison = compare(&prices, &config).unwrap();
//!
//! println!("{}", comparison.title);
//! println!("Lump sum: {:.2}", comparison.summary.baseline_final);
//! println!("DCA:      {:.2}", comparison.summary.dca_final);
//! ```
//!
//! # Prepared Returns
//!
//! Simulations can also run directly on daily returns:
//!
//! ```
//! use chrono::NaiveDate;
//! use drip::panel::ReturnPanel;
//! use drip::simulation::{simulate_returns, SimulationConfig};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let dates: Vec<NaiveDate> = start.iter_days().take(21).collect();
//! let mut returns = vec![Some(0.0); 21];
//! returns[0] = None;
//!
//! let panel = ReturnPanel::from_returns(dates, vec!["AAA".to_string()], vec![returns]).unwrap();
//! let dca = simulate_returns(&panel, &SimulationConfig::new(300.0, 0.0, 10)).unwrap();
//! assert_eq!(dca.schedule.len(), 3);
//! assert!((dca.final_value().unwrap() - 300.0).abs() < 1e-9);
//! ```

pub mod allocation;
pub mod baseline;
pub mod compound;
pub mod config;
pub mod data;
pub mod error;
pub mod index;
pub mod lookback;
pub mod panel;
pub mod reconcile;
pub mod report;
pub mod schedule;
pub mod simulation;

pub use allocation::CashflowAllocation;
pub use baseline::{build_baseline_index, BaselineIndex};
pub use config::{DripFileConfig, Selection};
pub use data::{load_csv, DataConfig};
pub use error::{Result, SimulationError};
pub use index::IndexSeries;
pub use lookback::Lookback;
pub use panel::{PricePanel, ReturnPanel};
pub use reconcile::{CashflowLedger, Wipeout};
pub use schedule::RebalancingSchedule;
pub use simulation::{
    build_blended_index, compare, simulate_returns, ComparisonSummary, DcaComparison,
    DcaSimulation, SimulationConfig,
};
