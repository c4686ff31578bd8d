//! Integration tests for the simulation engine.

use chrono::NaiveDate;
use drip::config::{DripFileConfig, Selection};
use drip::data::{load_csv, DataConfig};
use drip::lookback::Lookback;
use drip::panel::{PricePanel, ReturnPanel};
use drip::report::{write_index_csv, write_ledger_csv};
use drip::simulation::{build_blended_index, compare, simulate_returns, SimulationConfig};
use drip::SimulationError;
use std::io::Write;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {}, got {}",
        expected,
        actual
    );
}

/// Daily panel where each asset follows a deterministic wave around a drift.
fn create_synthetic_panel(start: NaiveDate, days: usize, assets: &[&str]) -> PricePanel {
    let dates: Vec<NaiveDate> = start.iter_days().take(days).collect();
    let columns = assets
        .iter()
        .enumerate()
        .map(|(k, _)| {
            let mut price = 100.0 + 10.0 * k as f64;
            (0..days)
                .map(|i| {
                    let noise = ((i as f64 * 0.7 + k as f64).sin() + (i as f64 * 1.3).cos()) * 0.01;
                    price *= 1.0 + 0.0005 + noise;
                    Some(price)
                })
                .collect()
        })
        .collect();

    PricePanel::new(dates, assets.iter().map(|a| a.to_string()).collect(), columns).unwrap()
}

fn write_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_two_assets_quarterly_with_starting_amount() {
    let dates: Vec<NaiveDate> = date(2023, 1, 1).iter_days().take(365).collect();
    let prices = PricePanel::new(
        dates,
        vec!["AAA".to_string(), "BBB".to_string()],
        vec![vec![Some(100.0); 365], vec![Some(40.0); 365]],
    )
    .unwrap();

    let dca = build_blended_index(&prices, &SimulationConfig::new(1000.0, 500.0, 90)).unwrap();

    assert_eq!(
        dca.schedule.dates(),
        &[
            date(2023, 1, 1),
            date(2023, 4, 1),
            date(2023, 6, 30),
            date(2023, 9, 28),
            date(2023, 12, 27)
        ]
    );
    assert_eq!(dca.ledger.rows[0].amounts, vec![250.0, 250.0]);
    for row in &dca.ledger.rows[1..] {
        assert_eq!(row.amounts, vec![62.5, 62.5]);
    }
    assert_eq!(dca.ledger.rows[1].label, "04/01/2023");
    assert_close(dca.ledger.grand_total, 1000.0);
    assert_close(dca.ledger.body_sum(), 1000.0);
    assert_close(dca.final_value().unwrap(), 1000.0);
}

#[test]
fn test_csv_with_gaps_to_comparison() {
    let file = write_csv(
        "Date,AAA,BBB\n\
         2024-01-01,100,50\n\
         2024-01-03,110,\n\
         2024-01-05,121,55\n",
    );

    let prices = load_csv(file.path(), &DataConfig::default()).unwrap();
    assert_eq!(prices.len(), 3);

    let comparison = compare(&prices, &SimulationConfig::new(1000.0, 0.0, 2)).unwrap();

    // Normalized onto five calendar days
    assert_eq!(comparison.dca.index.len(), 5);
    assert_eq!(comparison.dca.schedule.len(), 3);

    // Lump sum: 500 in each, AAA +21%, BBB +10%
    assert_close(comparison.summary.baseline_final, 1155.0);
    assert_eq!(comparison.baseline.index.label, "EW Index base");

    // DCA: 1000/6 per asset on days 1, 3 and 5
    // AAA grows 1.21, 1.10, 1.00; BBB grows 1.10, 1.10, 1.00
    assert_close(comparison.summary.dca_final, 1085.0);
    assert_close(comparison.summary.difference, -70.0);
    assert!(!comparison.summary.dca_outperformed());
    assert_eq!(
        comparison.title,
        "Investing 1,000 at T0 vs DCAing every 2 days"
    );
}

#[test]
fn test_late_listed_asset_keeps_cash_until_priced() {
    let dates: Vec<NaiveDate> = date(2024, 1, 1).iter_days().take(21).collect();
    let mut late = vec![None; 5];
    late.extend(vec![Some(20.0); 16]);
    let prices = PricePanel::new(
        dates,
        vec!["AAA".to_string(), "NEW".to_string()],
        vec![vec![Some(10.0); 21], late],
    )
    .unwrap();

    let dca = build_blended_index(&prices, &SimulationConfig::new(600.0, 0.0, 10)).unwrap();

    assert_eq!(dca.schedule.len(), 3);
    // Only AAA is valued before NEW lists
    assert_close(dca.index.values[0], 100.0);
    assert_close(dca.index.values[4], 100.0);
    assert_close(dca.index.values[5], 200.0);
    assert_close(dca.final_value().unwrap(), 600.0);
    assert_close(dca.ledger.total_for("NEW").unwrap(), 300.0);
}

#[test]
fn test_wipeout_is_reported_not_raised() {
    let dates: Vec<NaiveDate> = date(2024, 1, 1).iter_days().take(21).collect();
    let mut returns = vec![Some(0.0); 21];
    returns[0] = None;
    returns[2] = Some(-1.0);

    let panel = ReturnPanel::from_returns(dates, vec!["AAA".to_string()], vec![returns]).unwrap();
    let dca = simulate_returns(&panel, &SimulationConfig::new(300.0, 0.0, 10)).unwrap();

    assert_eq!(dca.wipeouts.len(), 1);
    assert_eq!(dca.wipeouts[0].asset, "AAA");
    assert_eq!(dca.wipeouts[0].injected_on, date(2024, 1, 1));
    assert_eq!(dca.wipeouts[0].wiped_out_on, date(2024, 1, 3));

    // The two later injections are unaffected
    assert_close(dca.final_value().unwrap(), 200.0);
    assert_close(dca.ledger.grand_total, 300.0);
}

#[test]
fn test_preconditions_fail_before_computation() {
    let prices = create_synthetic_panel(date(2022, 1, 1), 100, &["AAA"]);

    let over = compare(&prices, &SimulationConfig::new(100.0, 200.0, 30));
    assert!(matches!(
        over,
        Err(SimulationError::StartingAmountExceedsBudget { .. })
    ));

    let zero_interval = compare(&prices, &SimulationConfig::new(100.0, 0.0, 0));
    assert!(matches!(zero_interval, Err(SimulationError::InvalidSchedule(_))));

    // One period with money left over cannot be spread
    let single_period = compare(&prices, &SimulationConfig::new(100.0, 50.0, 365));
    assert!(matches!(
        single_period,
        Err(SimulationError::InsufficientPeriods { periods: 1, .. })
    ));

    let one_day = prices.filter(Some(date(2022, 1, 5)), Some(date(2022, 1, 5)), None).unwrap();
    assert!(matches!(
        compare(&one_day, &SimulationConfig::default()),
        Err(SimulationError::InvalidSchedule(_))
    ));
}

#[test]
fn test_synthetic_market_is_deterministic() {
    let prices = create_synthetic_panel(date(2019, 1, 1), 1500, &["SPY", "QQQ", "TLT"]);
    let config = SimulationConfig::default();

    let first = compare(&prices, &config).unwrap();
    let second = compare(&prices, &config).unwrap();

    assert_eq!(first, second);
    assert_close(first.dca.ledger.body_sum(), config.budget);
    assert_eq!(first.dca.index.len(), 1500);
    assert!(first.summary.baseline_final > 0.0);
    assert!(first.summary.dca_final > 0.0);
}

#[test]
fn test_config_file_run() {
    let csv_file = write_csv(
        &std::iter::once("Date;SPY;TLT".to_string())
            .chain(
                date(2023, 1, 1)
                    .iter_days()
                    .take(365)
                    .map(|d| format!("{};{};{}", d.format("%d/%m/%Y"), 400.0, 100.0)),
            )
            .collect::<Vec<_>>()
            .join("\n"),
    );

    let toml = format!(
        r#"
[simulation]
budget = 9000.0
starting_amount = 3000.0
interval_days = 30

[data]
path = "{}"
assets = ["TLT"]
lookback = "3m"
date_format = "%d/%m/%Y"
delimiter = ";"
"#,
        csv_file.path().display()
    );
    let config_file = write_csv(&toml);

    let file_config = DripFileConfig::load(config_file.path()).unwrap();
    let path = file_config.data.path.clone().unwrap();
    let panel = load_csv(&path, &file_config.to_data_config().unwrap()).unwrap();
    let selected = file_config.selection().unwrap().apply(&panel).unwrap();

    assert_eq!(selected.assets(), &["TLT".to_string()]);
    assert_eq!(selected.first_date(), Some(date(2023, 9, 30)));
    assert_eq!(selected.last_date(), Some(date(2023, 12, 31)));

    let comparison = compare(&selected, &file_config.to_simulation_config()).unwrap();
    assert_eq!(comparison.baseline.index.label, "TLT base");
    // 2023-09-30 .. 2023-12-31: four injections 30 days apart
    assert_eq!(comparison.dca.schedule.len(), 4);
    assert_close(comparison.dca.ledger.rows[0].total, 3000.0);
    assert_close(comparison.dca.ledger.rows[1].total, 2000.0);
    assert_close(comparison.summary.dca_final, 9000.0);
}

#[test]
fn test_fixed_episode_selection() {
    let prices = create_synthetic_panel(date(2019, 6, 1), 1000, &["SPY"]);
    let selection = Selection {
        lookback: Some(Lookback::CovidCrash),
        ..Default::default()
    };

    let crash = selection.apply(&prices).unwrap();
    assert_eq!(crash.first_date(), Some(date(2020, 2, 20)));
    assert_eq!(crash.last_date(), Some(date(2020, 3, 20)));

    let comparison = compare(&crash, &SimulationConfig::new(10_000.0, 0.0, 7)).unwrap();
    assert_eq!(comparison.dca.schedule.len(), 5);
    assert_close(comparison.dca.ledger.body_sum(), 10_000.0);
}

#[test]
fn test_exports() {
    let prices = create_synthetic_panel(date(2024, 1, 1), 60, &["AAA", "BBB"]);
    let comparison = compare(&prices, &SimulationConfig::new(1000.0, 100.0, 20)).unwrap();

    let mut index_csv = Vec::new();
    write_index_csv(&comparison, &mut index_csv).unwrap();
    let index_text = String::from_utf8(index_csv).unwrap();
    assert_eq!(index_text.lines().count(), 61);
    assert!(index_text.starts_with("Date,EW Index base,DCA"));

    let mut ledger_csv = Vec::new();
    write_ledger_csv(&comparison.dca.ledger, &mut ledger_csv).unwrap();
    let ledger_text = String::from_utf8(ledger_csv).unwrap();
    // header + 3 periods + Total row
    assert_eq!(ledger_text.lines().count(), 5);
    assert!(ledger_text.lines().last().unwrap().ends_with("1000.00"));
}

#[test]
fn test_results_can_cross_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PricePanel>();
    assert_send_sync::<ReturnPanel>();
    assert_send_sync::<drip::DcaComparison>();
    assert_send_sync::<SimulationError>();

    let prices = create_synthetic_panel(date(2020, 1, 1), 400, &["AAA", "BBB"]);
    let handles: Vec<_> = [7i64, 30, 90]
        .into_iter()
        .map(|interval| {
            let prices = prices.clone();
            std::thread::spawn(move || {
                compare(&prices, &SimulationConfig::new(50_000.0, 5_000.0, interval))
                    .map(|c| c.dca.ledger.grand_total)
            })
        })
        .collect();

    for handle in handles {
        assert_close(handle.join().unwrap().unwrap(), 50_000.0);
    }
}
