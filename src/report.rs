//! Reporting of simulation results: terminal report, ledger table, JSON and
//! CSV export, and sparklines of the two value curves.

use crate::error::{Result, SimulationError};
use crate::reconcile::CashflowLedger;
use crate::simulation::DcaComparison;
use colored::Colorize;
use std::io::Write;
use tabled::{builder::Builder, settings::Style};

/// Characters used for sparkline rendering, ordered from low to high.
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Decimals shown for currency amounts.
const AMOUNT_DECIMALS: usize = 2;

/// Format an amount as a whole number with thousands separators, ignoring
/// the sign (e.g. `-200000.4` becomes `200,000`).
pub fn accounting_format(amount: f64) -> String {
    let digits = format!("{:.0}", amount.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn amount(value: f64) -> String {
    format!("{:.*}", AMOUNT_DECIMALS, value)
}

/// Generate an ASCII sparkline from a slice of values.
pub fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let sampled = if values.len() > width {
        downsample(values, width)
    } else {
        values.to_vec()
    };

    let min_val = sampled.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_val = sampled.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max_val - min_val;

    sampled
        .iter()
        .map(|&val| {
            let normalized = if range > 0.0 {
                ((val - min_val) / range).clamp(0.0, 1.0)
            } else {
                0.5
            };
            SPARKLINE_CHARS[((normalized * 7.0).round() as usize).min(7)]
        })
        .collect()
}

/// Downsample a slice of values to a target length using averaging.
fn downsample(values: &[f64], target_len: usize) -> Vec<f64> {
    let chunk_size = values.len() as f64 / target_len as f64;
    let mut result = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let start = (i as f64 * chunk_size).floor() as usize;
        let end = (((i + 1) as f64 * chunk_size).ceil() as usize).min(values.len());

        if start < end {
            let sum: f64 = values[start..end].iter().sum();
            result.push(sum / (end - start) as f64);
        }
    }

    result
}

/// Render the cashflow ledger as a table, amounts rounded for display.
///
/// Each cell is rounded on its own, so a displayed total may differ by a
/// cent from the sum of the displayed cells above it.
pub fn ledger_table(ledger: &CashflowLedger) -> String {
    let mut builder = Builder::new();

    let mut header = vec!["Date".to_string()];
    header.extend(ledger.assets.iter().cloned());
    header.push("Total".to_string());
    builder.push_record(header);

    for row in &ledger.rows {
        let mut record = vec![row.label.clone()];
        record.extend(row.amounts.iter().map(|a| amount(*a)));
        record.push(amount(row.total));
        builder.push_record(record);
    }

    let mut totals = vec!["Total".to_string()];
    totals.extend(ledger.totals.iter().map(|a| amount(*a)));
    totals.push(amount(ledger.grand_total));
    builder.push_record(totals);

    builder.build().with(Style::rounded()).to_string()
}

/// Write the ledger as CSV, including the Total column and row.
///
/// Amounts are rounded per cell, as in [`ledger_table`].
pub fn write_ledger_csv<W: Write>(ledger: &CashflowLedger, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["Date".to_string()];
    header.extend(ledger.assets.iter().cloned());
    header.push("Total".to_string());
    csv.write_record(&header)?;

    for row in &ledger.rows {
        let mut record = vec![row.label.clone()];
        record.extend(row.amounts.iter().map(|a| amount(*a)));
        record.push(amount(row.total));
        csv.write_record(&record)?;
    }

    let mut totals = vec!["Total".to_string()];
    totals.extend(ledger.totals.iter().map(|a| amount(*a)));
    totals.push(amount(ledger.grand_total));
    csv.write_record(&totals)?;

    csv.flush()?;
    Ok(())
}

/// Write both value curves as CSV: date, baseline, DCA.
pub fn write_index_csv<W: Write>(comparison: &DcaComparison, writer: W) -> Result<()> {
    let baseline = &comparison.baseline.index;
    let dca = &comparison.dca.index;
    if baseline.dates != dca.dates {
        return Err(SimulationError::DataError(
            "baseline and DCA indices are not on the same calendar".to_string(),
        ));
    }

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Date", baseline.label.as_str(), dca.label.as_str()])?;
    for ((date, base), dca_value) in baseline.iter().zip(dca.values.iter()) {
        csv.write_record([
            date.format("%Y-%m-%d").to_string(),
            amount(base),
            amount(*dca_value),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Serialize a comparison to pretty JSON.
pub fn to_json(comparison: &DcaComparison) -> Result<String> {
    Ok(serde_json::to_string_pretty(comparison)?)
}

/// Terminal output for comparisons.
pub struct ComparisonFormatter;

impl ComparisonFormatter {
    /// Print a full comparison report to stdout.
    pub fn print_report(comparison: &DcaComparison) {
        let dca = &comparison.dca;
        let baseline = &comparison.baseline;
        let summary = &comparison.summary;

        println!();
        println!("{}", "═".repeat(60).blue());
        println!("{}", format!(" {} ", comparison.title).bold().blue());
        println!("{}", "═".repeat(60).blue());
        println!();

        println!("{}", "Overview".bold().underline());
        println!("  Assets:          {}", dca.index.assets.join(", "));
        if let (Some(first), Some(last)) = (dca.index.dates.first(), dca.index.dates.last()) {
            println!(
                "  Period:          {} to {}",
                first.format("%Y-%m-%d"),
                last.format("%Y-%m-%d")
            );
        }
        println!("  Calendar Days:   {}", dca.index.len());
        println!("  Rebalancings:    {}", dca.schedule.len());
        println!("  Interval:        {} days", dca.schedule.interval_days());
        println!();

        println!("{}", "Cashflows".bold().underline());
        println!("  Budget:          {:>14.2}", comparison.config.budget);
        println!("  Starting Amount: {:>14.2}", comparison.config.starting_amount);
        println!(
            "  Per Period:      {:>14.2}  (after T0)",
            dca.allocation.per_period(1)
        );
        println!();

        println!("{}", "Results".bold().underline());
        println!(
            "  {:<16} {:>14.2}  {}",
            format!("{}:", baseline.index.label),
            summary.baseline_final,
            Self::format_pct_change(summary.baseline_return_pct)
        );
        println!(
            "  {:<16} {:>14.2}  {}",
            format!("{}:", dca.index.label),
            summary.dca_final,
            Self::format_pct_change(summary.dca_return_pct)
        );
        println!("  Difference:      {:>14.2}", summary.difference);
        println!();

        println!("{}", "Curves".bold().underline());
        println!("  {:<16} {}", baseline.index.label, sparkline(&baseline.index.values, 40));
        println!("  {:<16} {}", dca.index.label, sparkline(&dca.index.values, 40));
        println!();

        let wipeouts = dca.wipeouts.iter().chain(baseline.wipeouts.iter());
        for w in wipeouts {
            println!(
                "  {}",
                format!(
                    "{} injection of {} wiped out on {}",
                    w.asset, w.injected_on, w.wiped_out_on
                )
                .yellow()
            );
        }

        println!("{}", "Cashflow Ledger".bold().underline());
        println!("{}", ledger_table(&dca.ledger));
        println!("{}", "═".repeat(60).blue());
    }

    /// Format percentage change with color.
    fn format_pct_change(pct: f64) -> String {
        if pct >= 0.0 {
            format!("(+{:.2}%)", pct).green().to_string()
        } else {
            format!("({:.2}%)", pct).red().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::PricePanel;
    use crate::simulation::{compare, SimulationConfig};
    use chrono::NaiveDate;

    fn comparison() -> DcaComparison {
        let dates: Vec<NaiveDate> = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .iter_days()
            .take(31)
            .collect();
        let prices = PricePanel::new(
            dates,
            vec!["AAA".to_string(), "BBB".to_string()],
            vec![vec![Some(10.0); 31], vec![Some(20.0); 31]],
        )
        .unwrap();
        compare(&prices, &SimulationConfig::new(1000.0, 0.0, 10)).unwrap()
    }

    #[test]
    fn test_accounting_format() {
        assert_eq!(accounting_format(200_000.0), "200,000");
        assert_eq!(accounting_format(-1234567.4), "1,234,567");
        assert_eq!(accounting_format(999.6), "1,000");
        assert_eq!(accounting_format(12.0), "12");
    }

    #[test]
    fn test_sparkline() {
        let spark = sparkline(&[1.0, 2.0, 3.0, 4.0], 4);
        assert_eq!(spark.chars().count(), 4);
        assert!(spark.starts_with('▁'));
        assert!(spark.ends_with('█'));

        let long: Vec<f64> = (0..100).map(|i| i as f64).collect();
        assert_eq!(sparkline(&long, 20).chars().count(), 20);
        assert!(sparkline(&[], 10).is_empty());
    }

    #[test]
    fn test_ledger_table_has_total_row() {
        let comparison = comparison();
        let table = ledger_table(&comparison.dca.ledger);

        assert!(table.contains("Date"));
        assert!(table.contains("01/11/2024"));
        assert!(table.contains("1000.00"));
        assert!(table.contains("125.00"));
    }

    #[test]
    fn test_ledger_totals_keep_full_precision() {
        let dates: Vec<NaiveDate> = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .iter_days()
            .take(21)
            .collect();
        let prices = PricePanel::new(dates, vec!["AAA".to_string()], vec![vec![Some(5.0); 21]])
            .unwrap();
        let comparison = compare(&prices, &SimulationConfig::new(1000.0, 0.0, 10)).unwrap();

        let table = ledger_table(&comparison.dca.ledger);
        assert!(table.contains("333.33"));
        assert!(table.contains("1000.00"));
    }

    #[test]
    fn test_ledger_csv() {
        let comparison = comparison();
        let mut buffer = Vec::new();
        write_ledger_csv(&comparison.dca.ledger, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Date,AAA,BBB,Total");
        assert_eq!(lines[1], "01/01/2024,125.00,125.00,250.00");
        assert_eq!(lines.last().unwrap(), &"Total,500.00,500.00,1000.00");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_index_csv_and_json() {
        let comparison = comparison();
        let mut buffer = Vec::new();
        write_index_csv(&comparison, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("Date,EW Index base,DCA\n"));
        assert!(text.contains("2024-01-31,1000.00,1000.00"));

        let json = to_json(&comparison).unwrap();
        assert!(json.contains("\"title\""));
        assert!(json.contains("EW Index base"));
    }
}
