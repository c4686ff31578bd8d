//! Command-line interface for the simulation engine.

use drip::config::{DripFileConfig, Selection};
use drip::data::{load_csv, DataConfig};
use drip::error::{Result, SimulationError};
use drip::lookback::Lookback;
use drip::panel::PricePanel;
use drip::report::{to_json, write_index_csv, write_ledger_csv, ComparisonFormatter};
use drip::simulation::{compare, SimulationConfig};

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Drip - compare lump-sum investing against dollar-cost averaging.
#[derive(Parser)]
#[command(name = "drip")]
#[command(version)]
#[command(about = "Compare investing a budget at once against dollar-cost averaging it")]
#[command(long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Simulate a DCA schedule against a lump-sum investment
    Run {
        /// Path to a wide price CSV (Date column, then one column per asset)
        #[arg(short, long)]
        data: PathBuf,

        /// Assets to include, comma separated (default: all columns)
        #[arg(short, long, value_delimiter = ',')]
        assets: Vec<String>,

        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last date to include (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Named window: 1w, mtd, 3m, 6m, ytd, 1y, 3y, 5y, max, "covid crash", "2022 rate hikes"
        #[arg(short, long)]
        lookback: Option<Lookback>,

        /// Total amount to invest
        #[arg(short, long, default_value = "200000")]
        budget: f64,

        /// Amount invested on the first date
        #[arg(short, long, default_value = "20000")]
        starting_amount: f64,

        /// Days between injections
        #[arg(short, long, default_value = "30")]
        interval: i64,

        /// CSV delimiter (auto-detected if not specified)
        #[arg(long)]
        delimiter: Option<char>,

        /// Date format of the CSV (e.g. %d/%m/%Y)
        #[arg(long)]
        date_format: Option<String>,

        /// Also write the cashflow ledger to this CSV file
        #[arg(long)]
        ledger: Option<PathBuf>,
    },

    /// Run a simulation from a configuration file
    RunConfig {
        /// Path to TOML configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "drip.toml")]
        output: PathBuf,
    },

    /// Validate a price file
    Validate {
        /// Path to CSV data file
        #[arg(short, long)]
        data: PathBuf,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl Cli {
    /// Initialize logging based on verbosity level.
    pub fn init_logging(&self) -> Result<()> {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(io::stderr)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| SimulationError::ConfigError(format!("failed to set logger: {}", e)))
    }
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging()?;

    match &cli.command {
        Commands::Run {
            data,
            assets,
            start,
            end,
            lookback,
            budget,
            starting_amount,
            interval,
            delimiter,
            date_format,
            ledger,
        } => {
            let data_config = DataConfig {
                date_format: date_format.clone(),
                delimiter: delimiter_byte(*delimiter)?,
                ..Default::default()
            };
            let selection = Selection {
                assets: (!assets.is_empty()).then(|| assets.clone()),
                start: *start,
                end: *end,
                lookback: *lookback,
            };
            let config = SimulationConfig::new(*budget, *starting_amount, *interval);
            run_simulation(
                data,
                &data_config,
                &selection,
                &config,
                ledger.as_deref(),
                cli.output,
            )
        }

        Commands::RunConfig { config } => run_from_config(config, cli.output),

        Commands::Init { output } => init_config(output),

        Commands::Validate { data } => validate_data(data),
    }
}

fn delimiter_byte(delimiter: Option<char>) -> Result<Option<u8>> {
    match delimiter {
        Some(c) if c.is_ascii() => Ok(Some(c as u8)),
        Some(c) => Err(SimulationError::InvalidInput(format!(
            "delimiter {:?} is not an ASCII character",
            c
        ))),
        None => Ok(None),
    }
}

fn load_selection(
    data_path: &Path,
    data_config: &DataConfig,
    selection: &Selection,
) -> Result<PricePanel> {
    info!("Loading data from: {}", data_path.display());
    let panel = load_csv(data_path, data_config)?;
    selection.apply(&panel)
}

fn run_simulation(
    data_path: &Path,
    data_config: &DataConfig,
    selection: &Selection,
    config: &SimulationConfig,
    ledger_path: Option<&Path>,
    output: OutputFormat,
) -> Result<()> {
    let prices = load_selection(data_path, data_config, selection)?;
    let comparison = compare(&prices, config)?;

    if let Some(path) = ledger_path {
        write_ledger_csv(&comparison.dca.ledger, File::create(path)?)?;
        info!("Wrote cashflow ledger to {}", path.display());
    }

    match output {
        OutputFormat::Text => ComparisonFormatter::print_report(&comparison),
        OutputFormat::Json => println!("{}", to_json(&comparison)?),
        OutputFormat::Csv => write_index_csv(&comparison, io::stdout().lock())?,
    }

    Ok(())
}

fn run_from_config(config_path: &Path, output: OutputFormat) -> Result<()> {
    let file_config = DripFileConfig::load(config_path)?;

    let data_path = file_config.data.path.as_deref().ok_or_else(|| {
        SimulationError::ConfigError("No data path specified in config".to_string())
    })?;

    run_simulation(
        Path::new(data_path),
        &file_config.to_data_config()?,
        &file_config.selection()?,
        &file_config.to_simulation_config(),
        None,
        output,
    )
}

fn init_config(output: &Path) -> Result<()> {
    if output.exists() {
        return Err(SimulationError::ConfigError(format!(
            "{} already exists",
            output.display()
        )));
    }

    fs::write(output, DripFileConfig::example())?;
    println!("Created example configuration file: {}", output.display());
    println!("\nEdit this file to point at your price data, then run:");
    println!("  drip run-config -c {}", output.display());
    Ok(())
}

fn validate_data(data_path: &Path) -> Result<()> {
    println!("Validating data file: {}", data_path.display());

    let panel = load_csv(data_path, &DataConfig::default())?;
    let (normalized, report) = panel.normalize_with_report();

    println!("\nData Summary:");
    println!("  Assets: {}", normalized.assets().join(", "));
    if let Some((first, last)) = normalized.date_range() {
        println!("  Span: {} to {} ({} days)", first, last, normalized.len());
    }
    println!("  Source Rows: {}", report.source_rows);
    println!("  Inserted Dates: {}", report.inserted_dates);
    println!("  Forward-filled Cells: {}", report.filled_cells);
    println!("  Leading Missing Cells: {}", report.leading_missing);

    println!("\nFirst Observation:");
    for (i, asset) in normalized.assets().iter().enumerate() {
        match normalized.first_observation(i) {
            Some(row) => println!("  {:<12} {}", asset, normalized.dates()[row]),
            None => println!("  {:<12} never priced", asset),
        }
    }

    println!("\nValidation: PASSED");
    Ok(())
}
