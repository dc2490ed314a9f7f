//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::{CsvTransactionSource, CsvValuationSource};
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::aggregation::{build_report, AggregationSettings};
use crate::domain::config_validation::validate_run_config;
use crate::domain::error::ScripxirrError;
use crate::domain::holding::HoldingCode;
use crate::domain::run_config::{
    ReportSettings, RunConfig, TransactionColumns, ValuationColumns, DEFAULT_BUY_LABELS,
    DEFAULT_DATE_FORMAT, DEFAULT_FILE_PREFIX,
};
use crate::domain::summary::Report;
use crate::domain::xirr::SolverConfig;
use crate::ports::config_port::ConfigPort;
use crate::ports::holding_source::{load_book, HoldingSource};
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "scripxirr", about = "Portfolio XIRR and per-holding return report")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute XIRR for the portfolio and every holding, and write the report
    Report {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Transactions export (overrides [input] transactions)
        #[arg(short, long)]
        transactions: Option<PathBuf>,
        /// Holdings summary with current market values (overrides [input] valuations)
        #[arg(short, long)]
        valuations: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Valuation date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        as_of: Option<String>,
        /// Comma-separated codes kept out of the portfolio total
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Logs go to stderr so the report on stdout stays machine-readable.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Report {
            config,
            transactions,
            valuations,
            output,
            as_of,
            exclude,
        } => run_report(
            config.as_ref(),
            transactions,
            valuations,
            output,
            as_of.as_deref(),
            exclude.as_deref(),
        ),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn run_report(
    config_path: Option<&PathBuf>,
    transactions: Option<PathBuf>,
    valuations: Option<PathBuf>,
    output: Option<PathBuf>,
    as_of: Option<&str>,
    exclude: Option<&str>,
) -> ExitCode {
    // Stage 1: Load and validate config
    let mut run_config = match config_path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            let adapter = match load_config(path) {
                Ok(a) => a,
                Err(code) => return code,
            };
            if let Err(e) = validate_run_config(&adapter) {
                eprintln!("error: {e}");
                return (&e).into();
            }
            match build_run_config(&adapter) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            }
        }
        None => RunConfig::default(),
    };

    // Stage 2: Apply CLI overrides
    if transactions.is_some() {
        run_config.transactions = transactions;
    }
    if valuations.is_some() {
        run_config.valuations = valuations;
    }
    if let Some(codes) = exclude {
        run_config.aggregation.exclude_codes = parse_codes(codes);
    }
    let as_of = match resolve_as_of(as_of) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let Some(transactions_path) = run_config.transactions.clone() else {
        let err = ScripxirrError::ConfigMissing {
            section: "input".into(),
            key: "transactions".into(),
        };
        eprintln!("error: {err}");
        return (&err).into();
    };
    let output_path = output.unwrap_or_else(|| run_config.report.output_path(as_of));

    // Stage 3: Build sources
    let tx_source = CsvTransactionSource::new(
        transactions_path,
        run_config.transaction_columns.clone(),
        run_config.date_format.clone(),
        run_config.buy_labels.clone(),
    );
    let valuation_source = run_config.valuations.clone().map(|path| {
        CsvValuationSource::new(path, run_config.valuation_columns.clone(), as_of)
    });
    let mut sources: Vec<&dyn HoldingSource> = vec![&tx_source as &dyn HoldingSource];
    match &valuation_source {
        Some(source) => sources.push(source),
        None => warn!("no valuations file configured; open positions carry no current value"),
    }

    // Stages 4-6: Load, aggregate, write
    match run_report_pipeline(
        &sources,
        &run_config.aggregation,
        &CsvReportAdapter,
        &output_path,
        as_of,
    ) {
        Ok(report) => {
            if let Err(e) = CsvReportAdapter::render(&report, std::io::stdout().lock()) {
                eprintln!("error: {e}");
                return (&e).into();
            }
            info!(path = %output_path.display(), "report written");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load every source into one book, summarise it and hand the report to
/// `report_port`.
pub fn run_report_pipeline(
    sources: &[&dyn HoldingSource],
    settings: &AggregationSettings,
    report_port: &dyn ReportPort,
    output_path: &Path,
    as_of: NaiveDate,
) -> Result<Report, ScripxirrError> {
    let book = load_book(sources)?;
    info!(holdings = book.len(), %as_of, "computing XIRR");

    let report = build_report(&book, settings, as_of);
    if !report.skipped.is_empty() {
        warn!(skipped = report.skipped.len(), "some holdings were left out of the report");
    }

    report_port.write(&report, &output_path.to_string_lossy())?;
    Ok(report)
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    match validate_run_config(&adapter).and_then(|_| build_run_config(&adapter)) {
        Ok(config) => {
            println!("Configuration OK");
            println!(
                "  transactions: {}",
                display_path(config.transactions.as_deref())
            );
            println!(
                "  valuations:   {}",
                display_path(config.valuations.as_deref())
            );
            println!("  date format:  {}", config.date_format);
            println!("  buy labels:   {}", config.buy_labels.join(", "));
            let excluded: Vec<&str> = config
                .aggregation
                .exclude_codes
                .iter()
                .map(HoldingCode::as_str)
                .collect();
            println!("  excluded:     {}", excluded.join(", "));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}

pub fn resolve_as_of(value: Option<&str>) -> Result<NaiveDate, ScripxirrError> {
    match value {
        None => Ok(chrono::Local::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            ScripxirrError::ConfigInvalid {
                section: "cli".into(),
                key: "as_of".into(),
                reason: "invalid date format (expected YYYY-MM-DD)".into(),
            }
        }),
    }
}

/// Comma-separated codes; blanks are dropped, case is kept.
pub fn parse_codes(input: &str) -> Vec<HoldingCode> {
    input
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(HoldingCode::new)
        .collect()
}

fn column(adapter: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, ScripxirrError> {
    let value = adapter.get_int("columns", key, default as i64);
    usize::try_from(value).map_err(|_| ScripxirrError::ConfigInvalid {
        section: "columns".into(),
        key: key.into(),
        reason: "column index must be non-negative".into(),
    })
}

fn count(adapter: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, ScripxirrError> {
    let value = adapter.get_int("solver", key, default as i64);
    usize::try_from(value).map_err(|_| ScripxirrError::ConfigInvalid {
        section: "solver".into(),
        key: key.into(),
        reason: format!("{key} must be non-negative"),
    })
}

pub fn build_solver_config(adapter: &dyn ConfigPort) -> Result<SolverConfig, ScripxirrError> {
    let d = SolverConfig::default();
    Ok(SolverConfig {
        initial_guess: adapter.get_double("solver", "initial_guess", d.initial_guess),
        max_iterations: count(adapter, "max_iterations", d.max_iterations)?,
        npv_tolerance: adapter.get_double("solver", "npv_tolerance", d.npv_tolerance),
        npv_tolerance_floor: d.npv_tolerance_floor,
        step_tolerance: adapter.get_double("solver", "step_tolerance", d.step_tolerance),
        bracket_low: adapter.get_double("solver", "bracket_low", d.bracket_low),
        bracket_high: adapter.get_double("solver", "bracket_high", d.bracket_high),
        max_bracket_expansions: count(adapter, "max_bracket_expansions", d.max_bracket_expansions)?,
        bisection_iterations: count(adapter, "bisection_iterations", d.bisection_iterations)?,
    })
}

pub fn build_run_config(adapter: &dyn ConfigPort) -> Result<RunConfig, ScripxirrError> {
    let tx_defaults = TransactionColumns::default();
    let val_defaults = ValuationColumns::default();

    let buy_labels = adapter
        .get_list("input", "buy_labels")
        .unwrap_or_else(|| DEFAULT_BUY_LABELS.iter().map(|s| s.to_string()).collect());
    if buy_labels.is_empty() {
        return Err(ScripxirrError::ConfigInvalid {
            section: "input".into(),
            key: "buy_labels".into(),
            reason: "buy_labels must name at least one label".into(),
        });
    }

    Ok(RunConfig {
        transactions: adapter.get_string("input", "transactions").map(PathBuf::from),
        valuations: adapter.get_string("input", "valuations").map(PathBuf::from),
        date_format: adapter
            .get_string("input", "date_format")
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
        buy_labels,
        transaction_columns: TransactionColumns {
            code: column(adapter, "code", tx_defaults.code)?,
            name: column(adapter, "name", tx_defaults.name)?,
            kind: column(adapter, "type", tx_defaults.kind)?,
            quantity: column(adapter, "quantity", tx_defaults.quantity)?,
            price: column(adapter, "price", tx_defaults.price)?,
            date: column(adapter, "date", tx_defaults.date)?,
        },
        valuation_columns: ValuationColumns {
            code: column(adapter, "code", val_defaults.code)?,
            name: column(adapter, "name", val_defaults.name)?,
            quantity: column(adapter, "holding_quantity", val_defaults.quantity)?,
            market_value: column(adapter, "market_value", val_defaults.market_value)?,
        },
        aggregation: AggregationSettings {
            exclude_codes: adapter
                .get_list("portfolio", "exclude_codes")
                .unwrap_or_default()
                .into_iter()
                .map(HoldingCode::new)
                .collect(),
            solver: build_solver_config(adapter)?,
        },
        report: ReportSettings {
            output_dir: adapter
                .get_string("report", "output_dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            file_prefix: adapter
                .get_string("report", "file_prefix")
                .unwrap_or_else(|| DEFAULT_FILE_PREFIX.to_string()),
        },
    })
}
