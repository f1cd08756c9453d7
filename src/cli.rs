//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::indicator_signals::IndicatorSignals;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_strategy_config, validate_universe_config,
    DEFAULT_HOLD_COUNT, DEFAULT_MOMENTUM_WINDOW, DEFAULT_SAFETY_MARGIN, DEFAULT_STARTING_CASH,
    DEFAULT_TREND_WINDOW,
};
use crate::domain::error::RotatorError;
use crate::domain::indicator::IndicatorType;
use crate::domain::metrics::Metrics;
use crate::domain::rebalancer::{RebalanceConfig, ZeroSharePolicy};
use crate::domain::symbol::Symbol;
use crate::domain::universe::{
    apply_exclusions, parse_symbol_lines, parse_symbols, validate_universe, SkipReason,
    SkippedSymbol, UniverseValidationResult,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "rotator", about = "Monthly momentum rotation backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Check config and data availability without trading
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        /// Report every symbol in the data directory
        #[arg(long)]
        all: bool,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest { config, dry_run } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest(&config)
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info {
            config,
            symbol,
            all,
        } => run_info(&config, symbol.as_deref(), all),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = RotatorError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Relative paths in a config file are resolved against its directory.
fn config_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn resolve_path(base: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value.trim());
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    validate_backtest_config(config)?;
    validate_universe_config(config)?;
    validate_strategy_config(config)?;
    Ok(())
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, RotatorError> {
    let start_date = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;

    let zero_share_policy = match config.get_string("strategy", "zero_share_policy") {
        Some(raw) => raw
            .parse::<ZeroSharePolicy>()
            .map_err(|reason| RotatorError::invalid("strategy", "zero_share_policy", reason))?,
        None => ZeroSharePolicy::default(),
    };

    let reference_symbol = config
        .get_string("universe", "reference_symbol")
        .filter(|s| !s.trim().is_empty())
        .map(|s| Symbol::new(&s));

    Ok(BacktestConfig {
        start_date,
        end_date,
        starting_cash: config.get_double("backtest", "starting_cash", DEFAULT_STARTING_CASH),
        commission_rate: config.get_double("backtest", "commission_rate", 0.0),
        risk_free_rate: config.get_double("backtest", "risk_free_rate", 0.0),
        trend_window: positive(config, "trend_window", DEFAULT_TREND_WINDOW)?,
        momentum_window: positive(config, "momentum_window", DEFAULT_MOMENTUM_WINDOW)?,
        rebalance: RebalanceConfig {
            hold_count: positive(config, "hold_count", DEFAULT_HOLD_COUNT)?,
            safety_margin: config.get_double("strategy", "safety_margin", DEFAULT_SAFETY_MARGIN),
            zero_share_policy,
            reference_symbol,
        },
    })
}

fn positive(config: &dyn ConfigPort, key: &str, default: i64) -> Result<usize, RotatorError> {
    let value = config.get_int("strategy", key, default);
    usize::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| RotatorError::invalid("strategy", key, format!("{key} must be at least 1")))
}

/// Universe symbols from `symbols` or `symbols_file`, minus `exclude`.
pub fn resolve_symbols(config: &dyn ConfigPort, base: &Path) -> Result<Vec<Symbol>, RotatorError> {
    let symbols = match config
        .get_string("universe", "symbols")
        .filter(|s| !s.trim().is_empty())
    {
        Some(inline) => parse_symbols(&inline)?,
        None => {
            let file = config
                .get_string("universe", "symbols_file")
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| RotatorError::missing("universe", "symbols"))?;
            let path = resolve_path(base, &file);
            let content = fs::read_to_string(&path).map_err(|e| {
                RotatorError::invalid(
                    "universe",
                    "symbols_file",
                    format!("cannot read {}: {}", path.display(), e),
                )
            })?;
            parse_symbol_lines(&content)?
        }
    };

    let excluded: Vec<Symbol> = config
        .get_list("universe", "exclude")
        .iter()
        .map(|s| Symbol::new(s))
        .collect();
    Ok(apply_exclusions(symbols, &excluded))
}

pub fn data_dir(config: &dyn ConfigPort, base: &Path) -> PathBuf {
    let dir = config
        .get_string("backtest", "data_dir")
        .unwrap_or_else(|| "data".to_string());
    resolve_path(base, &dir)
}

struct Prepared {
    config: BacktestConfig,
    symbols: Vec<Symbol>,
    data_port: CsvAdapter,
}

fn prepare(config_path: &Path) -> Result<Prepared, ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let base = config_dir(config_path);

    let prepared = validate_config(&adapter).and_then(|()| {
        Ok(Prepared {
            config: build_backtest_config(&adapter)?,
            symbols: resolve_symbols(&adapter, &base)?,
            data_port: CsvAdapter::new(data_dir(&adapter, &base)),
        })
    });

    prepared.map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn run_backtest(config_path: &Path) -> ExitCode {
    let prepared = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    match run_backtest_pipeline(&prepared.data_port, &prepared.config, prepared.symbols) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    symbols: Vec<Symbol>,
) -> Result<(), RotatorError> {
    let mut bt_config = bt_config.clone();
    let UniverseValidationResult { universe, bars, .. } =
        load_universe(data_port, &mut bt_config, symbols)?;

    let signals = IndicatorSignals::from_bars(bars, bt_config.trend_window, bt_config.momentum_window);

    eprintln!(
        "Running backtest: {} symbols, {} to {}, hold {}",
        universe.len(),
        bt_config.start_date,
        bt_config.end_date,
        bt_config.rebalance.hold_count,
    );

    let result = backtest_engine::run_backtest(universe, &signals, &bt_config)?;
    let metrics = Metrics::compute(&result.equity_curve, bt_config.starting_cash, bt_config.risk_free_rate)
        .with_activity(result.fills.len(), result.cycles.len());

    print_summary(&result, &metrics);
    Ok(())
}

/// Validate the symbols' history and pin the reference symbol, which
/// defaults to the first configured symbol.
fn load_universe(
    data_port: &dyn DataPort,
    bt_config: &mut BacktestConfig,
    symbols: Vec<Symbol>,
) -> Result<UniverseValidationResult, RotatorError> {
    if bt_config.rebalance.reference_symbol.is_none() {
        bt_config.rebalance.reference_symbol = symbols.first().cloned();
    }

    eprintln!("Validating {} symbols...", symbols.len());
    let validation = validate_universe(
        data_port,
        symbols,
        bt_config.start_date,
        bt_config.end_date,
        bt_config.required_bars(),
    )?;
    print_skipped(&validation.skipped);
    check_reference(bt_config, &validation.skipped)?;
    Ok(validation)
}

/// The reference symbol gates every cycle, so it cannot be one of the skipped.
fn check_reference(bt_config: &BacktestConfig, skipped: &[SkippedSymbol]) -> Result<(), RotatorError> {
    let Some(reference) = &bt_config.rebalance.reference_symbol else {
        return Ok(());
    };
    match skipped.iter().find(|s| &s.symbol == reference) {
        None => Ok(()),
        Some(s) => {
            let reason = match s.reason {
                SkipReason::NoData => format!("{reference} has no data"),
                SkipReason::InsufficientBars { bars } => format!(
                    "{reference} has {bars} bars, {} needed to warm up",
                    bt_config.required_bars()
                ),
            };
            Err(RotatorError::invalid("universe", "reference_symbol", reason))
        }
    }
}

fn print_skipped(skipped: &[SkippedSymbol]) {
    for skipped in skipped {
        match skipped.reason {
            SkipReason::NoData => eprintln!("  skipped {}: no data", skipped.symbol),
            SkipReason::InsufficientBars { bars } => {
                eprintln!("  skipped {}: only {} bars", skipped.symbol, bars)
            }
        }
    }
}

fn print_summary(result: &BacktestResult, metrics: &Metrics) {
    eprintln!("\n=== Results ===");
    eprintln!("Trading Days:     {}", metrics.trading_days);
    eprintln!("Final Value:      {:.2}", result.final_value);
    eprintln!("Final Cash:       {:.2}", result.final_cash);
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", metrics.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!(
        "Max Drawdown:     -{:.1}% ({} days)",
        metrics.max_drawdown * 100.0,
        metrics.max_drawdown_duration
    );
    eprintln!("Rebalances:       {}", metrics.cycle_count);
    eprintln!("Fills:            {}", metrics.fill_count);
    if result.rollbacks > 0 {
        eprintln!("Rolled Back:      {}", result.rollbacks);
    }
    if result.open_orders > 0 {
        eprintln!("Unfilled Orders:  {}", result.open_orders);
    }

    if !result.final_holdings.is_empty() {
        eprintln!("\n=== Holdings ===");
        for position in &result.final_holdings {
            eprintln!("  {}: {} shares", position.symbol, position.shares);
        }
    }
}

pub fn run_dry_run(config_path: &Path) -> ExitCode {
    let prepared = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };
    eprintln!("Config validated successfully");

    let mut bt_config = prepared.config;
    let validation = match load_universe(&prepared.data_port, &mut bt_config, prepared.symbols) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let names: Vec<&str> = validation.universe.symbols().iter().map(Symbol::as_str).collect();
    eprintln!("\nUniverse ({}): {}", names.len(), names.join(", "));
    eprintln!("\nDry run complete: configuration and data are usable");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let checked = validate_config(&adapter).and_then(|()| {
        Ok((
            build_backtest_config(&adapter)?,
            resolve_symbols(&adapter, &config_dir(config_path))?,
        ))
    });
    let (bt_config, symbols) = match checked {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let rebalance = &bt_config.rebalance;
    eprintln!("\nBacktest:");
    eprintln!("  period:         {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("  starting cash:  {:.2}", bt_config.starting_cash);
    eprintln!("  commission:     {}", bt_config.commission_rate);
    eprintln!("\nStrategy:");
    eprintln!("  hold count:     {}", rebalance.hold_count);
    let trend = IndicatorType::Sma(bt_config.trend_window);
    let momentum = IndicatorType::Roc(bt_config.momentum_window);
    eprintln!("  trend:          {}", trend);
    eprintln!("  momentum:       {}", momentum);
    eprintln!("  warm-up:        {} bars", bt_config.required_bars());
    eprintln!("  safety margin:  {}", rebalance.safety_margin);
    eprintln!("  zero shares:    {:?}", rebalance.zero_share_policy);

    let names: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
    eprintln!("\nUniverse ({}): {}", names.len(), names.join(", "));

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, symbol: Option<&str>, all: bool) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let base = config_dir(config_path);
    let adapter = CsvAdapter::new(data_dir(&config, &base));

    let symbols = match (symbol, all) {
        (Some(s), _) => Ok(vec![Symbol::new(s)]),
        (None, true) => adapter.list_symbols(),
        (None, false) => resolve_symbols(&config, &base),
    };
    let symbols = match symbols {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for s in &symbols {
        match adapter.data_range(s) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{}: {} bars, {} to {}", s, count, min_date, max_date);
            }
            Ok(None) => {
                eprintln!("{}: no data found", s);
            }
            Err(e) => {
                eprintln!("error querying {}: {}", s, e);
            }
        }
    }
    ExitCode::SUCCESS
}
