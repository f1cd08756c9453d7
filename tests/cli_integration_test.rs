//! CLI integration tests for config building and the backtest pipeline.
//!
//! Tests cover:
//! - Config parsing (build_backtest_config) and validation from INI text
//! - Symbol resolution: inline list, symbols file, exclusions
//! - Data directory resolution relative to the config file
//! - Full pipeline with MockDataPort and with CSV files in a temp dir

mod common;

use common::*;
use rotator::adapters::csv_adapter::CsvAdapter;
use rotator::adapters::file_config_adapter::FileConfigAdapter;
use rotator::cli;
use rotator::domain::error::RotatorError;
use rotator::domain::rebalancer::ZeroSharePolicy;
use std::fs;
use std::io::Write;
use std::path::Path;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn config(content: &str) -> FileConfigAdapter {
    FileConfigAdapter::from_string(content).unwrap()
}

const VALID_INI: &str = r#"
[backtest]
start_date = 2010-01-01
end_date = 2020-01-01
starting_cash = 50000.0
commission_rate = 0.001
risk_free_rate = 0.02
data_dir = prices

[universe]
symbols = aapl, MSFT, XOM, TIE, WPI
exclude = TIE,WPI
reference_symbol = msft

[strategy]
hold_count = 3
trend_window = 150
momentum_window = 200
safety_margin = 0.95
zero_share_policy = consume
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_backtest_config_reads_all_sections() {
        let c = config(VALID_INI);
        assert!(cli::validate_config(&c).is_ok());

        let bt = cli::build_backtest_config(&c).unwrap();
        assert_eq!(bt.start_date, date(2010, 1, 1));
        assert_eq!(bt.end_date, date(2020, 1, 1));
        assert_eq!(bt.starting_cash, 50_000.0);
        assert_eq!(bt.commission_rate, 0.001);
        assert_eq!(bt.risk_free_rate, 0.02);
        assert_eq!(bt.trend_window, 150);
        assert_eq!(bt.momentum_window, 200);
        assert_eq!(bt.rebalance.hold_count, 3);
        assert_eq!(bt.rebalance.safety_margin, 0.95);
        assert_eq!(bt.rebalance.zero_share_policy, ZeroSharePolicy::ConsumeSlot);
        assert_eq!(bt.rebalance.reference_symbol, Some(Symbol::new("MSFT")));
    }

    #[test]
    fn defaults_apply_for_optional_keys() {
        let c = config(
            "[backtest]\nstart_date = 2010-01-01\nend_date = 2020-01-01\n\n[universe]\nsymbols = A,B\n",
        );
        assert!(cli::validate_config(&c).is_ok());

        let bt = cli::build_backtest_config(&c).unwrap();
        assert_eq!(bt.starting_cash, 100_000.0);
        assert_eq!(bt.commission_rate, 0.0);
        assert_eq!(bt.trend_window, 200);
        assert_eq!(bt.momentum_window, 252);
        assert_eq!(bt.rebalance.hold_count, 6);
        assert_eq!(bt.rebalance.safety_margin, 0.98);
        assert_eq!(bt.rebalance.zero_share_policy, ZeroSharePolicy::SkipCandidate);
        assert_eq!(bt.rebalance.reference_symbol, None);
    }

    #[test]
    fn missing_dates_are_reported() {
        let c = config("[universe]\nsymbols = A\n");
        let err = cli::validate_config(&c).unwrap_err();
        assert!(matches!(err, RotatorError::ConfigMissing { ref key, .. } if key == "start_date"));
    }

    #[test]
    fn missing_universe_is_reported() {
        let c = config("[backtest]\nstart_date = 2010-01-01\nend_date = 2020-01-01\n");
        let err = cli::validate_config(&c).unwrap_err();
        assert!(matches!(err, RotatorError::ConfigMissing { ref section, .. } if section == "universe"));
    }

    #[test]
    fn non_positive_window_rejected_when_building() {
        let c = config("[backtest]\nstart_date = 2010-01-01\nend_date = 2020-01-01\n[strategy]\ntrend_window = 0\n");
        let err = cli::build_backtest_config(&c).unwrap_err();
        assert!(matches!(err, RotatorError::ConfigInvalid { ref key, .. } if key == "trend_window"));
    }

    #[test]
    fn load_config_from_file() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(file.path()).ok().unwrap();
        assert!(cli::validate_config(&adapter).is_ok());
    }

    #[test]
    fn load_config_missing_file_fails() {
        assert!(cli::load_config(Path::new("/nonexistent/rotator.ini")).is_err());
    }
}

mod symbol_resolution {
    use super::*;

    #[test]
    fn inline_symbols_with_exclusions() {
        let c = config(VALID_INI);
        let symbols = cli::resolve_symbols(&c, Path::new(".")).unwrap();
        assert_eq!(
            symbols,
            vec![Symbol::new("AAPL"), Symbol::new("MSFT"), Symbol::new("XOM")]
        );
    }

    #[test]
    fn duplicate_inline_symbol_is_a_universe_error() {
        let c = config("[universe]\nsymbols = A,B,a\n");
        let err = cli::resolve_symbols(&c, Path::new(".")).unwrap_err();
        assert!(matches!(err, RotatorError::Universe(_)));
    }

    #[test]
    fn symbols_file_relative_to_base() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("tickers.txt"), "# large caps\nAAPL\nmsft\n\nBAD\n").unwrap();
        let c = config("[universe]\nsymbols_file = tickers.txt\nexclude = bad\n");

        let symbols = cli::resolve_symbols(&c, dir.path()).unwrap();
        assert_eq!(symbols, vec![Symbol::new("AAPL"), Symbol::new("MSFT")]);
    }

    #[test]
    fn unreadable_symbols_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let c = config("[universe]\nsymbols_file = nope.txt\n");
        let err = cli::resolve_symbols(&c, dir.path()).unwrap_err();
        assert!(matches!(err, RotatorError::ConfigInvalid { ref key, .. } if key == "symbols_file"));
    }

    #[test]
    fn data_dir_resolution() {
        let c = config(VALID_INI);
        assert_eq!(cli::data_dir(&c, Path::new("/etc/rotator")), Path::new("/etc/rotator/prices"));

        let c = config("[backtest]\ndata_dir = /srv/prices\n");
        assert_eq!(cli::data_dir(&c, Path::new("/etc/rotator")), Path::new("/srv/prices"));

        let c = config("[backtest]\n");
        assert_eq!(cli::data_dir(&c, Path::new("base")), Path::new("base/data"));
    }
}

mod pipeline {
    use super::*;

    fn short_config() -> rotator::domain::backtest::BacktestConfig {
        let c = config(
            r#"
[backtest]
start_date = 2024-01-01
end_date = 2024-04-30

[universe]
symbols = UP,FLAT

[strategy]
hold_count = 1
trend_window = 5
momentum_window = 10
"#,
        );
        cli::build_backtest_config(&c).unwrap()
    }

    #[test]
    fn pipeline_with_mock_data_port() {
        let port = MockDataPort::new()
            .with_bars("UP", generate_bars("UP", "2024-01-01", 121, 20.0, 0.25))
            .with_bars("FLAT", generate_bars("FLAT", "2024-01-01", 121, 30.0, 0.0));

        let result = cli::run_backtest_pipeline(
            &port,
            &short_config(),
            vec![Symbol::new("UP"), Symbol::new("FLAT")],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn pipeline_fails_when_every_symbol_is_skipped() {
        let port = MockDataPort::new()
            .with_bars("UP", generate_bars("UP", "2024-01-01", 5, 20.0, 0.25));

        let err = cli::run_backtest_pipeline(&port, &short_config(), vec![Symbol::new("UP")])
            .unwrap_err();
        assert!(matches!(err, RotatorError::InsufficientData { .. }));
    }

    #[test]
    fn pipeline_rejects_skipped_reference_symbol() {
        let port = MockDataPort::new()
            .with_bars("UP", generate_bars("UP", "2024-01-01", 121, 20.0, 0.25));
        let mut bt = short_config();
        bt.rebalance.reference_symbol = Some(Symbol::new("FLAT"));

        let err = cli::run_backtest_pipeline(&port, &bt, vec![Symbol::new("UP"), Symbol::new("FLAT")])
            .unwrap_err();
        assert!(matches!(err, RotatorError::ConfigInvalid { ref key, .. } if key == "reference_symbol"));
    }

    #[test]
    fn default_reference_without_enough_history_is_rejected() {
        let c = config(
            r#"
[backtest]
start_date = 2024-01-01
end_date = 2024-04-30

[universe]
symbols = REF,UP

[strategy]
hold_count = 1
trend_window = 60
momentum_window = 60
"#,
        );
        let bt = cli::build_backtest_config(&c).unwrap();
        assert_eq!(bt.rebalance.reference_symbol, None);
        assert_eq!(bt.required_bars(), 61);

        let port = MockDataPort::new()
            .with_bars("REF", generate_bars("REF", "2024-01-01", 40, 100.0, 0.5))
            .with_bars("UP", generate_bars("UP", "2024-01-01", 121, 20.0, 0.25));

        let err = cli::run_backtest_pipeline(&port, &bt, vec![Symbol::new("REF"), Symbol::new("UP")])
            .unwrap_err();
        assert!(matches!(
            err,
            RotatorError::ConfigInvalid { ref key, ref reason, .. }
                if key == "reference_symbol" && reason.contains("40 bars")
        ));
    }

    #[test]
    fn non_reference_symbol_without_enough_history_is_skipped() {
        let mut bt = short_config();
        bt.trend_window = 60;
        bt.momentum_window = 60;

        let port = MockDataPort::new()
            .with_bars("UP", generate_bars("UP", "2024-01-01", 121, 20.0, 0.25))
            .with_bars("FLAT", generate_bars("FLAT", "2024-01-01", 40, 30.0, 0.0));

        let result = cli::run_backtest_pipeline(&port, &bt, vec![Symbol::new("UP"), Symbol::new("FLAT")]);
        assert!(result.is_ok());
    }

    #[test]
    fn pipeline_over_csv_files() {
        let dir = tempfile::TempDir::new().unwrap();
        for (symbol, start, step) in [("UP", 20.0, 0.25), ("FLAT", 30.0, 0.0)] {
            let bars = generate_bars(symbol, "2024-01-01", 121, start, step);
            fs::write(dir.path().join(format!("{symbol}.csv")), bars_to_csv(&bars)).unwrap();
        }
        let port = CsvAdapter::new(dir.path());

        let result = cli::run_backtest_pipeline(
            &port,
            &short_config(),
            vec![Symbol::new("UP"), Symbol::new("FLAT"), Symbol::new("GONE")],
        );
        assert!(result.is_ok());
    }
}
