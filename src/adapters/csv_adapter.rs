//! CSV file data adapter.
//!
//! One file per symbol, `{SYMBOL}.csv`, with a header row naming the
//! `date,open,high,low,close,volume` columns. Column order is taken from the
//! header; extra columns are ignored. A row whose close is not positive is
//! a data error.

use crate::domain::error::RotatorError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::symbol::Symbol;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn csv_path(&self, symbol: &Symbol) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_all(&self, symbol: &Symbol) -> Result<Vec<OhlcvBar>, RotatorError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Err(RotatorError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| RotatorError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        parse_bars(symbol, &content).map_err(|reason| RotatorError::Data {
            reason: format!("{}: {}", path.display(), reason),
        })
    }
}

/// Parse CSV text into bars sorted by date.
pub fn parse_bars(symbol: &Symbol, content: &str) -> Result<Vec<OhlcvBar>, String> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| format!("CSV header error: {}", e))?
        .clone();
    let mut index = [0usize; 6];
    for (slot, name) in index.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("missing {} column", name))?;
    }
    let [date_col, open_col, high_col, low_col, close_col, volume_col] = index;

    let mut bars = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| format!("CSV parse error: {}", e))?;
        let row = line + 2;

        let date_str = record.get(date_col).unwrap_or_default();
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| format!("row {}: invalid date '{}': {}", row, date_str, e))?;

        let price = |col: usize, name: &str| -> Result<f64, String> {
            record
                .get(col)
                .unwrap_or_default()
                .parse::<f64>()
                .map_err(|e| format!("row {}: invalid {} value: {}", row, name, e))
        };

        let close = price(close_col, "close")?;
        if !(close > 0.0) {
            return Err(format!("row {}: close must be positive, got {}", row, close));
        }

        bars.push(OhlcvBar {
            symbol: symbol.clone(),
            date,
            open: price(open_col, "open")?,
            high: price(high_col, "high")?,
            low: price(low_col, "low")?,
            close,
            volume: price(volume_col, "volume")? as i64,
        });
    }

    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    Ok(bars)
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &Symbol,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RotatorError> {
        let mut bars = self.read_all(symbol)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<Symbol>, RotatorError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| RotatorError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RotatorError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if let (true, Some(stem)) = (is_csv, path.file_stem()) {
                symbols.push(Symbol::new(&stem.to_string_lossy()));
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn data_range(
        &self,
        symbol: &Symbol,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RotatorError> {
        let bars = match self.read_all(symbol) {
            Ok(bars) => bars,
            Err(RotatorError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
