//! CSV holding sources: broker transaction exports and holdings summaries.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::cash_flow::TransactionKind;
use crate::domain::error::ScripxirrError;
use crate::domain::holding::HoldingBook;
use crate::domain::run_config::{TransactionColumns, ValuationColumns};
use crate::ports::holding_source::HoldingSource;

/// One cash flow per transaction row; never touches quantities.
pub struct CsvTransactionSource {
    path: PathBuf,
    columns: TransactionColumns,
    date_format: String,
    buy_labels: Vec<String>,
}

impl CsvTransactionSource {
    pub fn new(
        path: PathBuf,
        columns: TransactionColumns,
        date_format: impl Into<String>,
        buy_labels: Vec<String>,
    ) -> Self {
        Self {
            path,
            columns,
            date_format: date_format.into(),
            buy_labels,
        }
    }
}

impl HoldingSource for CsvTransactionSource {
    fn load_into(&self, book: &mut HoldingBook) -> Result<(), ScripxirrError> {
        let file = self.path.display().to_string();
        let mut rdr = open_reader(&self.path)?;
        let cols = &self.columns;

        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(&file, &e))?;
            let line = line_of(&record);
            let row = Row {
                record: &record,
                file: &file,
                line,
            };

            let code = row.text(cols.code, "code")?;
            let name = row.text(cols.name, "name")?;
            let kind = TransactionKind::classify(row.text(cols.kind, "type")?, &self.buy_labels);
            let quantity: i64 = row.parse(cols.quantity, "quantity")?;
            let price: f64 = row.parse(cols.price, "price")?;
            let raw_date = row.text(cols.date, "date")?;
            let when = NaiveDate::parse_from_str(raw_date, &self.date_format).map_err(|e| {
                row.error(format!(
                    "invalid date {raw_date:?} (expected {}): {e}",
                    self.date_format
                ))
            })?;

            book.entry(code, name)
                .push_cash_flow(kind.signed_amount(quantity, price), when);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("transactions {}", self.path.display())
    }
}

/// Sets each holding's current quantity and, for open positions with a
/// market value, adds that value as an inflow dated `as_of`.
pub struct CsvValuationSource {
    path: PathBuf,
    columns: ValuationColumns,
    as_of: NaiveDate,
}

impl CsvValuationSource {
    pub fn new(path: PathBuf, columns: ValuationColumns, as_of: NaiveDate) -> Self {
        Self {
            path,
            columns,
            as_of,
        }
    }
}

impl HoldingSource for CsvValuationSource {
    fn load_into(&self, book: &mut HoldingBook) -> Result<(), ScripxirrError> {
        let file = self.path.display().to_string();
        let mut rdr = open_reader(&self.path)?;
        let cols = &self.columns;

        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(&file, &e))?;
            let line = line_of(&record);
            let row = Row {
                record: &record,
                file: &file,
                line,
            };

            let code = row.text(cols.code, "code")?;
            let name = row.text(cols.name, "name")?;
            let quantity: i64 = row.parse(cols.quantity, "holding quantity")?;
            let market_value: f64 = row.parse(cols.market_value, "market value")?;

            let holding = book.entry(code, name);
            holding.set_quantity(quantity);
            if quantity > 0 && market_value > 0.0 {
                holding.push_cash_flow(market_value, self.as_of);
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("valuations {}", self.path.display())
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, ScripxirrError> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ScripxirrError::Input {
            file: path.display().to_string(),
            line: 0,
            reason: format!("failed to open: {e}"),
        })
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

fn csv_error(file: &str, e: &csv::Error) -> ScripxirrError {
    ScripxirrError::Input {
        file: file.to_string(),
        line: e.position().map_or(0, |p| p.line()),
        reason: format!("CSV parse error: {e}"),
    }
}

struct Row<'a> {
    record: &'a StringRecord,
    file: &'a str,
    line: u64,
}

impl<'a> Row<'a> {
    fn text(&self, index: usize, column: &str) -> Result<&'a str, ScripxirrError> {
        self.record
            .get(index)
            .ok_or_else(|| self.error(format!("missing {column} column (index {index})")))
    }

    fn parse<T>(&self, index: usize, column: &str) -> Result<T, ScripxirrError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.text(index, column)?;
        raw.parse()
            .map_err(|e| self.error(format!("invalid {column} value {raw:?}: {e}")))
    }

    fn error(&self, reason: String) -> ScripxirrError {
        ScripxirrError::Input {
            file: self.file.to_string(),
            line: self.line,
            reason,
        }
    }
}
