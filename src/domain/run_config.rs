//! Parameters of one report run.

use std::path::PathBuf;

use chrono::NaiveDate;

use super::aggregation::AggregationSettings;

pub const DEFAULT_DATE_FORMAT: &str = "%d-%b-%y";
pub const DEFAULT_BUY_LABELS: [&str; 2] = ["Buy", "B"];
pub const DEFAULT_FILE_PREFIX: &str = "XIRR_Results_";

/// Zero-based column positions in the transactions file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionColumns {
    pub code: usize,
    pub name: usize,
    pub kind: usize,
    pub quantity: usize,
    pub price: usize,
    pub date: usize,
}

impl Default for TransactionColumns {
    fn default() -> Self {
        Self {
            code: 0,
            name: 1,
            kind: 3,
            quantity: 4,
            price: 5,
            date: 12,
        }
    }
}

/// Zero-based column positions in the holdings-summary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuationColumns {
    pub code: usize,
    pub name: usize,
    pub quantity: usize,
    pub market_value: usize,
}

impl Default for ValuationColumns {
    fn default() -> Self {
        Self {
            code: 0,
            name: 1,
            quantity: 3,
            market_value: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub output_dir: PathBuf,
    pub file_prefix: String,
}

impl ReportSettings {
    /// `<output_dir>/<prefix><dd-mm-yyyy>.csv`
    pub fn output_path(&self, as_of: NaiveDate) -> PathBuf {
        self.output_dir
            .join(format!("{}{}.csv", self.file_prefix, as_of.format("%d-%m-%Y")))
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub transactions: Option<PathBuf>,
    pub valuations: Option<PathBuf>,
    pub date_format: String,
    pub buy_labels: Vec<String>,
    pub transaction_columns: TransactionColumns,
    pub valuation_columns: ValuationColumns,
    pub aggregation: AggregationSettings,
    pub report: ReportSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            transactions: None,
            valuations: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            buy_labels: DEFAULT_BUY_LABELS.iter().map(|s| s.to_string()).collect(),
            transaction_columns: TransactionColumns::default(),
            valuation_columns: ValuationColumns::default(),
            aggregation: AggregationSettings::default(),
            report: ReportSettings::default(),
        }
    }
}
