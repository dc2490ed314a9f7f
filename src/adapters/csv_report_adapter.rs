//! CSV report adapter implementing ReportPort.

use std::fs;
use std::io;
use std::path::Path;

use crate::domain::error::ScripxirrError;
use crate::domain::summary::{Report, SummaryRecord};
use crate::ports::report_port::ReportPort;

pub const HEADER: [&str; 9] = [
    "Code",
    "Name",
    "XIRR%",
    "No. of transactions",
    "Total Holding period",
    "Currently held qty.",
    "Total invested sum",
    "Total P/L",
    "Weighted returns score (XIRR * holding period years * allocation)",
];

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    /// Writes the header and every record, portfolio first.
    pub fn render<W: io::Write>(report: &Report, out: W) -> Result<(), ScripxirrError> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(HEADER).map_err(report_error)?;
        for record in report.records() {
            wtr.write_record(row(record)).map_err(report_error)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &Report, output_path: &str) -> Result<(), ScripxirrError> {
        let path = Path::new(output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(path).map_err(|e| ScripxirrError::Report {
            reason: format!("failed to create {output_path}: {e}"),
        })?;
        Self::render(report, file)
    }
}

/// Report fields in column order. Undefined rates and scores print `NaN`.
pub fn row(record: &SummaryRecord) -> [String; 9] {
    [
        record.code.clone(),
        record.name.clone(),
        undefined_as_nan(record.rate_percent),
        record.transaction_count.to_string(),
        record
            .holding_period
            .map(|p| p.to_string())
            .unwrap_or_default(),
        record.quantity.map(|q| q.to_string()).unwrap_or_default(),
        record.total_invested.to_string(),
        record.profit_and_loss.to_string(),
        undefined_as_nan(record.weighted_score),
    ]
}

fn undefined_as_nan(value: Option<f64>) -> String {
    value.unwrap_or(f64::NAN).to_string()
}

fn report_error(e: csv::Error) -> ScripxirrError {
    ScripxirrError::Report {
        reason: format!("CSV write error: {e}"),
    }
}
