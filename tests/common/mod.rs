#![allow(dead_code)]

use chrono::NaiveDate;
use scripxirr::domain::cash_flow::CashFlow;
use scripxirr::domain::error::ScripxirrError;
use scripxirr::domain::holding::HoldingBook;
use scripxirr::domain::summary::Report;
use scripxirr::ports::holding_source::HoldingSource;
use scripxirr::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::io::Write;

/// In-memory source: (code, name, amount, date) rows plus optional quantities.
pub struct MockSource {
    pub flows: Vec<(String, String, f64, NaiveDate)>,
    pub quantities: Vec<(String, i64)>,
    pub error: Option<String>,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            flows: Vec::new(),
            quantities: Vec::new(),
            error: None,
        }
    }

    pub fn with_flow(mut self, code: &str, amount: f64, when: NaiveDate) -> Self {
        self.flows
            .push((code.to_string(), format!("{code} Ltd"), amount, when));
        self
    }

    pub fn with_quantity(mut self, code: &str, quantity: i64) -> Self {
        self.quantities.push((code.to_string(), quantity));
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl HoldingSource for MockSource {
    fn load_into(&self, book: &mut HoldingBook) -> Result<(), ScripxirrError> {
        if let Some(reason) = &self.error {
            return Err(ScripxirrError::Input {
                file: "mock".into(),
                line: 0,
                reason: reason.clone(),
            });
        }
        for (code, name, amount, when) in &self.flows {
            book.entry(code, name).push_cash_flow(*amount, *when);
        }
        for (code, quantity) in &self.quantities {
            book.entry(code, code).set_quantity(*quantity);
        }
        Ok(())
    }
}

/// Report port that keeps what it was given.
pub struct RecordingReportPort {
    pub written: RefCell<Vec<(Report, String)>>,
}

impl RecordingReportPort {
    pub fn new() -> Self {
        Self {
            written: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for RecordingReportPort {
    fn write(&self, report: &Report, output_path: &str) -> Result<(), ScripxirrError> {
        self.written
            .borrow_mut()
            .push((report.clone(), output_path.to_string()));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn flow(amount: f64, y: i32, m: u32, d: u32) -> CashFlow {
    CashFlow::new(amount, date(y, m, d))
}

pub fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub const TX_HEADER: &str =
    "Code,Name,Exchange,Type,Qty,Price,Value,Brokerage,Tax,Net,Order,Trade,Date\n";

pub const SUMMARY_HEADER: &str = "Code,Name,ISIN,Qty,AvgCost,Cost,LTP,Change,Value\n";

pub fn tx_row(code: &str, name: &str, kind: &str, qty: i64, price: f64, date: &str) -> String {
    format!("{code},{name},NSE,{kind},{qty},{price},0,0,0,0,1,1,{date}\n")
}
