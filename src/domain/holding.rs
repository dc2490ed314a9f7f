//! Holdings and the book that collects them during a run.
//!
//! A [`Holding`] is identified by its [`HoldingCode`] alone. Equality and
//! hashing go through [`Holding::key`], so the display name can never take
//! part in identity.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;

use super::cash_flow::CashFlow;

/// Identity key of a holding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HoldingCode(String);

impl HoldingCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HoldingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HoldingCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

#[derive(Debug, Clone)]
pub struct Holding {
    code: HoldingCode,
    name: String,
    quantity: i64,
    cash_flows: Vec<CashFlow>,
}

impl Holding {
    pub fn new(code: impl Into<HoldingCode>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            quantity: 0,
            cash_flows: Vec::new(),
        }
    }

    /// The only field that participates in equality and hashing.
    pub fn key(&self) -> &HoldingCode {
        &self.code
    }

    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn add_quantity(&mut self, units: i64) {
        self.quantity += units;
    }

    pub fn reduce_quantity(&mut self, units: i64) {
        self.quantity -= units;
    }

    pub fn set_quantity(&mut self, units: i64) {
        self.quantity = units;
    }

    /// Cash flows in insertion order.
    pub fn cash_flows(&self) -> &[CashFlow] {
        &self.cash_flows
    }

    pub fn push_cash_flow(&mut self, amount: f64, when: NaiveDate) {
        self.cash_flows.push(CashFlow::new(amount, when));
    }

    pub fn has_outflow(&self) -> bool {
        self.cash_flows.iter().any(CashFlow::is_outflow)
    }
}

impl PartialEq for Holding {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Holding {}

impl Hash for Holding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Holdings keyed by code, iterated in the order codes were first seen.
#[derive(Debug, Clone, Default)]
pub struct HoldingBook {
    holdings: Vec<Holding>,
    index: HashMap<HoldingCode, usize>,
}

impl HoldingBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the holding for `code`, creating it with `name` on first sight.
    /// A later, different `name` for a known code is ignored.
    pub fn entry(&mut self, code: &str, name: &str) -> &mut Holding {
        let key = HoldingCode::new(code);
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.holdings.len();
                self.holdings.push(Holding::new(key.clone(), name));
                self.index.insert(key, idx);
                idx
            }
        };
        &mut self.holdings[idx]
    }

    pub fn get(&self, code: &str) -> Option<&Holding> {
        self.index
            .get(&HoldingCode::new(code))
            .map(|&idx| &self.holdings[idx])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(&HoldingCode::new(code))
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn iter(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn identity_ignores_name() {
        let a = Holding::new("INFY", "Infosys");
        let b = Holding::new("INFY", "Infosys Ltd");
        let c = Holding::new("TCS", "Infosys");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Holding> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn identity_ignores_flows_and_quantity() {
        let mut a = Holding::new("INFY", "Infosys");
        a.push_cash_flow(-100.0, date(2022, 1, 1));
        a.set_quantity(10);
        let b = Holding::new("INFY", "Infosys");
        assert_eq!(a, b);
    }

    #[test]
    fn quantity_adjustments() {
        let mut h = Holding::new("INFY", "Infosys");
        assert_eq!(h.quantity(), 0);
        h.add_quantity(15);
        h.reduce_quantity(5);
        assert_eq!(h.quantity(), 10);
        h.set_quantity(3);
        assert_eq!(h.quantity(), 3);
    }

    #[test]
    fn cash_flows_keep_insertion_order() {
        let mut h = Holding::new("INFY", "Infosys");
        h.push_cash_flow(500.0, date(2023, 1, 1));
        h.push_cash_flow(-400.0, date(2022, 1, 1));
        let dates: Vec<_> = h.cash_flows().iter().map(|cf| cf.when()).collect();
        assert_eq!(dates, vec![date(2023, 1, 1), date(2022, 1, 1)]);
        assert!(h.has_outflow());
    }

    #[test]
    fn book_creates_once_and_keeps_first_name() {
        let mut book = HoldingBook::new();
        book.entry("INFY", "Infosys").push_cash_flow(-1.0, date(2022, 1, 1));
        book.entry("TCS", "Tata").push_cash_flow(-2.0, date(2022, 1, 1));
        book.entry("INFY", "Renamed").push_cash_flow(3.0, date(2022, 2, 1));

        assert_eq!(book.len(), 2);
        let infy = book.get("INFY").unwrap();
        assert_eq!(infy.name(), "Infosys");
        assert_eq!(infy.cash_flows().len(), 2);
        assert!(book.contains("TCS"));
        assert!(!book.contains("WIPRO"));
    }

    #[test]
    fn book_iterates_in_first_seen_order() {
        let mut book = HoldingBook::new();
        for code in ["ZEE", "ACC", "MRF", "ACC"] {
            book.entry(code, code);
        }
        let codes: Vec<_> = book.iter().map(|h| h.code()).collect();
        assert_eq!(codes, vec!["ZEE", "ACC", "MRF"]);
    }
}
