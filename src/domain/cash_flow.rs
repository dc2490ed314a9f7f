//! Dated cash flows and the transaction sign rule.

use chrono::NaiveDate;

/// A single dated amount in the holder's base currency.
///
/// Negative amounts are capital committed (purchases), positive amounts are
/// capital returned (sale proceeds or the current value of an open position).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashFlow {
    amount: f64,
    when: NaiveDate,
}

impl CashFlow {
    pub fn new(amount: f64, when: NaiveDate) -> Self {
        Self { amount, when }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn when(&self) -> NaiveDate {
        self.when
    }

    pub fn is_outflow(&self) -> bool {
        self.amount < 0.0
    }

    pub fn is_inflow(&self) -> bool {
        self.amount > 0.0
    }
}

/// Direction of a source transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Buy,
    /// Anything that is not a recognised buy label: sells, bonus credits,
    /// and unknown strings alike.
    Other,
}

impl TransactionKind {
    /// Classifies a raw type string. Matching ignores ASCII case but not
    /// whitespace, so `buy`, `BUY` and `b` are buys under the default labels.
    pub fn classify<S: AsRef<str>>(raw: &str, buy_labels: &[S]) -> Self {
        if buy_labels
            .iter()
            .any(|label| label.as_ref().eq_ignore_ascii_case(raw))
        {
            TransactionKind::Buy
        } else {
            TransactionKind::Other
        }
    }

    /// Signed amount for `quantity` units at `price`.
    pub fn signed_amount(self, quantity: i64, price: f64) -> f64 {
        let gross = quantity as f64 * price;
        match self {
            TransactionKind::Buy => -gross,
            TransactionKind::Other => gross,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn accessors_and_direction() {
        let buy = CashFlow::new(-250.0, date(2022, 3, 1));
        assert_eq!(buy.amount(), -250.0);
        assert_eq!(buy.when(), date(2022, 3, 1));
        assert!(buy.is_outflow());
        assert!(!buy.is_inflow());

        let zero = CashFlow::new(0.0, date(2022, 3, 1));
        assert!(!zero.is_outflow());
        assert!(!zero.is_inflow());
    }

    #[test]
    fn buy_label_is_an_outflow() {
        let kind = TransactionKind::classify("Buy", &["Buy"]);
        assert_eq!(kind, TransactionKind::Buy);
        assert_eq!(kind.signed_amount(10, 12.5), -125.0);
    }

    #[test]
    fn sell_is_an_inflow() {
        let kind = TransactionKind::classify("Sell", &["Buy"]);
        assert_eq!(kind, TransactionKind::Other);
        assert_eq!(kind.signed_amount(10, 12.5), 125.0);
    }

    #[test]
    fn buy_matching_ignores_case() {
        let labels = ["Buy", "B"];
        for raw in ["Buy", "buy", "BUY", "b", "B"] {
            let kind = TransactionKind::classify(raw, &labels);
            assert_eq!(kind, TransactionKind::Buy, "type {raw:?}");
            assert!(kind.signed_amount(4, 50.0) < 0.0);
        }
    }

    #[test]
    fn unrecognized_type_falls_through_to_inflow() {
        for raw in ["Sell", "Bonus", "Buyback", " Buy", "S", ""] {
            let kind = TransactionKind::classify(raw, &["Buy", "B"]);
            assert_eq!(kind, TransactionKind::Other, "type {raw:?}");
            assert!(kind.signed_amount(4, 50.0) > 0.0);
        }
    }

    #[test]
    fn extra_buy_labels_are_honoured() {
        let labels = vec!["Buy".to_string(), "B".to_string()];
        assert_eq!(TransactionKind::classify("B", &labels), TransactionKind::Buy);
        assert_eq!(TransactionKind::classify("S", &labels), TransactionKind::Other);
    }
}
