//! Report records produced by aggregation.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};

/// A day count expressed as years, months and days from an anchor date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarSpan {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl CalendarSpan {
    /// Calendar distance between `anchor` and `anchor + days`.
    ///
    /// Whole months are counted first; the remaining days are what is left
    /// after stepping `anchor` forward by those months.
    pub fn from_days(anchor: NaiveDate, days: i64) -> Self {
        let days = days.max(0);
        let end = anchor + chrono::Duration::days(days);

        let mut total_months =
            (end.year() - anchor.year()) * 12 + end.month() as i32 - anchor.month() as i32;
        if total_months > 0 && end.day() < anchor.day() {
            total_months -= 1;
        }
        let total_months = total_months.max(0) as u32;

        let stepped = anchor
            .checked_add_months(Months::new(total_months))
            .unwrap_or(end);
        let rest = (end - stepped).num_days().max(0) as u32;

        Self {
            years: total_months / 12,
            months: total_months % 12,
            days: rest,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }
}

impl fmt::Display for CalendarSpan {
    /// ISO-8601 period, e.g. `P1Y2M3D`; zero is `P0D`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("P0D");
        }
        f.write_str("P")?;
        if self.years > 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months > 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        Ok(())
    }
}

/// One reportable row: a holding, or the whole portfolio.
///
/// `None` marks a metric that could not be defined for this row.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    pub code: String,
    pub name: String,
    pub rate_percent: Option<f64>,
    pub transaction_count: usize,
    pub holding_period_days: Option<i64>,
    pub holding_period: Option<CalendarSpan>,
    pub quantity: Option<i64>,
    pub total_invested: f64,
    pub total_recovered: f64,
    pub profit_and_loss: f64,
    pub weighted_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedHolding {
    pub code: String,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub as_of: NaiveDate,
    pub portfolio: SummaryRecord,
    pub holdings: Vec<SummaryRecord>,
    pub skipped: Vec<SkippedHolding>,
}

impl Report {
    pub fn holding(&self, code: &str) -> Option<&SummaryRecord> {
        self.holdings.iter().find(|r| r.code == code)
    }

    /// Portfolio row first, then holdings.
    pub fn records(&self) -> impl Iterator<Item = &SummaryRecord> {
        std::iter::once(&self.portfolio).chain(self.holdings.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn zero_days_is_p0d() {
        let span = CalendarSpan::from_days(date(2024, 5, 10), 0);
        assert!(span.is_zero());
        assert_eq!(span.to_string(), "P0D");
    }

    #[test]
    fn one_calendar_year() {
        let span = CalendarSpan::from_days(date(2023, 1, 1), 365);
        assert_eq!(
            span,
            CalendarSpan {
                years: 1,
                months: 0,
                days: 0
            }
        );
        assert_eq!(span.to_string(), "P1Y");
    }

    #[test]
    fn mixed_components() {
        // 2023-01-15 + 430 days = 2024-03-20
        let span = CalendarSpan::from_days(date(2023, 1, 15), 430);
        assert_eq!(
            span,
            CalendarSpan {
                years: 1,
                months: 2,
                days: 5
            }
        );
        assert_eq!(span.to_string(), "P1Y2M5D");
    }

    #[test]
    fn end_day_before_anchor_day_borrows_a_month() {
        // 2024-01-31 + 30 days = 2024-03-01
        let span = CalendarSpan::from_days(date(2024, 1, 31), 30);
        assert_eq!(
            span,
            CalendarSpan {
                years: 0,
                months: 1,
                days: 1
            }
        );
    }

    #[test]
    fn days_only() {
        let span = CalendarSpan::from_days(date(2024, 6, 1), 12);
        assert_eq!(span.to_string(), "P12D");
    }

    #[test]
    fn negative_days_clamp_to_zero() {
        assert!(CalendarSpan::from_days(date(2024, 6, 1), -5).is_zero());
    }

    fn record(code: &str) -> SummaryRecord {
        SummaryRecord {
            code: code.into(),
            name: code.into(),
            rate_percent: None,
            transaction_count: 0,
            holding_period_days: None,
            holding_period: None,
            quantity: None,
            total_invested: 0.0,
            total_recovered: 0.0,
            profit_and_loss: 0.0,
            weighted_score: None,
        }
    }

    #[test]
    fn report_lists_portfolio_first() {
        let report = Report {
            as_of: date(2024, 1, 1),
            portfolio: record("Portfolio"),
            holdings: vec![record("A"), record("B")],
            skipped: vec![],
        };
        let codes: Vec<_> = report.records().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["Portfolio", "A", "B"]);
        assert!(report.holding("B").is_some());
        assert!(report.holding("C").is_none());
    }
}
