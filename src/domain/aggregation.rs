//! Per-holding and portfolio summary metrics.
//!
//! This is the one place where solver failures turn into undefined report
//! fields. A holding that cannot be summarised is skipped with a warning and
//! never stops the rest of the run.

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{info, warn};

use super::cash_flow::CashFlow;
use super::error::AggregationError;
use super::holding::{Holding, HoldingBook, HoldingCode};
use super::summary::{CalendarSpan, Report, SkippedHolding, SummaryRecord};
use super::xirr::{xirr_with, SolverConfig};

pub const PORTFOLIO_LABEL: &str = "Portfolio";

const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationSettings {
    /// Codes kept out of the portfolio-level flow set.
    pub exclude_codes: Vec<HoldingCode>,
    pub solver: SolverConfig,
}

/// Sum of all outflows, as a positive magnitude.
pub fn total_invested(flows: &[CashFlow]) -> f64 {
    flows
        .iter()
        .filter(|cf| cf.is_outflow())
        .fold(0.0, |acc, cf| acc - cf.amount())
}

/// Sum of all inflows (proceeds and current value).
pub fn total_recovered(flows: &[CashFlow]) -> f64 {
    flows
        .iter()
        .filter(|cf| cf.is_inflow())
        .fold(0.0, |acc, cf| acc + cf.amount())
}

pub fn profit_and_loss(flows: &[CashFlow]) -> f64 {
    total_recovered(flows) - total_invested(flows)
}

/// Days between the earliest and latest non-zero flow.
pub fn holding_period_days(flows: &[CashFlow]) -> Result<i64, AggregationError> {
    let mut dates = flows
        .iter()
        .filter(|cf| cf.amount() != 0.0)
        .map(CashFlow::when);
    let first = dates.next().ok_or_else(|| AggregationError::InsufficientData {
        what: "no non-zero cash flows to measure a holding period".into(),
    })?;
    let (earliest, latest) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Ok((latest - earliest).num_days())
}

/// Capital- and time-weighted contribution of one holding.
///
/// Undefined when the holding was never bought, when its rate cannot be
/// solved, or when there is no portfolio capital to weigh it against.
pub fn weighted_returns_score(
    holding: &Holding,
    portfolio_invested: f64,
    solver: &SolverConfig,
) -> Option<f64> {
    if !holding.has_outflow() {
        return None;
    }
    let flows = holding.cash_flows();
    let rate = xirr_with(flows, solver).ok()?;
    let days = holding_period_days(flows).ok()?;
    score(total_invested(flows), portfolio_invested, days, rate * 100.0)
}

fn score(invested: f64, portfolio_invested: f64, days: i64, rate_percent: f64) -> Option<f64> {
    if portfolio_invested <= 0.0 {
        return None;
    }
    Some(invested / portfolio_invested * 100.0 * (days as f64 / DAYS_PER_YEAR) * rate_percent)
}

/// All holdings' flows in book order, minus the excluded codes.
pub fn portfolio_flows<'a, I>(holdings: I, exclude: &[HoldingCode]) -> Vec<CashFlow>
where
    I: IntoIterator<Item = &'a Holding>,
{
    holdings
        .into_iter()
        .filter(|h| !exclude.contains(h.key()))
        .flat_map(|h| h.cash_flows().iter().copied())
        .collect()
}

pub fn summarize_portfolio(
    flows: &[CashFlow],
    as_of: NaiveDate,
    solver: &SolverConfig,
) -> SummaryRecord {
    let rate_percent = match xirr_with(flows, solver) {
        Ok(rate) => Some(rate * 100.0),
        Err(e) => {
            warn!(error = %e, "portfolio XIRR undefined");
            None
        }
    };
    let days = holding_period_days(flows).ok();
    let invested = total_invested(flows);
    let recovered = total_recovered(flows);

    SummaryRecord {
        code: PORTFOLIO_LABEL.to_string(),
        name: PORTFOLIO_LABEL.to_string(),
        rate_percent,
        transaction_count: flows.len(),
        holding_period_days: days,
        holding_period: days.map(|d| CalendarSpan::from_days(as_of, d)),
        quantity: None,
        total_invested: invested,
        total_recovered: recovered,
        profit_and_loss: recovered - invested,
        weighted_score: None,
    }
}

/// Summary of one holding. Only an all-zero flow list is an error; a solver
/// failure leaves the rate and score undefined.
pub fn summarize_holding(
    holding: &Holding,
    portfolio_invested: f64,
    as_of: NaiveDate,
    solver: &SolverConfig,
) -> Result<SummaryRecord, AggregationError> {
    let flows = holding.cash_flows();
    let days = holding_period_days(flows)?;
    let invested = total_invested(flows);
    let recovered = total_recovered(flows);

    let (rate_percent, weighted_score) = if holding.has_outflow() {
        match xirr_with(flows, solver) {
            Ok(rate) => {
                let pct = rate * 100.0;
                (Some(pct), score(invested, portfolio_invested, days, pct))
            }
            Err(e) => {
                warn!(code = holding.code(), name = holding.name(), error = %e, "XIRR undefined for holding");
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    Ok(SummaryRecord {
        code: holding.code().to_string(),
        name: holding.name().to_string(),
        rate_percent,
        transaction_count: flows.len(),
        holding_period_days: Some(days),
        holding_period: Some(CalendarSpan::from_days(as_of, days)),
        quantity: Some(holding.quantity()),
        total_invested: invested,
        total_recovered: recovered,
        profit_and_loss: recovered - invested,
        weighted_score,
    })
}

/// Full run: portfolio headline first, then every holding independently.
pub fn build_report(book: &HoldingBook, settings: &AggregationSettings, as_of: NaiveDate) -> Report {
    let flows = portfolio_flows(book.iter(), &settings.exclude_codes);
    let portfolio = summarize_portfolio(&flows, as_of, &settings.solver);
    let portfolio_invested = portfolio.total_invested;
    info!(
        holdings = book.len(),
        flows = flows.len(),
        invested = portfolio_invested,
        "portfolio summarised"
    );

    let outcomes: Vec<Result<SummaryRecord, SkippedHolding>> = book
        .holdings()
        .par_iter()
        .map(|holding| {
            summarize_holding(holding, portfolio_invested, as_of, &settings.solver).map_err(|e| {
                warn!(code = holding.code(), name = holding.name(), error = %e, "skipping holding");
                SkippedHolding {
                    code: holding.code().to_string(),
                    name: holding.name().to_string(),
                    reason: e.to_string(),
                }
            })
        })
        .collect();

    let mut holdings = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(record) => holdings.push(record),
            Err(skip) => skipped.push(skip),
        }
    }

    Report {
        as_of,
        portfolio,
        holdings,
        skipped,
    }
}
