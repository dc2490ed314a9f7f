//! Extended internal rate of return.
//!
//! Solves `NPV(r) = Σ amount_i / (1 + r)^(days_i / 365) = 0` where `days_i`
//! counts from the earliest date in the set (Actual/365). Newton–Raphson runs
//! first; if it fails to settle, a bracketed bisection over a wide rate range
//! takes over.

use chrono::NaiveDate;
use tracing::debug;

use super::cash_flow::CashFlow;
use super::error::XirrError;

const DAYS_PER_YEAR: f64 = 365.0;

/// Solver knobs. The defaults are what every run uses unless the config says
/// otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub initial_guess: f64,
    pub max_iterations: usize,
    /// NPV tolerance relative to the total absolute cash-flow magnitude.
    pub npv_tolerance: f64,
    /// Absolute floor under the NPV tolerance.
    pub npv_tolerance_floor: f64,
    pub step_tolerance: f64,
    pub bracket_low: f64,
    pub bracket_high: f64,
    pub max_bracket_expansions: usize,
    pub bisection_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            initial_guess: 0.1,
            max_iterations: 100,
            npv_tolerance: 1e-6,
            npv_tolerance_floor: 1e-6,
            step_tolerance: 1e-7,
            bracket_low: -0.9999,
            bracket_high: 100.0,
            max_bracket_expansions: 8,
            bisection_iterations: 300,
        }
    }
}

/// Flows reduced to (amount, years since the earliest date).
struct Schedule {
    terms: Vec<(f64, f64)>,
    magnitude: f64,
}

impl Schedule {
    fn new(flows: &[CashFlow]) -> Option<Self> {
        let base = flows.iter().map(CashFlow::when).min()?;
        let terms = flows
            .iter()
            .map(|cf| (cf.amount(), year_fraction(base, cf.when())))
            .collect();
        let magnitude = flows.iter().map(|cf| cf.amount().abs()).sum();
        Some(Self { terms, magnitude })
    }

    fn npv(&self, rate: f64) -> f64 {
        let growth = 1.0 + rate;
        self.terms
            .iter()
            .map(|&(amount, years)| amount / growth.powf(years))
            .sum()
    }

    fn npv_derivative(&self, rate: f64) -> f64 {
        let growth = 1.0 + rate;
        self.terms
            .iter()
            .map(|&(amount, years)| -amount * years / growth.powf(years + 1.0))
            .sum()
    }

    fn tolerance(&self, config: &SolverConfig) -> f64 {
        (config.npv_tolerance * self.magnitude).max(config.npv_tolerance_floor)
    }
}

fn year_fraction(base: NaiveDate, when: NaiveDate) -> f64 {
    (when - base).num_days() as f64 / DAYS_PER_YEAR
}

/// Net present value of `flows` at `rate`, discounted to the earliest date.
/// An empty slice is worth zero.
pub fn npv(flows: &[CashFlow], rate: f64) -> f64 {
    Schedule::new(flows).map_or(0.0, |s| s.npv(rate))
}

/// Analytic `dNPV/dr` at `rate`.
pub fn npv_derivative(flows: &[CashFlow], rate: f64) -> f64 {
    Schedule::new(flows).map_or(0.0, |s| s.npv_derivative(rate))
}

/// XIRR with the default [`SolverConfig`].
pub fn xirr(flows: &[CashFlow]) -> Result<f64, XirrError> {
    xirr_with(flows, &SolverConfig::default())
}

/// Annualised rate (not a percentage) zeroing the NPV of `flows`.
pub fn xirr_with(flows: &[CashFlow], config: &SolverConfig) -> Result<f64, XirrError> {
    let has_outflow = flows.iter().any(CashFlow::is_outflow);
    let has_inflow = flows.iter().any(CashFlow::is_inflow);
    if !has_outflow || !has_inflow {
        return Err(XirrError::NoRoot);
    }
    let schedule = Schedule::new(flows).ok_or(XirrError::NoRoot)?;
    let tolerance = schedule.tolerance(config);

    let newton_iterations = match newton(&schedule, config, tolerance) {
        Ok(rate) => return Ok(rate),
        Err(iterations) => iterations,
    };
    debug!(
        flows = flows.len(),
        newton_iterations,
        "Newton-Raphson did not converge, falling back to bisection"
    );
    bisection(&schedule, config, tolerance, newton_iterations)
}

/// Scale for the step test: `|rate|` for large rates, `1 + rate` close to -1.
fn step_scale(rate: f64) -> f64 {
    rate.abs().max(1.0).min(1.0 + rate)
}

/// Returns the root, or the number of iterations run before giving up.
fn newton(schedule: &Schedule, config: &SolverConfig, tolerance: f64) -> Result<f64, usize> {
    let mut rate = config.initial_guess;

    for iteration in 0..config.max_iterations {
        let value = schedule.npv(rate);
        let slope = schedule.npv_derivative(rate);
        if !value.is_finite() || !slope.is_finite() || slope == 0.0 {
            debug!(iteration, rate, "Newton-Raphson hit a flat or non-finite point");
            return Err(iteration);
        }
        if value == 0.0 {
            return Ok(rate);
        }

        let mut next = rate - value / slope;
        if !next.is_finite() {
            return Err(iteration + 1);
        }
        if next <= -1.0 {
            next = (rate - 1.0) / 2.0;
        }

        // Step test scaled to the rate; a small NPV alone does not stop.
        if (next - rate).abs() < config.step_tolerance * step_scale(next) {
            debug!(iteration, rate = next, "Newton-Raphson converged");
            return Ok(next);
        }
        rate = next;
    }

    if schedule.npv(rate).abs() < tolerance {
        debug!(rate, "Newton-Raphson stopped at the iteration cap inside the NPV tolerance");
        return Ok(rate);
    }
    Err(config.max_iterations)
}

fn bisection(
    schedule: &Schedule,
    config: &SolverConfig,
    tolerance: f64,
    newton_iterations: usize,
) -> Result<f64, XirrError> {
    let mut lo = config.bracket_low;
    let mut hi = config.bracket_high;
    let mut f_lo = schedule.npv(lo);
    let mut f_hi = schedule.npv(hi);
    let mut expansions = 0;

    while !straddles(f_lo, f_hi) {
        if expansions >= config.max_bracket_expansions {
            return Err(XirrError::NoConvergence {
                newton_iterations,
                bracket_expansions: expansions,
            });
        }
        lo = -1.0 + (1.0 + lo) / 10.0;
        hi *= 10.0;
        f_lo = schedule.npv(lo);
        f_hi = schedule.npv(hi);
        expansions += 1;
    }

    if f_lo == 0.0 {
        return Ok(lo);
    }
    if f_hi == 0.0 {
        return Ok(hi);
    }

    for _ in 0..config.bisection_iterations {
        let mid = (lo + hi) / 2.0;
        let f_mid = schedule.npv(mid);
        if f_mid.abs() < tolerance || (hi - lo) / 2.0 < f64::EPSILON {
            debug!(rate = mid, expansions, "bisection converged");
            return Ok(mid);
        }
        if (f_mid < 0.0) == (f_lo < 0.0) {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(XirrError::NoConvergence {
        newton_iterations,
        bracket_expansions: expansions,
    })
}

fn straddles(a: f64, b: f64) -> bool {
    !a.is_nan() && !b.is_nan() && (a == 0.0 || b == 0.0 || (a < 0.0) != (b < 0.0))
}
