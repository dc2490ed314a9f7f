//! Configuration validation.
//!
//! Checks every configured value before a run starts.

use chrono::format::{Item, StrftimeItems};

use crate::domain::error::ScripxirrError;
use crate::domain::xirr::SolverConfig;
use crate::ports::config_port::ConfigPort;

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), ScripxirrError> {
    validate_date_format(config)?;
    validate_buy_labels(config)?;
    validate_columns(config)?;
    validate_solver_config(config)?;
    Ok(())
}

pub fn validate_solver_config(config: &dyn ConfigPort) -> Result<(), ScripxirrError> {
    let defaults = SolverConfig::default();

    let guess = config.get_double("solver", "initial_guess", defaults.initial_guess);
    if guess <= -1.0 {
        return Err(invalid("solver", "initial_guess", "initial_guess must be above -1"));
    }

    let max_iterations = config.get_int("solver", "max_iterations", defaults.max_iterations as i64);
    if max_iterations < 1 {
        return Err(invalid("solver", "max_iterations", "max_iterations must be at least 1"));
    }

    let bisection =
        config.get_int("solver", "bisection_iterations", defaults.bisection_iterations as i64);
    if bisection < 1 {
        return Err(invalid(
            "solver",
            "bisection_iterations",
            "bisection_iterations must be at least 1",
        ));
    }

    let expansions = config.get_int(
        "solver",
        "max_bracket_expansions",
        defaults.max_bracket_expansions as i64,
    );
    if expansions < 0 {
        return Err(invalid(
            "solver",
            "max_bracket_expansions",
            "max_bracket_expansions must be non-negative",
        ));
    }

    for (key, default) in [
        ("npv_tolerance", defaults.npv_tolerance),
        ("step_tolerance", defaults.step_tolerance),
    ] {
        if config.get_double("solver", key, default) <= 0.0 {
            return Err(invalid("solver", key, &format!("{key} must be positive")));
        }
    }

    let low = config.get_double("solver", "bracket_low", defaults.bracket_low);
    let high = config.get_double("solver", "bracket_high", defaults.bracket_high);
    if low <= -1.0 {
        return Err(invalid("solver", "bracket_low", "bracket_low must be above -1"));
    }
    if low >= high {
        return Err(invalid(
            "solver",
            "bracket_low",
            "bracket_low must be below bracket_high",
        ));
    }
    Ok(())
}

fn validate_date_format(config: &dyn ConfigPort) -> Result<(), ScripxirrError> {
    let Some(format) = config.get_string("input", "date_format") else {
        return Ok(());
    };
    if format.trim().is_empty() {
        return Err(invalid("input", "date_format", "date_format must not be empty"));
    }
    if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid(
            "input",
            "date_format",
            &format!("unsupported date format {format:?}"),
        ));
    }
    Ok(())
}

fn validate_buy_labels(config: &dyn ConfigPort) -> Result<(), ScripxirrError> {
    match config.get_list("input", "buy_labels") {
        Some(labels) if labels.is_empty() => Err(invalid(
            "input",
            "buy_labels",
            "buy_labels must name at least one label",
        )),
        _ => Ok(()),
    }
}

fn validate_columns(config: &dyn ConfigPort) -> Result<(), ScripxirrError> {
    for key in [
        "code",
        "name",
        "type",
        "quantity",
        "price",
        "date",
        "holding_quantity",
        "market_value",
    ] {
        if config.get_int("columns", key, 0) < 0 {
            return Err(invalid(
                "columns",
                key,
                "column index must be non-negative",
            ));
        }
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> ScripxirrError {
    ScripxirrError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
