//! Domain error types.

/// Failures of the rate-of-return solver.
///
/// The solver never hands back a placeholder rate; a caller either gets a
/// definite value or one of these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum XirrError {
    #[error("no root: cash flows need at least one outflow and one inflow")]
    NoRoot,

    #[error(
        "no convergence after {newton_iterations} Newton iterations and {bracket_expansions} bracket expansions"
    )]
    NoConvergence {
        newton_iterations: usize,
        bracket_expansions: usize,
    },
}

/// Failures of the aggregation helpers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregationError {
    #[error("insufficient data: {what}")]
    InsufficientData { what: String },
}

/// Top-level error type for scripxirr.
#[derive(Debug, thiserror::Error)]
pub enum ScripxirrError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("{file}:{line}: {reason}")]
    Input {
        file: String,
        line: u64,
        reason: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Xirr(#[from] XirrError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ScripxirrError> for std::process::ExitCode {
    fn from(err: &ScripxirrError) -> Self {
        let code: u8 = match err {
            ScripxirrError::Io(_) => 1,
            ScripxirrError::ConfigParse { .. }
            | ScripxirrError::ConfigMissing { .. }
            | ScripxirrError::ConfigInvalid { .. } => 2,
            ScripxirrError::Input { .. } => 3,
            ScripxirrError::Report { .. } => 4,
            ScripxirrError::Xirr(_) | ScripxirrError::Aggregation(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
