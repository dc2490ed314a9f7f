//! Report sink port trait.

use crate::domain::error::ScripxirrError;
use crate::domain::summary::Report;

/// Port for rendering summary records.
pub trait ReportPort {
    fn write(&self, report: &Report, output_path: &str) -> Result<(), ScripxirrError>;
}
