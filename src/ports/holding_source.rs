//! Cash-flow source port trait.

use crate::domain::error::ScripxirrError;
use crate::domain::holding::HoldingBook;

/// Anything that can attach cash flows (and quantities) to holdings.
///
/// Sources are applied in order against one shared book, so a later source
/// sees the holdings an earlier one created.
pub trait HoldingSource {
    fn load_into(&self, book: &mut HoldingBook) -> Result<(), ScripxirrError>;

    /// Short label used in log lines.
    fn describe(&self) -> String {
        String::from("holding source")
    }
}

/// Builds a fresh book from `sources`, applied in order.
pub fn load_book(sources: &[&dyn HoldingSource]) -> Result<HoldingBook, ScripxirrError> {
    let mut book = HoldingBook::new();
    for source in sources {
        let before = book.len();
        source.load_into(&mut book)?;
        tracing::info!(
            source = %source.describe(),
            new_holdings = book.len() - before,
            "loaded holdings"
        );
    }
    Ok(book)
}
