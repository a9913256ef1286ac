pub mod cloc;
pub mod parse;

pub use cloc::Cloc;
pub use parse::parse_cloc_csv;

use crate::error::Result;
use crate::model::LocCount;
use std::path::Path;

/// Counts lines of code in a materialized tree.
///
/// `tree` is whatever the tree source produced: an archive file or a
/// directory. Any error is treated by the caller as a degraded scope.
pub trait LineCounter: Send + Sync {
    fn count(&self, tree: &Path) -> Result<LocCount>;
}
