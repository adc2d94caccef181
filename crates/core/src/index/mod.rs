//! Raw tree indexer.
//!
//! Walks the raw download tree once and records every file whose extension is
//! eligible. Files are looked up later either by file name (flat lookup) or by
//! the name of the directory that contains them (container lookup). Files that
//! share a name are all kept; choosing between them is the planner's job.

mod error;
mod scanner;
mod types;

pub use error::IndexError;
pub use scanner::RawTreeIndexer;
pub use types::{RawFileRecord, RawIndex};
