//! Metadata matcher.
//!
//! Merges metadata documents into one [`MetadataSet`] keyed by record id.
//! Sources are read in order and the first occurrence of a record id wins;
//! later duplicates are dropped with a warning. Items that cannot be tied to a
//! case are skipped, not fatal.

mod error;
mod loader;
mod matcher;
mod types;

pub use error::MetadataError;
pub use loader::{load_source, load_sources, LoadedSources};
pub use matcher::{document_items, MetadataMatcher};
pub use types::{
    MatchReport, MetadataRecord, MetadataSet, MetadataSource, SkipReason, SkippedItem,
    SourceFailure,
};
