//! Placer module for putting slide files into the organized tree.
//!
//! The `Placer` trait turns a `PlacementDecision` into an `ExecutionOutcome`.
//! `FsPlacer` is the filesystem implementation:
//!
//! - copy or move, with a copy-then-remove fallback for cross-device moves
//! - dry runs that report the same destinations without touching disk
//! - `_1`, `_2`, ... suffixes instead of overwriting in move mode, and for
//!   targets already claimed earlier in the same run
//! - pruning of source directories emptied by a move

mod config;
mod error;
mod fs_placer;
mod traits;
mod types;

pub use config::PlacerConfig;
pub use error::PlacerError;
pub use fs_placer::{suffixed_path, FsPlacer};
pub use traits::Placer;
pub use types::TransferMode;
