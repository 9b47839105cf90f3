//! A secondary index of tagged records, scoped by conversation and tag mask.
//!
//! [TagIndex] records which messages of a conversation carry a given tag mask (for example, "has
//! media") so that history filtered by that mask can be paged in either direction without loading
//! unrelated conversations. Each marker is a presence-only key in an [crate::table::OrderedStore]:
//!
//! ```text
//! conversation (8) | tags (4) | timestamp (4) | namespace (4) | local id (4)
//! ```
//!
//! The field order groups all markers of a (conversation, tags) pair contiguously and orders them
//! chronologically within that group. Scans are bounded by the 12-byte group prefix and its
//! lexicographic successor, so they never touch another group.
//!
//! # Scans
//!
//! - [TagIndex::earlier] pages backward from a pivot (or from the most recent marker).
//! - [TagIndex::later] pages forward from a pivot (or from the oldest marker).
//! - [TagIndex::around] returns a window centered on an arbitrary pivot, plus the keys just outside
//!   the window (if any) so callers know whether more data exists on either side.
//!
//! A pivot does not need to correspond to a stored marker: it only defines a boundary.
//!
//! # Example
//!
//! ```rust
//! use chatdb_storage::{
//!     sort::{SortKey, Tags},
//!     table::{Memory, Table},
//!     tags::{Config, TagIndex},
//! };
//! use commonware_runtime::{deterministic, Runner};
//!
//! let executor = deterministic::Runner::default();
//! executor.start(|context| async move {
//!     let mut index = TagIndex::init(context, Memory::new(), Config { table: Table::new(1) });
//!
//!     let media = Tags::new(1);
//!     for id in 1..=5 {
//!         index.add(media, &SortKey::new(42, 0, id, id * 10)).unwrap();
//!     }
//!
//!     let recent = index.earlier(media, 42, None, 2).unwrap();
//!     assert_eq!(recent, vec![SortKey::new(42, 0, 5, 50), SortKey::new(42, 0, 4, 40)]);
//! });
//! ```

mod key;
mod storage;
pub use key::Key;
pub use storage::TagIndex;

use crate::{sort::SortKey, table::Table};
use thiserror::Error;

/// Errors that can occur when interacting with a [TagIndex].
#[derive(Debug, Error)]
pub enum Error<E: std::error::Error + Send + Sync + 'static> {
    #[error("store error: {0}")]
    Store(#[source] E),
    #[error("invalid key: {0}")]
    Codec(#[from] commonware_codec::Error),
}

/// Configuration for a [TagIndex].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// The [crate::table::OrderedStore] table holding the index.
    pub table: Table,
}

/// The result of [TagIndex::around].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Around {
    /// Keys of the window, oldest first.
    pub keys: Vec<SortKey>,
    /// The key immediately before the window, if one exists.
    pub lower: Option<SortKey>,
    /// The key immediately after the window, if one exists.
    pub upper: Option<SortKey>,
}
