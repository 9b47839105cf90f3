//! Tag-scoped message indices and live windowed views over an ordered store.
//!
//! - [tags::TagIndex] answers "which records of this conversation carry these tags", paginated in
//!   chronological order, on top of any [table::OrderedStore].
//! - [view::WindowedView] keeps a bounded, sorted window of conversations current under point
//!   inserts and removals.
//!
//! # Status
//!
//! `chatdb-storage` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

pub mod sort;
pub mod table;
pub mod tags;
pub mod view;
