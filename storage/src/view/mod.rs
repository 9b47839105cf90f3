//! A live, bounded window over a per-conversation ordering.
//!
//! A chat list shows the `N` conversations with the most recent activity. [WindowedView] keeps
//! such a window current as records are inserted and removed, without rescanning the underlying
//! data on every change:
//!
//! - [WindowedView::add_entry] and [WindowedView::remove_entry] apply point mutations directly to
//!   the window.
//! - [WindowedView::complete] restores the window's invariants once per batch, pulling replacement
//!   entries through caller-supplied fetch callbacks.
//! - [WindowedView::snapshot] hands readers an immutable [Snapshot].
//!
//! # Sentinels
//!
//! Besides its entries, a view remembers the single closest entry just outside each edge of the
//! window (`earlier` and `later`). A sentinel is present only if more data is known to exist
//! beyond that edge, which is all a reader needs to offer "load more" without materializing it.
//!
//! # Reconciliation
//!
//! When a batch did not shrink the window (or the window is full), only the edges can be stale:
//! `complete` re-fetches a single entry beyond each edge, regardless of window size. When a
//! removal left the window under capacity, an arbitrary interior gap may exist, so `complete`
//! fetches at most a window's worth of entries beyond each previous sentinel, merges them with
//! what remains, and re-splits the result around the most recent kept entry. Work is bounded by
//! the window size, never by the size of the underlying data.
//!
//! # Example
//!
//! ```rust
//! use chatdb_storage::{
//!     sort::SortKey,
//!     view::{RemoveContext, Rendered, ViewEntry, WindowedView},
//! };
//! use std::{convert::Infallible, num::NonZeroUsize};
//!
//! let entry = |conversation: i64, ts: i32| {
//!     let key = SortKey::new(conversation, 0, 1, ts);
//!     ViewEntry::<(), &str>::new(conversation, Rendered::new(key, "hi"))
//! };
//! let data = vec![entry(4, 40), entry(3, 30), entry(2, 20), entry(1, 10)];
//!
//! // Show the two most recent conversations
//! let capacity = NonZeroUsize::new(2).unwrap();
//! let mut view = WindowedView::load(capacity, |_, n| {
//!     Ok::<_, Infallible>(data.iter().take(n).cloned().collect())
//! })
//! .unwrap();
//! assert_eq!(view.len(), 2);
//! assert_eq!(view.earlier().map(|e| e.conversation()), Some(2));
//!
//! // A new message moves conversation 1 to the top
//! let mut context = RemoveContext::default();
//! view.remove_entry(&mut context, 1);
//! view.add_entry(entry(1, 50));
//! view.complete(
//!     context,
//!     |_, _| Ok::<_, Infallible>(vec![entry(3, 30)]),
//!     |_, _| Ok(vec![]),
//! )
//! .unwrap();
//!
//! let snapshot = view.snapshot();
//! let order: Vec<_> = snapshot.entries().iter().map(|e| e.conversation()).collect();
//! assert_eq!(order, vec![4, 1]);
//! assert_eq!(snapshot.earlier().map(|key| key.conversation), Some(3));
//! ```

mod snapshot;
mod window;
pub use snapshot::Snapshot;
pub use window::WindowedView;

use crate::sort::{ConversationId, RecordId, SortKey};
use std::fmt::Display;

/// A record as presented by a view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered<V> {
    key: SortKey,
    value: V,
    incomplete: bool,
}

impl<V> Rendered<V> {
    /// A fully loaded record.
    pub fn new(key: SortKey, value: V) -> Self {
        Self {
            key,
            value,
            incomplete: false,
        }
    }

    /// A record whose payload has not been fully loaded yet.
    pub fn incomplete(key: SortKey, value: V) -> Self {
        Self {
            key,
            value,
            incomplete: true,
        }
    }

    pub fn key(&self) -> SortKey {
        self.key
    }

    pub fn id(&self) -> RecordId {
        self.key.id()
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn is_incomplete(&self) -> bool {
        self.incomplete
    }
}

/// The element of a view: a conversation and its most relevant record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewEntry<P, V> {
    conversation: ConversationId,
    peer: Option<P>,
    record: Rendered<V>,
}

impl<P, V> ViewEntry<P, V> {
    pub fn new(conversation: ConversationId, record: Rendered<V>) -> Self {
        Self {
            conversation,
            peer: None,
            record,
        }
    }

    /// An entry carrying the conversation's peer metadata.
    pub fn with_peer(conversation: ConversationId, peer: P, record: Rendered<V>) -> Self {
        Self {
            conversation,
            peer: Some(peer),
            record,
        }
    }

    pub fn conversation(&self) -> ConversationId {
        self.conversation
    }

    pub fn peer(&self) -> Option<&P> {
        self.peer.as_ref()
    }

    pub fn record(&self) -> &Rendered<V> {
        &self.record
    }

    pub fn key(&self) -> ViewEntryKey {
        ViewEntryKey::new(self.conversation, self.record.key)
    }
}

/// The position of a [ViewEntry]: ordered by [SortKey], then by conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewEntryKey {
    pub sort: SortKey,
    pub conversation: ConversationId,
}

impl ViewEntryKey {
    pub const fn new(conversation: ConversationId, sort: SortKey) -> Self {
        Self { sort, conversation }
    }

    /// An exclusive bound just before this key (see [SortKey::earlier]).
    ///
    /// At the lowest `local_id` the bound steps the sort key's conversation instead.
    pub const fn earlier(&self) -> Self {
        let sort = if self.sort.local_id == i32::MIN {
            SortKey {
                conversation: self.sort.conversation.saturating_sub(1),
                ..self.sort
            }
        } else {
            self.sort.earlier()
        };
        Self {
            sort,
            conversation: self.conversation,
        }
    }

    /// An exclusive bound just after this key (see [SortKey::later]).
    ///
    /// At the highest `local_id` the bound steps the sort key's conversation instead.
    pub const fn later(&self) -> Self {
        let sort = if self.sort.local_id == i32::MAX {
            SortKey {
                conversation: self.sort.conversation.saturating_add(1),
                ..self.sort
            }
        } else {
            self.sort.later()
        };
        Self {
            sort,
            conversation: self.conversation,
        }
    }
}

impl Display for ViewEntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(p {}, m {}:{}@{})",
            self.conversation, self.sort.namespace, self.sort.local_id, self.sort.timestamp
        )
    }
}

/// What a batch of [WindowedView::remove_entry] calls invalidated, accumulated until the next
/// [WindowedView::complete].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemoveContext {
    /// The earlier sentinel belonged to a removed conversation.
    pub invalid_earlier: bool,
    /// The later sentinel belonged to a removed conversation.
    pub invalid_later: bool,
    /// At least one entry was removed from the window.
    pub removed_entries: bool,
}
