//! Chronological positions of records and the classification tags attached to them.
//!
//! A [SortKey] locates a record in time. Keys compare by `timestamp`, then `namespace`, then
//! `local_id`, and finally `conversation`, so that records sharing a timestamp are still totally
//! ordered.

use std::{
    cmp::Ordering,
    fmt::{Debug, Display},
    ops::{BitAnd, BitOr},
};

/// Stable identifier of a conversation (peer).
pub type ConversationId = i64;

/// Identity of a record independent of its position in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId {
    pub conversation: ConversationId,
    pub namespace: i32,
    pub local_id: i32,
}

/// The chronological position of a record.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub conversation: ConversationId,
    pub namespace: i32,
    pub local_id: i32,
    pub timestamp: i32,
}

impl SortKey {
    pub const fn new(
        conversation: ConversationId,
        namespace: i32,
        local_id: i32,
        timestamp: i32,
    ) -> Self {
        Self {
            conversation,
            namespace,
            local_id,
            timestamp,
        }
    }

    /// The identity of the record at this position.
    pub const fn id(&self) -> RecordId {
        RecordId {
            conversation: self.conversation,
            namespace: self.namespace,
            local_id: self.local_id,
        }
    }

    /// The key immediately preceding this one within the same namespace and timestamp.
    ///
    /// Only useful as an exclusive scan bound: the returned key does not address a real record.
    pub const fn earlier(&self) -> Self {
        Self {
            local_id: self.local_id.saturating_sub(1),
            ..*self
        }
    }

    /// The key immediately following this one within the same namespace and timestamp.
    pub const fn later(&self) -> Self {
        Self {
            local_id: self.local_id.saturating_add(1),
            ..*self
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then(self.namespace.cmp(&other.namespace))
            .then(self.local_id.cmp(&other.local_id))
            .then(self.conversation.cmp(&other.conversation))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Debug for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "m {}:{}:{}@{}",
            self.conversation, self.namespace, self.local_id, self.timestamp
        )
    }
}

/// A bitmask classifying a record (for example "has media" or "is pinned").
///
/// Each distinct mask is indexed as its own group: a record indexed under `A | B` is not
/// returned by a scan for `A`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tags(u32);

impl Tags {
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns true if every bit of `other` is set in `self`.
    pub const fn contains(&self, other: Tags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Tags {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl BitOr for Tags {
    type Output = Tags;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for Tags {
    type Output = Tags;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}
