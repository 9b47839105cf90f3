use super::{RemoveContext, Rendered, Snapshot, ViewEntry, ViewEntryKey};
use crate::sort::{ConversationId, RecordId};
use std::{
    collections::HashMap,
    fmt::{Display, Write},
    num::NonZeroUsize,
};
use tracing::debug;

/// A bounded, sorted window over a per-conversation ordering, kept current under point
/// mutations.
///
/// `entries` are ascending by [ViewEntryKey] and never exceed `capacity`. `earlier` and `later`
/// hold the closest entry just outside each edge of the window, and are present only if more data
/// is known to exist beyond that edge.
#[derive(Clone, Debug)]
pub struct WindowedView<P, V> {
    capacity: NonZeroUsize,
    earlier: Option<ViewEntry<P, V>>,
    entries: Vec<ViewEntry<P, V>>,
    later: Option<ViewEntry<P, V>>,

    /// Set when an emptied window was refilled past one of its sentinels: until the next
    /// `complete`, the sentinels no longer bound the window.
    detached: bool,
}

impl<P, V> WindowedView<P, V> {
    /// Create a view from already materialized parts.
    ///
    /// `entries` are sorted. If there are more than `capacity` of them, the earliest are dropped
    /// and the closest dropped entry replaces `earlier`.
    pub fn new(
        capacity: NonZeroUsize,
        mut earlier: Option<ViewEntry<P, V>>,
        mut entries: Vec<ViewEntry<P, V>>,
        later: Option<ViewEntry<P, V>>,
    ) -> Self {
        entries.sort_by_key(ViewEntry::key);
        if entries.len() > capacity.get() {
            let excess = entries.len() - capacity.get();
            earlier = entries.drain(..excess).last();
        }
        Self {
            capacity,
            earlier,
            entries,
            later,
            detached: false,
        }
    }

    /// Create a view of the `capacity` most recent entries.
    ///
    /// `fetch_earlier(None, n)` must return up to `n` entries, most recent first.
    pub fn load<E, F>(capacity: NonZeroUsize, mut fetch_earlier: F) -> Result<Self, E>
    where
        F: FnMut(Option<ViewEntryKey>, usize) -> Result<Vec<ViewEntry<P, V>>, E>,
    {
        let limit = capacity.get().saturating_add(1);
        let mut fetched = fetch_earlier(None, limit)?;
        fetched.truncate(limit);
        let earlier = if fetched.len() > capacity.get() {
            fetched.pop()
        } else {
            None
        };
        debug!(capacity = capacity.get(), loaded = fetched.len(), "loaded view");
        Ok(Self::new(capacity, earlier, fetched, None))
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of the window, oldest first.
    pub fn entries(&self) -> &[ViewEntry<P, V>] {
        &self.entries
    }

    /// The closest entry before the window, if more data exists there.
    pub fn earlier(&self) -> Option<&ViewEntry<P, V>> {
        self.earlier.as_ref()
    }

    /// The closest entry after the window, if more data exists there.
    pub fn later(&self) -> Option<&ViewEntry<P, V>> {
        self.later.as_ref()
    }

    fn earlier_key(&self) -> Option<ViewEntryKey> {
        self.earlier.as_ref().map(ViewEntry::key)
    }

    fn later_key(&self) -> Option<ViewEntryKey> {
        self.later.as_ref().map(ViewEntry::key)
    }

    /// Move the earliest entry into `earlier` if the window is over capacity.
    fn evict(&mut self) {
        if self.entries.len() > self.capacity.get() {
            self.earlier = Some(self.entries.remove(0));
        }
    }

    /// Place `entry` in the window (or in a sentinel) according to its key.
    ///
    /// The view does not deduplicate by conversation: [WindowedView::remove_entry] must be called
    /// before adding an updated entry for a conversation already present.
    pub fn add_entry(&mut self, entry: ViewEntry<P, V>) {
        let key = entry.key();
        let (Some(first), Some(last)) = (
            self.entries.first().map(ViewEntry::key),
            self.entries.last().map(ViewEntry::key),
        ) else {
            self.detached |= self.earlier_key().is_some_and(|earlier| key < earlier)
                || self.later_key().is_some_and(|later| key > later);
            self.entries.push(entry);
            return;
        };

        if key < first {
            if self.earlier_key().is_none_or(|earlier| earlier < key) {
                if self.entries.len() < self.capacity.get() {
                    self.entries.insert(0, entry);
                } else {
                    self.earlier = Some(entry);
                }
            }
        } else if key > last {
            if self.later_key().is_some_and(|later| key > later) {
                return;
            }
            self.entries.push(entry);
            self.evict();
        } else if key != first && key != last {
            let index = self.entries.partition_point(|existing| existing.key() < key);
            self.entries.insert(index, entry);
            self.evict();
        }
    }

    /// Remove the entry of `conversation`, recording what was invalidated in `context`.
    ///
    /// Removing a conversation that is not present is a no-op.
    pub fn remove_entry(&mut self, context: &mut RemoveContext, conversation: ConversationId) {
        if self
            .earlier
            .as_ref()
            .is_some_and(|earlier| earlier.conversation() == conversation)
        {
            context.invalid_earlier = true;
        }
        if self
            .later
            .as_ref()
            .is_some_and(|later| later.conversation() == conversation)
        {
            context.invalid_later = true;
        }
        if let Some(index) = self
            .entries
            .iter()
            .position(|entry| entry.conversation() == conversation)
        {
            self.entries.remove(index);
            context.removed_entries = true;
        }
    }

    /// Restore the window's invariants after a batch of [WindowedView::add_entry] and
    /// [WindowedView::remove_entry] calls.
    ///
    /// `fetch_earlier(pivot, n)` returns up to `n` entries strictly before `pivot`, most recent
    /// first (or the most recent entries if `pivot` is `None`). `fetch_later(pivot, n)` returns up
    /// to `n` entries strictly after `pivot`, oldest first. Errors returned by either are
    /// propagated unmodified and leave the view in need of another `complete`.
    pub fn complete<E, F, L>(
        &mut self,
        context: RemoveContext,
        mut fetch_earlier: F,
        mut fetch_later: L,
    ) -> Result<(), E>
    where
        F: FnMut(Option<ViewEntryKey>, usize) -> Result<Vec<ViewEntry<P, V>>, E>,
        L: FnMut(Option<ViewEntryKey>, usize) -> Result<Vec<ViewEntry<P, V>>, E>,
    {
        let at_capacity = self.entries.len() == self.capacity.get();
        if self.entries.is_empty() || self.detached || (context.removed_entries && !at_capacity) {
            return self.rebuild(&mut fetch_earlier, &mut fetch_later);
        }

        // Only the edges can be wrong: verify them with a single-entry probe each
        let first = self.entries[0].key();
        let last = self.entries[self.entries.len() - 1].key();
        let probe_all = at_capacity || context.removed_entries;
        let probe_earlier = probe_all
            || context.invalid_earlier
            || self.earlier_key().is_none_or(|earlier| earlier >= first);
        let probe_later = probe_all
            || context.invalid_later
            || self.later_key().is_none_or(|later| later <= last);
        if probe_earlier {
            self.earlier = fetch_earlier(Some(first), 1)?.into_iter().next();
        }
        if probe_later {
            self.later = fetch_later(Some(last), 1)?.into_iter().next();
        }
        debug!(
            entries = self.entries.len(),
            earlier = self.earlier.is_some(),
            later = self.later.is_some(),
            probe_earlier,
            probe_later,
            "verified view edges"
        );
        Ok(())
    }

    /// Rebuild the window around its most recent kept entry from the surrounding data.
    fn rebuild<E, F, L>(&mut self, fetch_earlier: &mut F, fetch_later: &mut L) -> Result<(), E>
    where
        F: FnMut(Option<ViewEntryKey>, usize) -> Result<Vec<ViewEntry<P, V>>, E>,
        L: FnMut(Option<ViewEntryKey>, usize) -> Result<Vec<ViewEntry<P, V>>, E>,
    {
        let capacity = self.capacity.get();
        let limit = capacity.saturating_add(1);
        let later_key = self.later_key();
        let earlier_key = self.earlier_key();
        let mut merged = Vec::new();
        let anchor = if self.detached {
            // The previous sentinels say nothing about the data around the window
            let anchor = self.entries.last().map(ViewEntry::key);
            match anchor {
                Some(anchor) => {
                    merged.extend(fetch_later(Some(anchor), 1)?);
                    merged.extend(fetch_earlier(Some(anchor), capacity)?);
                }
                None => merged.extend(fetch_earlier(None, limit)?),
            }
            anchor
        } else {
            // Pull a window's worth (plus a sentinel) from each previous sentinel outward,
            // sentinels included
            if let Some(later) = later_key {
                merged.extend(fetch_later(Some(later.earlier()), limit)?);
            }
            if let Some(earlier) = earlier_key {
                merged.extend(fetch_earlier(Some(earlier.later()), limit)?);
            } else if later_key.is_none() && self.entries.is_empty() {
                merged.extend(fetch_earlier(None, limit)?);
            }
            self.entries.last().map(ViewEntry::key).or(later_key)
        };
        merged.append(&mut self.entries);
        merged.sort_by_key(ViewEntry::key);
        merged.dedup_by_key(|entry| entry.key());

        self.earlier = None;
        self.later = None;
        self.detached = false;
        if merged.is_empty() {
            debug!("rebuilt empty view");
            return Ok(());
        }

        // Split into [earlier] [window ending at the anchor] [later]
        let anchor_index = anchor
            .and_then(|anchor| merged.iter().rposition(|entry| entry.key() <= anchor))
            .unwrap_or(merged.len() - 1);
        self.later = merged.drain(anchor_index + 1..).next();
        let start = (anchor_index + 1).saturating_sub(capacity);
        self.entries = merged.split_off(start);
        self.earlier = merged.pop();
        debug!(
            entries = self.entries.len(),
            earlier = self.earlier.is_some(),
            later = self.later.is_some(),
            "rebuilt view"
        );
        Ok(())
    }

    /// Take an immutable copy of the window.
    pub fn snapshot(&self) -> Snapshot<P, V>
    where
        P: Clone,
        V: Clone,
    {
        Snapshot::from(self)
    }

    /// Replace the peer metadata of every entry (and sentinel) whose conversation appears in
    /// `peers`. Returns true if anything was replaced.
    pub fn update_entries(&mut self, peers: &HashMap<ConversationId, P>) -> bool
    where
        P: Clone,
    {
        let mut updated = false;
        let slots = self
            .earlier
            .iter_mut()
            .chain(self.later.iter_mut())
            .chain(self.entries.iter_mut());
        for entry in slots {
            if let Some(peer) = peers.get(&entry.conversation) {
                entry.peer = Some(peer.clone());
                updated = true;
            }
        }
        updated
    }

    /// Records (in sentinels and entries) whose payload has not been fully loaded yet.
    pub fn incomplete_entries(&self) -> Vec<&Rendered<V>> {
        self.earlier
            .iter()
            .chain(self.later.iter())
            .chain(self.entries.iter())
            .map(ViewEntry::record)
            .filter(|record| record.incomplete)
            .collect()
    }

    /// Replace records with their loaded versions, keyed by [RecordId]. Each entry keeps its
    /// position, conversation and peer.
    pub fn complete_entries(&mut self, loaded: &HashMap<RecordId, Rendered<V>>)
    where
        V: Clone,
    {
        let slots = self
            .earlier
            .iter_mut()
            .chain(self.later.iter_mut())
            .chain(self.entries.iter_mut());
        for entry in slots {
            if let Some(record) = loaded.get(&entry.record.id()) {
                entry.record = record.clone();
            }
        }
    }
}

/// Write `more(earlier) [entries...] more(later)`.
pub(super) fn describe(
    f: &mut impl Write,
    earlier: Option<ViewEntryKey>,
    entries: impl Iterator<Item = ViewEntryKey>,
    later: Option<ViewEntryKey>,
) -> std::fmt::Result {
    if let Some(earlier) = earlier {
        write!(f, "more({earlier}) ")?;
    }
    f.write_char('[')?;
    for (i, key) in entries.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{key}")?;
    }
    f.write_char(']')?;
    if let Some(later) = later {
        write!(f, " more({later})")?;
    }
    Ok(())
}

impl<P, V> Display for WindowedView<P, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        describe(
            f,
            self.earlier_key(),
            self.entries.iter().map(ViewEntry::key),
            self.later_key(),
        )
    }
}
