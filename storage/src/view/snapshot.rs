use super::{window::describe, ViewEntry, ViewEntryKey, WindowedView};
use std::fmt::Display;

/// An immutable copy of a [WindowedView].
///
/// Only the keys of the sentinels are retained: readers need them to request more data, not the
/// (possibly not yet loaded) records behind them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot<P, V> {
    earlier: Option<ViewEntryKey>,
    entries: Vec<ViewEntry<P, V>>,
    later: Option<ViewEntryKey>,
}

impl<P, V> Snapshot<P, V> {
    /// Entries of the window, oldest first.
    pub fn entries(&self) -> &[ViewEntry<P, V>] {
        &self.entries
    }

    /// Position of the closest entry before the window, if more data exists there.
    pub fn earlier(&self) -> Option<ViewEntryKey> {
        self.earlier
    }

    /// Position of the closest entry after the window, if more data exists there.
    pub fn later(&self) -> Option<ViewEntryKey> {
        self.later
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Clone, V: Clone> From<&WindowedView<P, V>> for Snapshot<P, V> {
    fn from(view: &WindowedView<P, V>) -> Self {
        Self {
            earlier: view.earlier().map(ViewEntry::key),
            entries: view.entries().to_vec(),
            later: view.later().map(ViewEntry::key),
        }
    }
}

impl<P, V> Display for Snapshot<P, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        describe(
            f,
            self.earlier,
            self.entries.iter().map(ViewEntry::key),
            self.later,
        )
    }
}
