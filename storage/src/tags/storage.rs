use super::{
    key::{Key, PREFIX_SIZE},
    Around, Config, Error,
};
use crate::{
    sort::{ConversationId, SortKey, Tags},
    table::{predecessor, successor, OrderedStore, Table},
};
use commonware_codec::{DecodeExt, FixedSize};
use commonware_runtime::Metrics;
use prometheus_client::metrics::counter::Counter;
use tracing::trace;

/// A secondary index of tagged records, grouped by (conversation, tags) and ordered by [SortKey]
/// within each group.
pub struct TagIndex<S: OrderedStore> {
    store: S,
    table: Table,

    added: Counter,
    removed: Counter,
    scans: Counter,
}

impl<S: OrderedStore> TagIndex<S> {
    /// Create a new [TagIndex] over `store`.
    pub fn init(context: impl Metrics, store: S, cfg: Config) -> Self {
        let s = Self {
            store,
            table: cfg.table,

            added: Counter::default(),
            removed: Counter::default(),
            scans: Counter::default(),
        };
        context.register("added", "Number of markers added", s.added.clone());
        context.register("removed", "Number of marker removals", s.removed.clone());
        context.register("scans", "Number of range scans issued", s.scans.clone());
        s
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the index, returning the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Mark the record at `key` with `tags`. Adding an existing marker is a no-op.
    pub fn add(&mut self, tags: Tags, key: &SortKey) -> Result<(), Error<S::Error>> {
        let encoded = Key::new(tags, *key).to_bytes();
        self.store
            .set(self.table, &encoded, &[])
            .map_err(Error::Store)?;
        self.added.inc();
        trace!(table = %self.table, tags = tags.bits(), %key, "added marker");
        Ok(())
    }

    /// Remove the marker for `key` under `tags`. Removing an absent marker is a no-op.
    pub fn remove(&mut self, tags: Tags, key: &SortKey) -> Result<(), Error<S::Error>> {
        let encoded = Key::new(tags, *key).to_bytes();
        self.store
            .remove(self.table, &encoded)
            .map_err(Error::Store)?;
        self.removed.inc();
        trace!(table = %self.table, tags = tags.bits(), %key, "removed marker");
        Ok(())
    }

    /// Returns true if `key` is marked with `tags`.
    pub fn has(&self, tags: Tags, key: &SortKey) -> Result<bool, Error<S::Error>> {
        let encoded = Key::new(tags, *key).to_bytes();
        let value = self
            .store
            .get(self.table, &encoded)
            .map_err(Error::Store)?;
        Ok(value.is_some())
    }

    /// Returns up to `count` keys of the group strictly before `pivot`, most recent first.
    ///
    /// If `pivot` is `None`, the scan starts from the most recent key of the group. The pivot is
    /// always interpreted within `conversation`'s group (its own conversation is ignored).
    pub fn earlier(
        &self,
        tags: Tags,
        conversation: ConversationId,
        pivot: Option<&SortKey>,
        count: usize,
    ) -> Result<Vec<SortKey>, Error<S::Error>> {
        let prefix = Key::prefix(tags, conversation);
        let start = match pivot {
            Some(pivot) => Self::pivot_key(tags, conversation, pivot).to_vec(),
            None => Self::upper_bound(&prefix),
        };
        let keys = self.scan(&start, &prefix, count)?;
        trace!(
            table = %self.table,
            tags = tags.bits(),
            conversation,
            count,
            found = keys.len(),
            "scanned earlier"
        );
        Ok(keys)
    }

    /// Returns up to `count` keys of the group strictly after `pivot`, oldest first.
    ///
    /// If `pivot` is `None`, the scan starts from the oldest key of the group.
    pub fn later(
        &self,
        tags: Tags,
        conversation: ConversationId,
        pivot: Option<&SortKey>,
        count: usize,
    ) -> Result<Vec<SortKey>, Error<S::Error>> {
        let prefix = Key::prefix(tags, conversation);
        let start = match pivot {
            Some(pivot) => Self::pivot_key(tags, conversation, pivot).to_vec(),
            None => prefix.to_vec(),
        };
        let keys = self.scan(&start, &Self::upper_bound(&prefix), count)?;
        trace!(
            table = %self.table,
            tags = tags.bits(),
            conversation,
            count,
            found = keys.len(),
            "scanned later"
        );
        Ok(keys)
    }

    /// Returns a window of up to `count` keys straddling `pivot` within the pivot's conversation.
    ///
    /// Roughly half of the window is taken strictly before `pivot` and the rest at or after it. If
    /// one side runs out of keys, the other side is extended to fill the window. Each side is
    /// over-fetched by one key to learn whether more data exists beyond the window; that key is
    /// returned as [Around::lower] or [Around::upper] rather than as part of the window.
    pub fn around(
        &self,
        tags: Tags,
        pivot: &SortKey,
        count: usize,
    ) -> Result<Around, Error<S::Error>> {
        if count == 0 {
            return Ok(Around::default());
        }
        let prefix = Key::prefix(tags, pivot.conversation);
        let pivot_key = Key::new(tags, *pivot).to_bytes();

        // Strictly before the pivot, most recent first
        let lower_limit = (count / 2).saturating_add(1);
        let mut lower_keys = self.scan(&pivot_key, &prefix, lower_limit)?;
        let mut lower = None;
        if lower_keys.len() >= lower_limit {
            lower = lower_keys.pop();
        }

        // At or after the pivot, oldest first
        let upper_limit = (count - lower_keys.len()).saturating_add(1);
        let start = predecessor(&pivot_key).unwrap_or_else(|| prefix.to_vec());
        let mut upper_keys = self.scan(&start, &Self::upper_bound(&prefix), upper_limit)?;
        let mut upper = None;
        if upper_keys.len() >= upper_limit {
            upper = upper_keys.pop();
        }

        // If the upper side ran out, use its unused quota on the lower side
        if lower.is_some() && lower_keys.len() + upper_keys.len() < count {
            let from = lower_keys
                .last()
                .map_or(pivot_key, |key| Key::new(tags, *key).to_bytes());
            let limit = (count - lower_keys.len() - upper_keys.len()).saturating_add(1);
            let mut additional = self.scan(&from, &prefix, limit)?;
            lower = if additional.len() >= limit {
                additional.pop()
            } else {
                None
            };
            lower_keys.extend(additional);
        }

        trace!(
            table = %self.table,
            tags = tags.bits(),
            %pivot,
            count,
            lower = lower_keys.len(),
            upper = upper_keys.len(),
            "scanned around"
        );
        lower_keys.reverse();
        lower_keys.extend(upper_keys);
        Ok(Around {
            keys: lower_keys,
            lower,
            upper,
        })
    }

    /// Encode `pivot` as a key of `conversation`'s group.
    fn pivot_key(tags: Tags, conversation: ConversationId, pivot: &SortKey) -> [u8; Key::SIZE] {
        let sort = SortKey {
            conversation,
            ..*pivot
        };
        Key::new(tags, sort).to_bytes()
    }

    /// The exclusive upper bound of the group identified by `prefix`.
    fn upper_bound(prefix: &[u8; PREFIX_SIZE]) -> Vec<u8> {
        // Only the last group of the key space has no successor: any longer key bounds it.
        successor(prefix).unwrap_or_else(|| vec![u8::MAX; Key::SIZE + 1])
    }

    /// Collect up to `limit` keys between `start` and `end` (both exclusive).
    fn scan(
        &self,
        start: &[u8],
        end: &[u8],
        limit: usize,
    ) -> Result<Vec<SortKey>, Error<S::Error>> {
        let mut keys = Vec::new();
        if limit == 0 {
            return Ok(keys);
        }
        let mut invalid = None;
        self.store
            .range(self.table, start, end, limit, |raw, _| match Key::decode(raw) {
                Ok(key) => {
                    keys.push(key.sort);
                    true
                }
                Err(err) => {
                    invalid = Some(err);
                    false
                }
            })
            .map_err(Error::Store)?;
        self.scans.inc();
        if let Some(err) = invalid {
            return Err(Error::Codec(err));
        }
        Ok(keys)
    }
}
