//! An in-memory [OrderedStore] backed by one [BTreeMap] per table.

use super::{OrderedStore, Table};
use std::{
    collections::{BTreeMap, HashMap},
    convert::Infallible,
    ops::Bound::Excluded,
};

/// An in-memory [OrderedStore].
#[derive(Clone, Debug, Default)]
pub struct Memory {
    tables: HashMap<Table, BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys stored in `table`.
    pub fn len(&self, table: Table) -> usize {
        self.tables.get(&table).map_or(0, BTreeMap::len)
    }

    /// Returns true if `table` holds no keys.
    pub fn is_empty(&self, table: Table) -> bool {
        self.len(table) == 0
    }
}

/// Visit up to `limit` items of `iter`, stopping early if `visit` returns `false`.
fn visit_limited<'a>(
    iter: impl Iterator<Item = (&'a Vec<u8>, &'a Vec<u8>)>,
    limit: usize,
    mut visit: impl FnMut(&[u8], &[u8]) -> bool,
) {
    for (key, value) in iter.take(limit) {
        if !visit(key, value) {
            break;
        }
    }
}

impl OrderedStore for Memory {
    type Error = Infallible;

    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self
            .tables
            .get(&table)
            .and_then(|map| map.get(key))
            .cloned())
    }

    fn set(&mut self, table: Table, key: &[u8], value: &[u8]) -> Result<(), Self::Error> {
        self.tables
            .entry(table)
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, table: Table, key: &[u8]) -> Result<(), Self::Error> {
        if let Some(map) = self.tables.get_mut(&table) {
            map.remove(key);
            if map.is_empty() {
                self.tables.remove(&table);
            }
        }
        Ok(())
    }

    fn range(
        &self,
        table: Table,
        start: &[u8],
        end: &[u8],
        limit: usize,
        visit: impl FnMut(&[u8], &[u8]) -> bool,
    ) -> Result<(), Self::Error> {
        let Some(map) = self.tables.get(&table) else {
            return Ok(());
        };

        // BTreeMap::range panics on an empty exclusive range, so equal bounds are handled here.
        if start < end {
            let iter = map.range::<[u8], _>((Excluded(start), Excluded(end)));
            visit_limited(iter, limit, visit);
        } else if start > end {
            let iter = map.range::<[u8], _>((Excluded(end), Excluded(start))).rev();
            visit_limited(iter, limit, visit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: Table = Table::new(1);

    fn collect(store: &Memory, start: &[u8], end: &[u8], limit: usize) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        store
            .range(TABLE, start, end, limit, |key, _| {
                keys.push(key.to_vec());
                true
            })
            .unwrap();
        keys
    }

    #[test]
    fn test_memory_get_set_remove() {
        let mut store = Memory::new();
        assert!(store.is_empty(TABLE));
        assert_eq!(store.get(TABLE, b"a").unwrap(), None);

        store.set(TABLE, b"a", b"1").unwrap();
        store.set(TABLE, b"a", b"2").unwrap();
        assert_eq!(store.get(TABLE, b"a").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.len(TABLE), 1);

        // Tables are isolated
        assert_eq!(store.get(Table::new(2), b"a").unwrap(), None);

        store.remove(TABLE, b"a").unwrap();
        store.remove(TABLE, b"a").unwrap();
        assert!(store.is_empty(TABLE));
    }

    #[test]
    fn test_memory_range_direction() {
        let mut store = Memory::new();
        for key in [b"b", b"c", b"d", b"e"] {
            store.set(TABLE, key, &[]).unwrap();
        }

        // Ascending, both bounds exclusive
        assert_eq!(
            collect(&store, b"b", b"e", 10),
            vec![b"c".to_vec(), b"d".to_vec()]
        );

        // Descending when start > end
        assert_eq!(
            collect(&store, b"z", b"a", 10),
            vec![b"e".to_vec(), b"d".to_vec(), b"c".to_vec(), b"b".to_vec()]
        );

        // Limit applies from the start bound
        assert_eq!(collect(&store, b"z", b"a", 1), vec![b"e".to_vec()]);
        assert_eq!(collect(&store, b"a", b"z", 2), vec![b"b".to_vec(), b"c".to_vec()]);

        // Degenerate ranges
        assert!(collect(&store, b"c", b"c", 10).is_empty());
        assert!(collect(&store, b"a", b"z", 0).is_empty());
    }

    #[test]
    fn test_memory_range_early_stop() {
        let mut store = Memory::new();
        for key in [b"a", b"b", b"c"] {
            store.set(TABLE, key, key).unwrap();
        }
        let mut visited = Vec::new();
        store
            .range(TABLE, b"", b"z", 10, |key, value| {
                assert_eq!(key, value);
                visited.push(key.to_vec());
                visited.len() < 2
            })
            .unwrap();
        assert_eq!(visited, vec![b"a".to_vec(), b"b".to_vec()]);
    }
}
