//! An ordered, byte-keyed store partitioned into tables.
//!
//! [OrderedStore] is the only persistence surface the indices in this crate depend on. Keys compare
//! lexicographically by their raw bytes, so any composite key written through it must use an
//! order-preserving, fixed-width encoding of its fields.
//!
//! # Range Scans
//!
//! [OrderedStore::range] visits keys strictly between `start` and `end`. The direction of the scan
//! is implied by the bounds: ascending when `start < end` and descending (starting next to `start`
//! and moving toward `end`) when `start > end`. Because both bounds are exclusive, callers form
//! inclusive scans with [predecessor] and whole-prefix scans with [successor].

mod memory;
pub use memory::Memory;

use std::fmt::Display;

/// Identifier of a table within an [OrderedStore].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Table(u32);

impl Table {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn id(&self) -> u32 {
        self.0
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "table_{}", self.0)
    }
}

/// A persistent sorted map from byte keys to opaque values.
pub trait OrderedStore {
    /// The error raised by the underlying storage.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Get the value stored at `key`.
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Store `value` at `key`, overwriting any previous value.
    fn set(&mut self, table: Table, key: &[u8], value: &[u8]) -> Result<(), Self::Error>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&mut self, table: Table, key: &[u8]) -> Result<(), Self::Error>;

    /// Visit at most `limit` keys (and their values) strictly between `start` and `end`, in the
    /// direction implied by the bounds, until `visit` returns `false`.
    fn range(
        &self,
        table: Table,
        start: &[u8],
        end: &[u8],
        limit: usize,
        visit: impl FnMut(&[u8], &[u8]) -> bool,
    ) -> Result<(), Self::Error>;
}

impl<S: OrderedStore> OrderedStore for &mut S {
    type Error = S::Error;

    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, Self::Error> {
        (**self).get(table, key)
    }

    fn set(&mut self, table: Table, key: &[u8], value: &[u8]) -> Result<(), Self::Error> {
        (**self).set(table, key, value)
    }

    fn remove(&mut self, table: Table, key: &[u8]) -> Result<(), Self::Error> {
        (**self).remove(table, key)
    }

    fn range(
        &self,
        table: Table,
        start: &[u8],
        end: &[u8],
        limit: usize,
        visit: impl FnMut(&[u8], &[u8]) -> bool,
    ) -> Result<(), Self::Error> {
        (**self).range(table, start, end, limit, visit)
    }
}

/// Returns the smallest key greater than every key that starts with `prefix`, or `None` if no such
/// key exists (the prefix is empty or consists only of `0xff` bytes).
pub fn successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut key = prefix.to_vec();
    while let Some(last) = key.last_mut() {
        if *last < u8::MAX {
            *last += 1;
            return Some(key);
        }
        key.pop();
    }
    None
}

/// Returns the largest key of the same length that is smaller than `key`, or `None` if `key` is
/// all zeroes.
pub fn predecessor(key: &[u8]) -> Option<Vec<u8>> {
    let mut prev = key.to_vec();
    for byte in prev.iter_mut().rev() {
        if *byte > 0 {
            *byte -= 1;
            return Some(prev);
        }
        *byte = u8::MAX;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successor() {
        assert_eq!(successor(&[1, 2, 3]), Some(vec![1, 2, 4]));
        assert_eq!(successor(&[1, 2, 0xff]), Some(vec![1, 3]));
        assert_eq!(successor(&[0xff, 0xff]), None);
        assert_eq!(successor(&[]), None);

        // Every key carrying the prefix sorts before its successor
        let prefix = [4u8, 0xff];
        let bound = successor(&prefix).unwrap();
        assert!([4u8, 0xff, 0xff, 0xff].as_slice() < bound.as_slice());
        assert!(prefix.as_slice() < bound.as_slice());
    }

    #[test]
    fn test_predecessor() {
        assert_eq!(predecessor(&[1, 2, 3]), Some(vec![1, 2, 2]));
        assert_eq!(predecessor(&[1, 0, 0]), Some(vec![0, 0xff, 0xff]));
        assert_eq!(predecessor(&[0, 0]), None);

        // Nothing of the same length sits between a key and its predecessor
        let key = [3u8, 0];
        let prev = predecessor(&key).unwrap();
        assert_eq!(prev, vec![2, 0xff]);
        assert!(prev.as_slice() < key.as_slice());
    }
}
