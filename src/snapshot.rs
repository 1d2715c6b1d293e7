//! Immutable point-in-time views handed out by SnapList.
//!
//! A Snapshot shares its storage with the list's snapshot cache. The cache only
//! ever replaces the Arc wholesale, so a Snapshot (and every iterator made from
//! it) stays valid and unchanged after later writes.

use std::ops::Deref;
use std::sync::Arc;

#[derive(Debug)]
pub struct Snapshot<T> {
    items: Arc<Vec<T>>,
    version: u64,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            version: self.version,
        }
    }
}

impl<T> Snapshot<T> {
    pub(crate) fn new(items: Arc<Vec<T>>, version: u64) -> Self {
        Self { items, version }
    }

    pub(crate) fn empty() -> Self {
        Self::new(Arc::new(Vec::new()), 0)
    }

    /// Content version of the list at the time this snapshot was taken.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// True if both snapshots are the same materialization (no copy happened in between).
    pub fn shares_storage(&self, other: &Snapshot<T>) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl<T: Clone> Snapshot<T> {
    /// Owning iterator over the snapshot; independent cursor per call.
    pub fn iter(&self) -> SnapshotIter<T> {
        SnapshotIter {
            items: self.items.clone(),
            front: 0,
            back: self.items.len(),
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.as_ref().clone()
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T: PartialEq> PartialEq for Snapshot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items.as_slice() == other.items.as_slice()
    }
}

impl<T: Clone> IntoIterator for Snapshot<T> {
    type Item = T;
    type IntoIter = SnapshotIter<T>;

    fn into_iter(self) -> SnapshotIter<T> {
        let back = self.items.len();
        SnapshotIter {
            items: self.items,
            front: 0,
            back,
        }
    }
}

impl<'a, T: Clone> IntoIterator for &'a Snapshot<T> {
    type Item = T;
    type IntoIter = SnapshotIter<T>;

    fn into_iter(self) -> SnapshotIter<T> {
        self.iter()
    }
}

/// Iterator yielding clones of the snapshot's items.
/// Keeps the snapshot storage alive for as long as it exists.
#[derive(Debug)]
pub struct SnapshotIter<T> {
    items: Arc<Vec<T>>,
    front: usize,
    back: usize,
}

impl<T: Clone> Iterator for SnapshotIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front >= self.back {
            return None;
        }
        let item = self.items[self.front].clone();
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<T: Clone> DoubleEndedIterator for SnapshotIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.items[self.back].clone())
    }
}

impl<T: Clone> ExactSizeIterator for SnapshotIter<T> {}

impl<T: Clone> std::iter::FusedIterator for SnapshotIter<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterators_are_independent_cursors() {
        let snap = Snapshot::new(Arc::new(vec![1, 2, 3]), 1);
        let mut a = snap.iter();
        assert_eq!(a.next(), Some(1));
        let b: Vec<i32> = snap.iter().collect();
        assert_eq!(b, vec![1, 2, 3]);
        assert_eq!(a.len(), 2);
        assert_eq!(a.next_back(), Some(3));
        assert_eq!(a.next(), Some(2));
        assert_eq!(a.next(), None);
    }
}
