use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::Ordering;

use super::core::SnapList;
use crate::metrics;
use crate::notify::CollectionChange;

impl<T: Clone + Send + Sync + 'static> SnapList<T> {
    pub fn is_sorted(&self) -> bool {
        self.is_sorted.load(Ordering::Acquire)
    }

    pub fn set_sorted(&self, on: bool) {
        self.is_sorted.store(on, Ordering::Release);
    }

    /// Stable sort under one gate acquisition. Raises Reset and marks the list sorted.
    pub fn sort_by<F>(&self, cmp: F)
    where
        F: FnMut(&T, &T) -> CmpOrdering,
    {
        let mut g = self.items.write();
        g.vec.sort_by(cmp);
        let p = self.seal(&mut g, vec![CollectionChange::reset()]);
        drop(g);

        self.set_sorted(true);
        metrics::record_write();
        self.dispatch(p);
    }

    pub fn sort_by_key<K, F>(&self, mut key: F)
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.sort_by(|a, b| key(a).cmp(&key(b)))
    }

    /// Reorder through `f`, which receives the current items and returns the new order.
    /// The leading `result.len()` items are replaced atomically (one Replace).
    ///
    /// `f` runs under the write-gate and must not touch this list.
    /// Panics if `f` returns more items than the list holds.
    pub fn order_by<F>(&self, f: F)
    where
        F: FnOnce(&[T]) -> Vec<T>,
    {
        let mut g = self.items.write();
        let result = f(&g.vec);
        if result.is_empty() {
            return;
        }
        let p = self.replace_locked(&mut g, 0, result);
        drop(g);

        metrics::record_range_write();
        self.dispatch(p);
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> SnapList<T> {
    /// Move `item` to where `f` would place it.
    ///
    /// `f` computes the desired order of the current items; `item` is removed
    /// (Remove) and re-inserted at its position in that order (Add), all under
    /// one gate acquisition. If `f`'s order does not contain `item`, it is only removed.
    pub fn order_one<F>(&self, f: F, item: &T)
    where
        F: FnOnce(&[T]) -> Vec<T>,
    {
        let mut g = self.items.write();
        let result = f(&g.vec);

        let mut changes = Vec::with_capacity(2);
        if let Some(pos) = g.vec.iter().position(|x| x == item) {
            let removed = g.vec.remove(pos);
            changes.push(CollectionChange::remove(vec![removed], pos));
        }
        if let Some(target) = result.iter().position(|x| x == item) {
            let at = target.min(g.vec.len());
            g.vec.insert(at, item.clone());
            changes.push(CollectionChange::add(vec![item.clone()], at));
        }
        if changes.is_empty() {
            return;
        }
        let p = self.seal(&mut g, changes);
        drop(g);

        metrics::record_write();
        self.dispatch(p);
    }
}

impl<T: Clone + Ord + Send + Sync + 'static> SnapList<T> {
    pub fn sort(&self) {
        self.sort_by(|a, b| a.cmp(b))
    }
}
