//! Batched writes: one gate acquisition and one notification per call,
//! however many items the batch carries.

use super::core::SnapList;
use crate::metrics;
use crate::notify::CollectionChange;

impl<T: Clone + Send + Sync + 'static> SnapList<T> {
    /// Append all `items`. Raises one Add carrying the batch at its start index.
    /// An empty batch is a no-op.
    pub fn add_range<I: IntoIterator<Item = T>>(&self, items: I) {
        let batch: Vec<T> = items.into_iter().collect();
        if batch.is_empty() {
            return;
        }

        let mut g = self.items.write();
        let index = g.vec.len();
        g.vec.extend(batch.iter().cloned());
        let p = self.seal(&mut g, vec![CollectionChange::add(batch, index)]);
        drop(g);

        metrics::record_range_write();
        self.dispatch(p);
    }

    /// Insert all `items` at `index`. Raises one Add.
    ///
    /// Panics if `index > len`.
    pub fn insert_range<I: IntoIterator<Item = T>>(&self, index: usize, items: I) {
        let batch: Vec<T> = items.into_iter().collect();
        if batch.is_empty() {
            return;
        }

        let mut g = self.items.write();
        let len = g.vec.len();
        assert!(index <= len, "insert_range index {} out of range (len {})", index, len);
        g.vec.splice(index..index, batch.iter().cloned());
        let p = self.seal(&mut g, vec![CollectionChange::add(batch, index)]);
        drop(g);

        metrics::record_range_write();
        self.dispatch(p);
    }

    /// Remove `count` items starting at `index`. Raises one Remove carrying them.
    /// `count == 0` is a no-op.
    ///
    /// Panics if the range runs past the end.
    pub fn remove_range(&self, index: usize, count: usize) {
        if count == 0 {
            return;
        }

        let mut g = self.items.write();
        let len = g.vec.len();
        assert!(
            index <= len && count <= len - index,
            "remove_range {}..{} out of range (len {})",
            index,
            index.saturating_add(count),
            len
        );
        let removed: Vec<T> = g.vec.drain(index..index + count).collect();
        let p = self.seal(&mut g, vec![CollectionChange::remove(removed, index)]);
        drop(g);

        metrics::record_range_write();
        self.dispatch(p);
    }

    /// Overwrite `items.len()` items starting at `index`.
    /// Raises one Replace with old and new items.
    ///
    /// Panics if the range runs past the end.
    pub fn replace_range<I: IntoIterator<Item = T>>(&self, index: usize, items: I) {
        let batch: Vec<T> = items.into_iter().collect();
        if batch.is_empty() {
            return;
        }

        let mut g = self.items.write();
        let p = self.replace_locked(&mut g, index, batch);
        drop(g);

        metrics::record_range_write();
        self.dispatch(p);
    }

    pub(crate) fn replace_locked(
        &self,
        g: &mut super::core::Items<T>,
        index: usize,
        batch: Vec<T>,
    ) -> super::core::Pending<T> {
        let len = g.vec.len();
        let n = batch.len();
        assert!(
            index <= len && n <= len - index,
            "replace_range {}..{} out of range (len {})",
            index,
            index.saturating_add(n),
            len
        );
        let old: Vec<T> = g.vec.splice(index..index + n, batch.iter().cloned()).collect();
        self.seal(g, vec![CollectionChange::replace(batch, old, index)])
    }
}
