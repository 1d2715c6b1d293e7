use std::sync::atomic::Ordering;
use std::sync::Arc;

use log::debug;

use super::core::SnapList;
use crate::metrics;
use crate::snapshot::{Snapshot, SnapshotIter};

impl<T: Clone + Send + Sync + 'static> SnapList<T> {
    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.read().view().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item at `index`, or None when out of range.
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.read().view().get(index).cloned()
    }

    /// Run `f` over a snapshot of the items. No gate is held while `f` runs,
    /// so `f` may read (or write) this list; its view stays the snapshot.
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let snap = self.snapshot();
        f(&snap)
    }

    /// Copy all items into `dest` starting at `dest_index`.
    ///
    /// Panics if `dest` is too short, as slice copies do.
    pub fn copy_to(&self, dest: &mut [T], dest_index: usize) {
        let g = self.items.read();
        let src = g.view();
        let end = dest_index + src.len();
        assert!(
            end <= dest.len(),
            "copy_to: destination too short (need {}, have {})",
            end,
            dest.len()
        );
        dest[dest_index..end].clone_from_slice(src);
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.read().view().to_vec()
    }

    /// Point-in-time view of the contents.
    ///
    /// Under the snapshot-gate: the cached snapshot is reused unless a write
    /// happened since it was taken; otherwise the items are copied once and the
    /// copy replaces the cache.
    pub fn snapshot(&self) -> Snapshot<T> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if cache.version() == self.version.load(Ordering::Acquire) {
            metrics::record_snapshot_reuse();
            return cache.clone();
        }

        let g = self.items.read();
        if let Some(frozen) = &g.frozen {
            // Isolated bulk window: readers keep seeing the frozen contents.
            metrics::record_snapshot_reuse();
            return frozen.clone();
        }
        let snap = Snapshot::new(Arc::new(g.vec.clone()), g.version);
        drop(g);

        metrics::record_snapshot_materialized(snap.len());
        debug!(
            "snapshot: materialized {} item(s) at version {}",
            snap.len(),
            snap.version()
        );
        *cache = snap.clone();
        snap
    }

    /// True if the next iteration would have to copy the items.
    pub fn snapshot_is_stale(&self) -> bool {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.version() != self.version.load(Ordering::Acquire)
    }

    /// Iterate over a snapshot of the contents. Later writes never affect it.
    pub fn iter(&self) -> SnapshotIter<T> {
        self.snapshot().into_iter()
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> SnapList<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.items.read().view().contains(item)
    }

    /// Position of the first item equal to `item`.
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.items.read().view().iter().position(|x| x == item)
    }
}

impl<'a, T: Clone + Send + Sync + 'static> IntoIterator for &'a SnapList<T> {
    type Item = T;
    type IntoIter = SnapshotIter<T>;

    fn into_iter(self) -> SnapshotIter<T> {
        self.iter()
    }
}
