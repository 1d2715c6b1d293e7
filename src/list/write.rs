use super::core::{GroupOp, SnapList};
use crate::metrics;
use crate::notify::CollectionChange;

impl<T: Clone + Send + Sync + 'static> SnapList<T> {
    /// Append one item. Raises Add at the new index.
    pub fn add(&self, item: T) {
        let mut g = self.items.write();
        let index = g.vec.len();
        g.vec.push(item.clone());
        let p = self.seal(&mut g, vec![CollectionChange::add(vec![item], index)]);
        drop(g);

        metrics::record_write();
        self.dispatch(p);
    }

    /// Insert one item at `index`. Raises Add.
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, item: T) {
        let mut g = self.items.write();
        let len = g.vec.len();
        assert!(index <= len, "insert index {} out of range (len {})", index, len);
        g.vec.insert(index, item.clone());
        let p = self.seal(&mut g, vec![CollectionChange::add(vec![item], index)]);
        drop(g);

        metrics::record_write();
        self.dispatch(p);
    }

    /// Replace the item at `index`, returning the previous one. Raises Replace.
    ///
    /// Panics if `index >= len`.
    pub fn set(&self, index: usize, value: T) -> T {
        let mut g = self.items.write();
        let len = g.vec.len();
        assert!(index < len, "set index {} out of range (len {})", index, len);
        let old = std::mem::replace(&mut g.vec[index], value.clone());
        let p = self.seal(
            &mut g,
            vec![CollectionChange::replace(vec![value], vec![old.clone()], index)],
        );
        drop(g);

        metrics::record_write();
        self.dispatch(p);
        old
    }

    /// Remove and return the item at `index`. Raises Remove.
    ///
    /// Panics if `index >= len`.
    pub fn remove_at(&self, index: usize) -> T {
        let mut g = self.items.write();
        let len = g.vec.len();
        assert!(index < len, "remove_at index {} out of range (len {})", index, len);
        let item = g.vec.remove(index);
        let p = self.seal(&mut g, vec![CollectionChange::remove(vec![item.clone()], index)]);
        drop(g);

        metrics::record_write();
        self.dispatch(p);
        item
    }

    /// Remove every item. Raises Reset and empties the groups.
    pub fn clear(&self) {
        let mut g = self.items.write();
        g.vec.clear();
        let mut p = self.seal(&mut g, vec![CollectionChange::reset()]);
        p.groups = GroupOp::Clear;
        drop(g);

        metrics::record_write();
        self.dispatch(p);
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> SnapList<T> {
    /// Remove the first item equal to `item`.
    /// Returns false (and raises nothing) when it is absent.
    pub fn remove(&self, item: &T) -> bool {
        let mut g = self.items.write();
        let Some(index) = g.vec.iter().position(|x| x == item) else {
            return false;
        };
        let removed = g.vec.remove(index);
        let p = self.seal(&mut g, vec![CollectionChange::remove(vec![removed], index)]);
        drop(g);

        metrics::record_write();
        self.dispatch(p);
        true
    }
}
