//! Grouping: keyed sub-lists kept in sync with a parent SnapList.
//!
//! - A key selector maps each item to Some(key) or None (ungrouped).
//! - Every dispatched change updates the groups on the parent's dispatch turn:
//!   new items join their group (created on demand), old items leave it,
//!   empty groups are dropped.
//! - Bulk windows on the parent propagate to every group and to the grouped collection.
//! - Groups compare by identity.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::debug;

use crate::list::SnapList;
use crate::notify::CollectionChange;

pub type GroupKeySelector<T> = Arc<dyn Fn(&T) -> Option<String> + Send + Sync + 'static>;
pub type GroupHeaderInfo<T> = Arc<dyn Fn(&Group<T>) + Send + Sync + 'static>;

/// Display data for a group header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupHeader {
    pub text: String,
    pub subtext: Option<String>,
}

struct GroupInner<T> {
    key: String,
    items: SnapList<T>,
    header: Mutex<GroupHeader>,
}

/// One group: a key and the items mapped to it.
pub struct Group<T> {
    inner: Arc<GroupInner<T>>,
}

impl<T> Clone for Group<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PartialEq for Group<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> fmt::Debug for Group<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("key", &self.inner.key)
            .field("items", &self.inner.items)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Group<T> {
    fn new(key: String) -> Self {
        let header = GroupHeader {
            text: key.clone(),
            subtext: None,
        };
        Self {
            inner: Arc::new(GroupInner {
                key,
                items: SnapList::new(),
                header: Mutex::new(header),
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn items(&self) -> &SnapList<T> {
        &self.inner.items
    }

    pub fn len(&self) -> usize {
        self.inner.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.is_empty()
    }

    pub fn header(&self) -> GroupHeader {
        self.inner
            .header
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_header(&self, header: GroupHeader) {
        *self.inner.header.lock().unwrap_or_else(|e| e.into_inner()) = header;
    }
}

/// Hook the parent list calls on its dispatch path.
pub(crate) trait GroupIndex<T>: Send + Sync {
    fn apply(&self, change: &CollectionChange<T>);
    fn clear(&self);
    /// Rebuild from `items`; false if cancelled midway.
    fn rebuild(&self, items: &[T], cancel: &AtomicBool) -> bool;
    fn begin_bulk(&self);
    fn end_bulk(&self);
    fn groups(&self) -> Arc<SnapList<Group<T>>>;
}

struct Grouping<T> {
    selector: GroupKeySelector<T>,
    header_info: Option<GroupHeaderInfo<T>>,
    groups: Arc<SnapList<Group<T>>>,
    // key -> group; the mutex also serializes apply/rebuild/clear
    index: Mutex<HashMap<String, Group<T>>>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Grouping<T> {
    fn add_items(
        &self,
        index: &mut HashMap<String, Group<T>>,
        items: &[T],
        cancel: Option<&AtomicBool>,
    ) -> bool {
        for item in items {
            if cancel.map_or(false, |c| c.load(Ordering::Relaxed)) {
                return false;
            }
            let Some(key) = (self.selector)(item) else {
                continue;
            };

            if let Some(group) = index.get(&key) {
                group.items().add(item.clone());
                group.items().set_sorted(false);
                continue;
            }

            let group = Group::new(key.clone());
            if self.groups.is_bulk_operation_active() {
                group.items().begin_bulk_operation();
            }
            group.items().add(item.clone());
            if let Some(info) = &self.header_info {
                info(&group);
            }
            index.insert(key, group.clone());
            self.groups.add(group);
            self.groups.set_sorted(false);
        }
        true
    }

    fn remove_items(&self, index: &mut HashMap<String, Group<T>>, items: &[T]) {
        for item in items {
            let Some(key) = (self.selector)(item) else {
                continue;
            };
            let Some(group) = index.get(&key).cloned() else {
                continue;
            };
            group.items().remove(item);
            if group.is_empty() {
                index.remove(&key);
                self.groups.remove(&group);
            }
        }
    }

    fn lock_index(&self) -> std::sync::MutexGuard<'_, HashMap<String, Group<T>>> {
        self.index.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> GroupIndex<T> for Grouping<T> {
    fn apply(&self, change: &CollectionChange<T>) {
        let mut index = self.lock_index();
        if let Some(new_items) = &change.new_items {
            self.add_items(&mut index, new_items, None);
        }
        if let Some(old_items) = &change.old_items {
            self.remove_items(&mut index, old_items);
        }
    }

    fn clear(&self) {
        let mut index = self.lock_index();
        index.clear();
        self.groups.clear();
    }

    fn rebuild(&self, items: &[T], cancel: &AtomicBool) -> bool {
        let mut index = self.lock_index();
        index.clear();
        self.groups.clear();
        let done = self.add_items(&mut index, items, Some(cancel));
        debug!(
            "reset_groups: {} group(s) from {} item(s){}",
            index.len(),
            items.len(),
            if done { "" } else { " (cancelled)" }
        );
        done
    }

    fn begin_bulk(&self) {
        for group in self.groups.iter() {
            group.items().begin_bulk_operation();
        }
        self.groups.begin_bulk_operation();
    }

    fn end_bulk(&self) {
        for group in self.groups.iter() {
            group.items().end_bulk_operation();
        }
        self.groups.end_bulk_operation();
    }

    fn groups(&self) -> Arc<SnapList<Group<T>>> {
        self.groups.clone()
    }
}

impl<T: Clone + Send + Sync + 'static> SnapList<T> {
    pub fn is_grouped(&self) -> bool {
        self.group_index().is_some()
    }

    /// The grouped collection, if grouping is enabled.
    pub fn grouped(&self) -> Option<Arc<SnapList<Group<T>>>> {
        self.group_index().map(|gi| gi.groups())
    }

    /// Disable grouping and drop the grouped collection.
    pub fn clear_group_selector(&self) {
        self.on_turn(|_| {
            *self.grouping.write().unwrap_or_else(|e| e.into_inner()) = None;
        });
    }

    /// Rebuild every group from the current contents.
    /// Returns false if `cancel` was raised before it finished, or if grouping is off.
    ///
    /// The rebuild runs on its own dispatch turn: writes sealed earlier are in the
    /// copied contents, later ones reach the groups after it. Must not be called
    /// from a callback of this list.
    pub fn reset_groups(&self, cancel: &AtomicBool) -> bool {
        if !self.is_grouped() {
            return false;
        }
        self.on_turn(|items| match self.group_index() {
            Some(gi) => gi.rebuild(items, cancel),
            None => false,
        })
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> SnapList<T> {
    /// Enable grouping by `selector` and build groups from the current contents.
    /// Must not be called from a callback of this list.
    pub fn set_group_selector<F>(&self, selector: F)
    where
        F: Fn(&T) -> Option<String> + Send + Sync + 'static,
    {
        self.install_grouping(Arc::new(selector), None);
    }

    /// Like set_group_selector; `header_info` runs once for every newly created group.
    pub fn set_group_selector_with_header<F, H>(&self, selector: F, header_info: H)
    where
        F: Fn(&T) -> Option<String> + Send + Sync + 'static,
        H: Fn(&Group<T>) + Send + Sync + 'static,
    {
        self.install_grouping(Arc::new(selector), Some(Arc::new(header_info)));
    }

    fn install_grouping(&self, selector: GroupKeySelector<T>, header_info: Option<GroupHeaderInfo<T>>) {
        let grouping: Arc<dyn GroupIndex<T>> = Arc::new(Grouping {
            selector,
            header_info,
            groups: Arc::new(SnapList::new()),
            index: Mutex::new(HashMap::new()),
        });
        // Установка и первая сборка на одном ходу: записи до него уже в копии,
        // записи после него применятся к новым группам
        self.on_turn(|items| {
            let never = AtomicBool::new(false);
            grouping.rebuild(items, &never);
            *self.grouping.write().unwrap_or_else(|e| e.into_inner()) = Some(grouping);
        });
    }
}
