//! In-process change notifications for SnapList.
//!
//! Scope:
//! - Local (in-process) pub/sub: the writing thread publishes events after the
//!   write-gate is released.
//! - Subscribe to everything, to collection changes only, or to property changes only.
//! - Drop of SubscriptionHandle unsubscribes.
//!
//! Notes:
//! - Callbacks are executed synchronously in the writer thread. They may read the
//!   list, but must not write to it: a nested write waits for its own dispatch turn,
//!   which never comes while the outer callback runs.
//!   Keep callbacks fast; if you need heavier work, hand it to another thread.
//! - Delivery order equals write order. Every write takes a ticket from the
//!   Sequencer while it holds the write-gate, and dispatches only on its turn.

use std::collections::BTreeMap;
use std::sync::{Arc, Condvar, Mutex, Weak};

/// Kind of collection change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeAction {
    Add,
    Remove,
    Replace,
    Reset,
}

/// Payload of a collection change:
/// - new_items: items that entered the list (Add/Replace)
/// - old_items: items that left the list (Remove/Replace)
/// - index: position of the first affected item, None for Reset
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionChange<T> {
    pub action: ChangeAction,
    pub new_items: Option<Vec<T>>,
    pub old_items: Option<Vec<T>>,
    pub index: Option<usize>,
}

impl<T> CollectionChange<T> {
    pub fn add(items: Vec<T>, index: usize) -> Self {
        Self {
            action: ChangeAction::Add,
            new_items: Some(items),
            old_items: None,
            index: Some(index),
        }
    }

    pub fn remove(items: Vec<T>, index: usize) -> Self {
        Self {
            action: ChangeAction::Remove,
            new_items: None,
            old_items: Some(items),
            index: Some(index),
        }
    }

    pub fn replace(new_items: Vec<T>, old_items: Vec<T>, index: usize) -> Self {
        Self {
            action: ChangeAction::Replace,
            new_items: Some(new_items),
            old_items: Some(old_items),
            index: Some(index),
        }
    }

    pub fn reset() -> Self {
        Self {
            action: ChangeAction::Reset,
            new_items: None,
            old_items: None,
            index: None,
        }
    }
}

/// Observable properties of a list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Property {
    /// Item count.
    Count,
    /// The indexer ("Item[]"): some position now holds a different item.
    Items,
}

impl Property {
    pub fn name(&self) -> &'static str {
        match self {
            Property::Count => "Count",
            Property::Items => "Item[]",
        }
    }
}

/// A single event emitted by a list.
#[derive(Clone, Debug, PartialEq)]
pub enum ListEvent<T> {
    PropertyChanged(Property),
    CollectionChanged(CollectionChange<T>),
}

impl<T> ListEvent<T> {
    pub fn as_collection(&self) -> Option<&CollectionChange<T>> {
        match self {
            ListEvent::CollectionChanged(c) => Some(c),
            ListEvent::PropertyChanged(_) => None,
        }
    }

    pub fn as_property(&self) -> Option<Property> {
        match self {
            ListEvent::PropertyChanged(p) => Some(*p),
            ListEvent::CollectionChanged(_) => None,
        }
    }
}

/// Which events a subscriber receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Collection,
    Property,
}

impl EventFilter {
    fn matches<T>(&self, ev: &ListEvent<T>) -> bool {
        match (self, ev) {
            (EventFilter::All, _) => true,
            (EventFilter::Collection, ListEvent::CollectionChanged(_)) => true,
            (EventFilter::Property, ListEvent::PropertyChanged(_)) => true,
            _ => false,
        }
    }
}

pub type Callback<T> = Arc<dyn Fn(&ListEvent<T>) + Send + Sync + 'static>;

struct SubInner<T> {
    next_id: u64,
    subs: BTreeMap<u64, (EventFilter, Callback<T>)>, // id -> (filter, cb); ordered by subscription
}

impl<T> Default for SubInner<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subs: BTreeMap::new(),
        }
    }
}

/// Subscription registry (held inside SnapList).
pub struct SubRegistry<T> {
    inner: Mutex<SubInner<T>>,
}

impl<T: 'static> SubRegistry<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(SubInner::default()),
        })
    }

    /// Subscribe for events passing `filter`.
    /// Returns a handle; dropping it unsubscribes.
    pub fn subscribe(self: &Arc<Self>, filter: EventFilter, cb: Callback<T>) -> SubscriptionHandle {
        let mut g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = g.next_id;
        g.next_id = g.next_id.wrapping_add(1);
        g.subs.insert(id, (filter, cb));
        drop(g);

        let weak: Weak<Self> = Arc::downgrade(self);
        SubscriptionHandle {
            id,
            unsub: Some(Box::new(move |id| {
                if let Some(reg) = weak.upgrade() {
                    reg.unsubscribe(id);
                }
            })),
        }
    }

    pub fn has_subscribers(&self) -> bool {
        !self
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .subs
            .is_empty()
    }

    /// Publish an event to all subscribers whose filter matches.
    pub fn publish(&self, ev: &ListEvent<T>) -> usize {
        let callbacks: Vec<Callback<T>> = {
            let g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            g.subs
                .values()
                .filter_map(|(filter, cb)| {
                    if filter.matches(ev) {
                        Some(cb.clone())
                    } else {
                        None
                    }
                })
                .collect()
        };
        // Execute outside the lock
        let n = callbacks.len();
        for cb in callbacks {
            cb(ev);
        }
        n
    }

    fn unsubscribe(&self, id: u64) {
        let mut g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        g.subs.remove(&id);
    }
}

/// RAII handle: unsubscribes on drop.
pub struct SubscriptionHandle {
    id: u64,
    unsub: Option<Box<dyn FnOnce(u64) + Send + Sync>>,
}

impl SubscriptionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(unsub) = self.unsub.take() {
            unsub(self.id);
        }
    }
}

/// Public helper for building callbacks.
pub fn callback<T, F>(f: F) -> Callback<T>
where
    F: Fn(&ListEvent<T>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Hands out dispatch tickets and admits them strictly in order.
///
/// Tickets are taken under the write-gate; `wait_turn` is called after the gate
/// is released, so a dispatching callback never blocks readers.
pub struct Sequencer {
    next_turn: Mutex<u64>,
    cv: Condvar,
}

/// Proof of holding the dispatch turn. Dropping it passes the turn on.
pub struct Turn<'a> {
    seq: &'a Sequencer,
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            next_turn: Mutex::new(0),
            cv: Condvar::new(),
        }
    }

    /// Block until `ticket` is the next one to dispatch.
    pub fn wait_turn(&self, ticket: u64) -> Turn<'_> {
        let mut g = self.next_turn.lock().unwrap_or_else(|e| e.into_inner());
        while *g != ticket {
            g = self.cv.wait(g).unwrap_or_else(|e| e.into_inner());
        }
        Turn { seq: self }
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        // Runs on unwind too, so a panicking callback does not stall later writers.
        let mut g = self.seq.next_turn.lock().unwrap_or_else(|e| e.into_inner());
        *g = g.wrapping_add(1);
        drop(g);
        self.seq.cv.notify_all();
    }
}
