use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use log::trace;

use crate::config::{ListBuilder, ListConfig};
use crate::gate::Gate;
use crate::group::GroupIndex;
use crate::metrics;
use crate::notify::{
    callback, CollectionChange, EventFilter, ListEvent, Property, Sequencer, SubRegistry,
    SubscriptionHandle,
};
use crate::snapshot::Snapshot;

/// State guarded by the write-gate.
pub(crate) struct Items<T> {
    pub(crate) vec: Vec<T>,
    /// Content version; bumped by every mutation.
    pub(crate) version: u64,
    /// Next dispatch ticket.
    pub(crate) next_ticket: u64,
    pub(crate) bulk: bool,
    /// Contents frozen at begin_bulk_operation (BulkIsolation::Isolated only).
    pub(crate) frozen: Option<Snapshot<T>>,
}

impl<T> Items<T> {
    /// What readers see: the frozen view during an isolated bulk window, else the live items.
    pub(crate) fn view(&self) -> &[T] {
        match &self.frozen {
            Some(f) => f.as_slice(),
            None => &self.vec,
        }
    }
}

/// What a dispatch turn does to the groups before applying its changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum GroupOp {
    None,
    Clear,
    BeginBulk,
    EndBulk,
}

/// Notifications produced by one write, waiting for their dispatch turn.
pub(crate) struct Pending<T> {
    pub(crate) ticket: u64,
    pub(crate) changes: Vec<CollectionChange<T>>,
    pub(crate) suppressed: bool,
    pub(crate) groups: GroupOp,
}

/// Concurrent, observable, snapshot-isolated list.
///
/// - Reads (`len`, `get`, `contains`, ...) share the gate with each other and
///   exclude writers.
/// - Writes are linearized by the gate; each raises one change notification
///   (Count + Item[] property events precede it) unless a bulk window is open.
/// - Iteration goes through a cached snapshot that is re-materialized only
///   after a write.
pub struct SnapList<T> {
    pub(crate) items: Gate<Items<T>>,
    /// Snapshot-gate: cached snapshot, independent of the write-gate.
    pub(crate) cache: Mutex<Snapshot<T>>,
    /// Mirror of Items::version readable without the gate.
    pub(crate) version: AtomicU64,
    pub(crate) seq: Sequencer,
    pub(crate) subs: Arc<SubRegistry<T>>,
    pub(crate) grouping: RwLock<Option<Arc<dyn GroupIndex<T>>>>,
    pub(crate) is_sorted: AtomicBool,
    pub(crate) cfg: ListConfig,
}

impl<T: Clone + Send + Sync + 'static> SnapList<T> {
    /// Empty list with default configuration.
    pub fn new() -> Self {
        Self::with_config(ListConfig::default())
    }

    pub fn with_config(cfg: ListConfig) -> Self {
        Self {
            items: Gate::new(Items {
                vec: Vec::new(),
                version: 0,
                next_ticket: 0,
                bulk: false,
                frozen: None,
            }),
            cache: Mutex::new(Snapshot::empty()),
            version: AtomicU64::new(0),
            seq: Sequencer::new(),
            subs: SubRegistry::new(),
            grouping: RwLock::new(None),
            is_sorted: AtomicBool::new(false),
            cfg,
        }
    }

    /// List pre-filled with `items` (same as `new` + `add_range`).
    pub fn from_items<I: IntoIterator<Item = T>>(items: I) -> Self {
        let list = Self::new();
        list.add_range(items);
        list
    }

    pub fn builder() -> ListBuilder {
        ListBuilder::new()
    }

    pub fn config(&self) -> &ListConfig {
        &self.cfg
    }

    /// Subscribe to every event (property and collection changes).
    pub fn subscribe<F>(&self, f: F) -> SubscriptionHandle
    where
        F: Fn(&ListEvent<T>) + Send + Sync + 'static,
    {
        self.subs.subscribe(EventFilter::All, callback(f))
    }

    /// Subscribe to collection changes only.
    pub fn on_collection_changed<F>(&self, f: F) -> SubscriptionHandle
    where
        F: Fn(&CollectionChange<T>) + Send + Sync + 'static,
    {
        self.subs.subscribe(
            EventFilter::Collection,
            callback(move |ev: &ListEvent<T>| {
                if let Some(c) = ev.as_collection() {
                    f(c)
                }
            }),
        )
    }

    /// Subscribe to property changes only (Count, Item[]).
    pub fn on_property_changed<F>(&self, f: F) -> SubscriptionHandle
    where
        F: Fn(Property) + Send + Sync + 'static,
    {
        self.subs.subscribe(
            EventFilter::Property,
            callback(move |ev: &ListEvent<T>| {
                if let Some(p) = ev.as_property() {
                    f(p)
                }
            }),
        )
    }

    /// Record a mutation: bump the content version and take a dispatch ticket.
    /// Must be called with the write-gate held, after the backing vector changed.
    pub(crate) fn seal(&self, g: &mut Items<T>, changes: Vec<CollectionChange<T>>) -> Pending<T> {
        g.version += 1;
        self.version.store(g.version, Ordering::Release);
        self.ticket(g, changes)
    }

    /// Take a dispatch ticket without touching the content version.
    pub(crate) fn ticket(&self, g: &mut Items<T>, changes: Vec<CollectionChange<T>>) -> Pending<T> {
        let ticket = g.next_ticket;
        g.next_ticket = g.next_ticket.wrapping_add(1);
        Pending {
            ticket,
            changes,
            suppressed: g.bulk,
            groups: GroupOp::None,
        }
    }

    /// Run `f` on its own dispatch turn, after every write sealed before the call
    /// and before every write sealed after it. `f` gets the contents as of that point.
    ///
    /// Blocks behind pending dispatches, so it must not be called from a callback
    /// of this list.
    pub(crate) fn on_turn<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let mut g = self.items.write();
        let items = g.vec.clone();
        let p = self.ticket(&mut g, Vec::new());
        drop(g);

        let _turn = self.seq.wait_turn(p.ticket);
        f(&items)
    }

    /// Deliver a write's notifications on its turn. Call after releasing the gate.
    pub(crate) fn dispatch(&self, p: Pending<T>) {
        let _turn = self.seq.wait_turn(p.ticket);
        let groups = self.group_index();

        if let Some(gi) = &groups {
            match p.groups {
                GroupOp::None => {}
                GroupOp::Clear => gi.clear(),
                GroupOp::BeginBulk => gi.begin_bulk(),
                GroupOp::EndBulk => gi.end_bulk(),
            }
        }

        for change in p.changes {
            let ev = ListEvent::CollectionChanged(change);
            if p.suppressed {
                metrics::record_notification_suppressed();
            } else {
                let mut n = self.subs.publish(&ListEvent::PropertyChanged(Property::Count));
                n += self.subs.publish(&ListEvent::PropertyChanged(Property::Items));
                n += self.subs.publish(&ev);
                metrics::record_notifications_published(n);
                trace!("dispatch: ticket={} delivered to {} callback(s)", p.ticket, n);
            }

            if let (Some(gi), ListEvent::CollectionChanged(c)) = (&groups, &ev) {
                gi.apply(c);
            }
        }
    }

    pub(crate) fn group_index(&self) -> Option<Arc<dyn GroupIndex<T>>> {
        self.grouping
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for SnapList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SnapList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug не должен блокироваться на занятом gate
        match self.items.try_read() {
            Some(g) => f
                .debug_struct("SnapList")
                .field("count", &g.vec.len())
                .field("version", &g.version)
                .field("bulk", &g.bulk)
                .finish(),
            None => f.debug_struct("SnapList").field("count", &"<locked>").finish(),
        }
    }
}
