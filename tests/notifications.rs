use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use snaplist::{ChangeAction, CollectionChange, ListEvent, Property, SnapList};

fn events_of<T: Clone + Send + Sync + 'static>(
    list: &SnapList<T>,
) -> (Arc<Mutex<Vec<ListEvent<T>>>>, snaplist::SubscriptionHandle) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let e2 = events.clone();
    let h = list.subscribe(move |ev: &ListEvent<T>| e2.lock().unwrap().push(ev.clone()));
    (events, h)
}

#[test]
fn property_events_precede_collection_event() {
    let list = SnapList::new();
    let (events, _h) = events_of(&list);

    list.add("a");
    let got = events.lock().unwrap().clone();
    assert_eq!(
        got,
        vec![
            ListEvent::PropertyChanged(Property::Count),
            ListEvent::PropertyChanged(Property::Items),
            ListEvent::CollectionChanged(CollectionChange::add(vec!["a"], 0)),
        ]
    );
    assert_eq!(Property::Items.name(), "Item[]");
}

#[test]
fn bulk_window_raises_exactly_one_reset() {
    let list = SnapList::new();
    let (events, _h) = events_of(&list);

    list.begin_bulk_operation();
    list.add("a");
    list.add("b");
    assert!(list.is_bulk_operation_active());
    assert!(events.lock().unwrap().is_empty(), "suppressed inside the window");
    list.end_bulk_operation();

    let got = events.lock().unwrap().clone();
    let collection: Vec<&CollectionChange<&str>> =
        got.iter().filter_map(|e| e.as_collection()).collect();
    assert_eq!(collection.len(), 1);
    assert_eq!(collection[0].action, ChangeAction::Reset);
    assert_eq!(list.to_vec(), vec!["a", "b"]);
    assert!(!list.is_bulk_operation_active());
}

#[test]
fn nested_begin_is_idempotent() {
    let list = SnapList::new();
    let resets = Arc::new(AtomicUsize::new(0));
    let r2 = resets.clone();
    let _h = list.on_collection_changed(move |c| {
        if c.action == ChangeAction::Reset {
            r2.fetch_add(1, Ordering::SeqCst);
        }
    });

    list.begin_bulk_operation();
    list.begin_bulk_operation();
    list.add(1);
    list.end_bulk_operation();
    // Окно закрыто первым же end
    assert!(!list.is_bulk_operation_active());
    assert_eq!(resets.load(Ordering::SeqCst), 1);

    list.add(2);
    assert_eq!(resets.load(Ordering::SeqCst), 1);
}

#[test]
fn end_without_begin_still_resets() {
    let list: SnapList<u32> = SnapList::new();
    let (events, _h) = events_of(&list);
    list.end_bulk_operation();
    let got = events.lock().unwrap().clone();
    assert_eq!(got.len(), 3);
    assert_eq!(
        got[2],
        ListEvent::CollectionChanged(CollectionChange::reset())
    );
}

#[test]
fn bulk_guard_closes_window_on_drop() {
    let list = SnapList::new();
    let (events, _h) = events_of(&list);
    {
        let g = list.bulk();
        g.list().add_range(0..10);
        assert!(events.lock().unwrap().is_empty());
    }
    assert!(!list.is_bulk_operation_active());
    let got = events.lock().unwrap().clone();
    assert_eq!(got.last(), Some(&ListEvent::CollectionChanged(CollectionChange::reset())));
}

#[test]
fn dropping_handle_unsubscribes() {
    let list = SnapList::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let h2 = hits.clone();
    let handle = list.on_property_changed(move |p| {
        if p == Property::Count {
            h2.fetch_add(1, Ordering::SeqCst);
        }
    });

    list.add(1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    drop(handle);
    list.add(2);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn callbacks_may_read_the_list() {
    let list = Arc::new(SnapList::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (l2, s2) = (Arc::downgrade(&list), seen.clone());
    let _h = list.on_collection_changed(move |_c| {
        if let Some(list) = l2.upgrade() {
            s2.lock().unwrap().push(list.len());
        }
    });

    list.add(1);
    list.add_range(vec![2, 3]);
    assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
}

#[test]
fn notifications_follow_write_order_across_writers() {
    let list: Arc<SnapList<u64>> = Arc::new(SnapList::new());
    let adds = Arc::new(Mutex::new(Vec::new()));
    let a2 = adds.clone();
    let _h = list.on_collection_changed(move |c| {
        let idx = c.index.unwrap_or(usize::MAX);
        let item = c.new_items.as_ref().map(|v| v[0]).unwrap_or(u64::MAX);
        a2.lock().unwrap().push((idx, item));
    });

    let mut threads = Vec::new();
    for w in 0..4u64 {
        let list = list.clone();
        threads.push(thread::spawn(move || {
            for i in 0..250u64 {
                list.add(w * 1000 + i);
            }
        }));
    }
    for t in threads {
        t.join().unwrap();
    }

    let got = adds.lock().unwrap().clone();
    assert_eq!(got.len(), 1000);
    // Индексы Add идут строго по порядку записи, и совпадают с итоговым содержимым
    let contents = list.to_vec();
    for (pos, (idx, item)) in got.iter().enumerate() {
        assert_eq!(*idx, pos, "notification #{pos} out of order");
        assert_eq!(contents[pos], *item);
    }
}
