use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Result};

use snaplist::{ChangeAction, GroupHeader, SnapList};

fn first_letter(s: &String) -> Option<String> {
    s.chars().next().map(|c| c.to_ascii_lowercase().to_string())
}

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn group_keys(list: &SnapList<String>) -> Vec<String> {
    list.grouped()
        .map(|g| g.iter().map(|grp| grp.key().to_string()).collect())
        .unwrap_or_default()
}

#[test]
fn selector_builds_groups_from_existing_items() {
    let list = SnapList::from_items(names(&["apple", "avocado", "banana"]));
    assert!(!list.is_grouped());
    assert!(list.grouped().is_none());

    list.set_group_selector(first_letter);
    assert!(list.is_grouped());
    assert_eq!(group_keys(&list), vec!["a", "b"]);

    let groups = list.grouped().unwrap();
    let a = groups.get(0).unwrap();
    assert_eq!(a.items().to_vec(), names(&["apple", "avocado"]));
    assert_eq!(a.len(), 2);
}

#[test]
fn writes_keep_groups_in_sync() {
    let list = SnapList::new();
    list.set_group_selector(first_letter);

    list.add_range(names(&["cherry", "carrot"]));
    list.add("date".to_string());
    assert_eq!(group_keys(&list), vec!["c", "d"]);

    // Удаление последнего элемента группы убирает группу
    assert!(list.remove(&"date".to_string()));
    assert_eq!(group_keys(&list), vec!["c"]);

    // Replace переносит элемент между группами
    list.set(0, "elder".to_string());
    assert_eq!(group_keys(&list), vec!["c", "e"]);
    let groups = list.grouped().unwrap();
    let c = groups.iter().find(|g| g.key() == "c").unwrap();
    assert_eq!(c.items().to_vec(), names(&["carrot"]));

    list.clear();
    assert!(group_keys(&list).is_empty());
    assert!(list.is_grouped());
}

#[test]
fn items_without_key_stay_ungrouped() {
    let list = SnapList::new();
    list.set_group_selector(|s: &String| {
        if s.starts_with('_') {
            None
        } else {
            Some("named".to_string())
        }
    });
    list.add_range(names(&["_hidden", "visible"]));
    assert_eq!(list.len(), 2);

    let groups = list.grouped().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups.get(0).unwrap().items().to_vec(), names(&["visible"]));
}

#[test]
fn header_info_runs_once_per_new_group() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c2 = calls.clone();
    let list = SnapList::new();
    list.set_group_selector_with_header(first_letter, move |g| {
        c2.fetch_add(1, Ordering::SeqCst);
        g.set_header(GroupHeader {
            text: g.key().to_uppercase(),
            subtext: Some("letter".to_string()),
        });
    });

    list.add_range(names(&["fig", "feijoa", "grape"]));
    list.add("guava".to_string());
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let groups = list.grouped().unwrap();
    let f = groups.get(0).unwrap();
    assert_eq!(f.header().text, "F");
    assert_eq!(f.header().subtext.as_deref(), Some("letter"));
}

#[test]
fn groups_compare_by_identity() {
    let list = SnapList::from_items(names(&["kiwi"]));
    list.set_group_selector(first_letter);
    let first = list.grouped().unwrap().get(0).unwrap();
    let again = list.grouped().unwrap().get(0).unwrap();
    assert_eq!(first, again);

    // Пересборка создаёт новые группы с тем же ключом
    assert!(list.reset_groups(&AtomicBool::new(false)));
    let rebuilt = list.grouped().unwrap().get(0).unwrap();
    assert_eq!(rebuilt.key(), first.key());
    assert_ne!(rebuilt, first);
}

#[test]
fn reset_groups_honours_cancellation() {
    let list = SnapList::from_items(names(&["lemon", "lime", "mango"]));
    list.set_group_selector(first_letter);

    let cancel = AtomicBool::new(true);
    assert!(!list.reset_groups(&cancel));
    assert!(group_keys(&list).is_empty());

    cancel.store(false, Ordering::SeqCst);
    assert!(list.reset_groups(&cancel));
    assert_eq!(group_keys(&list), vec!["l", "m"]);

    list.clear_group_selector();
    assert!(!list.is_grouped());
    assert!(!list.reset_groups(&cancel));
}

#[test]
fn bulk_window_propagates_to_groups() {
    let list = SnapList::from_items(names(&["nectarine"]));
    list.set_group_selector(first_letter);
    let groups = list.grouped().unwrap();

    let resets = Arc::new(AtomicUsize::new(0));
    let r2 = resets.clone();
    let _h = groups.on_collection_changed(move |c| {
        if c.action == ChangeAction::Reset {
            r2.fetch_add(1, Ordering::SeqCst);
        }
    });

    list.begin_bulk_operation();
    assert!(groups.is_bulk_operation_active());
    assert!(groups.get(0).unwrap().items().is_bulk_operation_active());
    list.add_range(names(&["olive", "orange"]));
    list.end_bulk_operation();

    assert!(!groups.is_bulk_operation_active());
    assert_eq!(resets.load(Ordering::SeqCst), 1);
    assert_eq!(group_keys(&list), vec!["n", "o"]);
    // Группа, созданная внутри окна, тоже закрыта
    let o = groups.iter().find(|g| g.key() == "o").unwrap();
    assert!(!o.items().is_bulk_operation_active());
    assert_eq!(o.len(), 2);
}

fn residue(v: &u64) -> Option<String> {
    Some((v % 4).to_string())
}

/// Every item sits in exactly one group, and in the right one.
fn assert_groups_match(list: &SnapList<u64>, round: usize) {
    let groups = list.grouped().unwrap();
    let mut grouped: Vec<u64> = Vec::new();
    for g in groups.iter() {
        for v in g.items().iter() {
            assert_eq!(residue(&v).as_deref(), Some(g.key()), "round {round}: {v} in wrong group");
            grouped.push(v);
        }
    }
    grouped.sort_unstable();
    let mut items = list.to_vec();
    items.sort_unstable();
    assert_eq!(grouped, items, "round {round}: groups out of sync with the list");
}

#[test]
fn reset_groups_while_writer_runs() -> Result<()> {
    for round in 0..30 {
        let list: Arc<SnapList<u64>> = Arc::new(SnapList::new());
        list.set_group_selector(residue);

        let writer = {
            let list = list.clone();
            thread::spawn(move || {
                for i in 0..1000u64 {
                    list.add(i);
                }
            })
        };
        let cancel = AtomicBool::new(false);
        while !writer.is_finished() {
            assert!(list.reset_groups(&cancel));
        }
        writer.join().map_err(|_| anyhow!("writer panicked"))?;

        assert_eq!(list.len(), 1000);
        assert_groups_match(&list, round);
    }
    Ok(())
}

#[test]
fn set_group_selector_while_writer_runs() -> Result<()> {
    for round in 0..30 {
        let list: Arc<SnapList<u64>> = Arc::new(SnapList::new());
        list.set_group_selector(residue);

        let writer = {
            let list = list.clone();
            thread::spawn(move || {
                for i in 0..1000u64 {
                    if i % 10 == 9 {
                        // Удаления тоже должны доходить до групп
                        list.remove(&(i - 1));
                    } else {
                        list.add(i);
                    }
                }
            })
        };
        // Каждый вызов ставит новый набор групп поверх идущих записей
        while !writer.is_finished() {
            list.set_group_selector(residue);
        }
        writer.join().map_err(|_| anyhow!("writer panicked"))?;

        assert_eq!(list.len(), 900);
        assert_groups_match(&list, round);
    }
    Ok(())
}

#[test]
fn bulk_window_with_several_writers_closes_groups_once() -> Result<()> {
    let list: Arc<SnapList<u64>> = Arc::new(SnapList::new());
    list.set_group_selector(residue);
    let groups = list.grouped().unwrap();

    // После Reset группового списка внутри того же окна новых Add быть не должно
    let after_reset = Arc::new(AtomicUsize::new(0));
    let closed = Arc::new(AtomicBool::new(false));
    let (a2, c2) = (after_reset.clone(), closed.clone());
    let _h = groups.on_collection_changed(move |c| match c.action {
        ChangeAction::Reset => c2.store(true, Ordering::SeqCst),
        _ if c2.load(Ordering::SeqCst) => {
            a2.fetch_add(1, Ordering::SeqCst);
        }
        _ => {}
    });

    list.begin_bulk_operation();
    let mut writers = Vec::new();
    for w in 0..4u64 {
        let list = list.clone();
        writers.push(thread::spawn(move || list.add(w)));
    }
    for w in writers {
        w.join().map_err(|_| anyhow!("writer panicked"))?;
    }
    list.end_bulk_operation();

    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(after_reset.load(Ordering::SeqCst), 0);
    assert_eq!(groups.len(), 4);
    assert_groups_match(&list, 0);
    Ok(())
}
