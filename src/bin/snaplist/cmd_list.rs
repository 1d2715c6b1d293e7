use anyhow::{anyhow, Result};
use log::debug;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use snaplist::{
    enumerate_into, BulkIsolation, ChangeAction, EnumerateOptions, EnumerationSummary, ListConfig,
    ListedItem, SnapList,
};

use crate::cli::{GroupBy, Isolation, SortBy};
use crate::util::{compare_items, group_key, human_size};

pub struct ListArgs {
    pub path: PathBuf,
    pub bulk: bool,
    pub isolation: Option<Isolation>,
    pub group_by: Option<GroupBy>,
    pub sort: SortBy,
    pub limit: Option<usize>,
    pub show_hidden: bool,
    pub show_dot_files: bool,
    pub json: bool,
}

#[derive(Default, Serialize)]
struct Observed {
    /// Snapshots taken by the consumer while the producer ran.
    samples: usize,
    /// Distinct item counts seen by the consumer.
    counts_seen: Vec<usize>,
    adds: usize,
    resets: usize,
}

#[derive(Serialize)]
struct GroupOut {
    key: String,
    count: usize,
}

#[derive(Serialize)]
struct ListOut<'a> {
    path: String,
    summary: &'a EnumerationSummary,
    observed: &'a Observed,
    items: &'a [ListedItem],
    groups: Vec<GroupOut>,
}

pub fn exec(args: ListArgs) -> Result<()> {
    let env = ListConfig::from_env();
    let mut cfg = env
        .clone()
        .with_show_hidden(args.show_hidden || env.show_hidden)
        .with_show_dot_files(args.show_dot_files || env.show_dot_files);
    if let Some(limit) = args.limit {
        cfg = cfg.with_count_limit(Some(limit));
    }
    if let Some(iso) = args.isolation {
        cfg = cfg.with_bulk_isolation(match iso {
            Isolation::Visible => BulkIsolation::Visible,
            Isolation::Isolated => BulkIsolation::Isolated,
        });
    }
    debug!("list: {}", cfg);

    let list: Arc<SnapList<ListedItem>> = Arc::new(SnapList::with_config(cfg.clone()));
    if let Some(group_by) = args.group_by {
        list.set_group_selector(move |it: &ListedItem| group_key(group_by, it));
    }

    let adds = Arc::new(AtomicUsize::new(0));
    let resets = Arc::new(AtomicUsize::new(0));
    let (a2, r2) = (adds.clone(), resets.clone());
    let _sub = list.on_collection_changed(move |c| match c.action {
        ChangeAction::Add => {
            a2.fetch_add(1, Ordering::Relaxed);
        }
        ChangeAction::Reset => {
            r2.fetch_add(1, Ordering::Relaxed);
        }
        _ => {}
    });

    // Producer
    let cancel = Arc::new(AtomicBool::new(false));
    let producer = {
        let list = list.clone();
        let path = args.path.clone();
        let cfg = cfg.clone();
        let cancel = cancel.clone();
        let opts = EnumerateOptions {
            bulk: args.bulk,
            clear_first: false,
        };
        thread::spawn(move || enumerate_into(&list, &path, &cfg, opts, &cancel))
    };

    // Consumer: читаем снапшоты, пока producer работает
    let mut observed = Observed::default();
    while !producer.is_finished() {
        let snap = list.snapshot();
        observed.samples += 1;
        if observed.counts_seen.last() != Some(&snap.len()) {
            observed.counts_seen.push(snap.len());
        }
        thread::sleep(Duration::from_millis(5));
    }
    let summary = producer
        .join()
        .map_err(|_| anyhow!("enumeration thread panicked"))??;

    let sort = args.sort;
    list.sort_by(|a, b| compare_items(sort, a, b));

    observed.adds = adds.load(Ordering::Relaxed);
    observed.resets = resets.load(Ordering::Relaxed);

    let snap = list.snapshot();
    let groups: Vec<GroupOut> = list
        .grouped()
        .map(|g| {
            g.iter()
                .map(|grp| GroupOut {
                    key: grp.key().to_string(),
                    count: grp.len(),
                })
                .collect()
        })
        .unwrap_or_default();

    if args.json {
        let out = ListOut {
            path: args.path.display().to_string(),
            summary: &summary,
            observed: &observed,
            items: snap.as_slice(),
            groups,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for it in snap.iter() {
        println!(
            "{:<8} {:>10}  {}",
            it.kind.as_str(),
            if it.kind == snaplist::ItemKind::Folder {
                "-".to_string()
            } else {
                human_size(it.size)
            },
            it.name
        );
    }
    if !groups.is_empty() {
        println!();
        for g in &groups {
            println!("[{}] {}", g.key, g.count);
        }
    }
    println!();
    println!(
        "listed={} skipped={} filtered={} flushes={} elapsed={}ms{}{}",
        summary.listed,
        summary.skipped,
        summary.filtered,
        summary.flushes,
        summary.elapsed_ms,
        if summary.limited { " (limit reached)" } else { "" },
        if summary.cancelled { " (cancelled)" } else { "" },
    );
    println!(
        "consumer: samples={} distinct_counts={} add_events={} reset_events={}",
        observed.samples,
        observed.counts_seen.len(),
        observed.adds,
        observed.resets
    );
    Ok(())
}
