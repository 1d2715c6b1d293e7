use anyhow::{anyhow, bail, Result};
use log::{debug, info};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use snaplist::{metrics, SnapList};

#[derive(Default)]
struct ReaderStats {
    reads: u64,
    violations: u64,
    max_seen: usize,
}

#[derive(Serialize)]
struct StressOut {
    items: u64,
    readers: usize,
    batch: u64,
    elapsed_ms: u128,
    reads: u64,
    violations: u64,
    notifications: usize,
    final_count: usize,
    metrics: metrics::MetricsSnapshot,
    snapshot_reuse_ratio: f64,
}

/// A length is valid if it ends on a batch boundary (the last batch may be short).
fn is_batch_boundary(len: usize, batch: u64, items: u64) -> bool {
    let len = len as u64;
    len % batch == 0 || len == items
}

/// Every state a reader sees must be whole batches of 0..items, in order.
fn check_prefix(snap: &[u64], batch: u64, items: u64) -> bool {
    is_batch_boundary(snap.len(), batch, items)
        && snap.iter().enumerate().all(|(i, v)| *v == i as u64)
}

pub fn exec(items: u64, readers: usize, batch: u64, json: bool) -> Result<()> {
    if batch == 0 {
        bail!("--batch must be > 0");
    }
    metrics::reset();

    let list: Arc<SnapList<u64>> = Arc::new(SnapList::new());
    let notifications = Arc::new(AtomicUsize::new(0));
    let n2 = notifications.clone();
    let _sub = list.on_collection_changed(move |_| {
        n2.fetch_add(1, Ordering::Relaxed);
    });

    let done = Arc::new(AtomicBool::new(false));
    let total_reads = Arc::new(AtomicU64::new(0));
    let started = Instant::now();

    let mut handles = Vec::with_capacity(readers);
    for r in 0..readers {
        let list = list.clone();
        let done = done.clone();
        let total_reads = total_reads.clone();
        handles.push(thread::spawn(move || {
            let mut st = ReaderStats::default();
            loop {
                let finished = done.load(Ordering::Acquire);
                let count = list.len();
                let snap = list.snapshot();
                st.reads += 1;

                // count и снапшот берутся не атомарно вместе; оба должны быть префиксами
                if !is_batch_boundary(count, batch, items) || !check_prefix(&snap, batch, items) {
                    st.violations += 1;
                }
                st.max_seen = st.max_seen.max(snap.len());

                if finished && snap.len() as u64 == items {
                    break;
                }
            }
            total_reads.fetch_add(st.reads, Ordering::Relaxed);
            debug!(
                "reader {}: reads={} violations={} max_seen={}",
                r, st.reads, st.violations, st.max_seen
            );
            st
        }));
    }

    // Producer
    let mut next = 0u64;
    while next < items {
        let end = (next + batch).min(items);
        list.add_range(next..end);
        next = end;
    }
    done.store(true, Ordering::Release);

    let mut violations = 0;
    for h in handles {
        let st = h.join().map_err(|_| anyhow!("reader thread panicked"))?;
        violations += st.violations;
    }
    let elapsed_ms = started.elapsed().as_millis();
    let m = metrics::snapshot();

    let out = StressOut {
        items,
        readers,
        batch,
        elapsed_ms,
        reads: total_reads.load(Ordering::Relaxed),
        violations,
        notifications: notifications.load(Ordering::Relaxed),
        final_count: list.len(),
        snapshot_reuse_ratio: m.snapshot_reuse_ratio(),
        metrics: m,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        info!(
            "stress: items={} readers={} batch={} elapsed={}ms",
            items, readers, batch, elapsed_ms
        );
        println!(
            "reads={} violations={} notifications={} final_count={}",
            out.reads, out.violations, out.notifications, out.final_count
        );
        println!(
            "snapshots: materialized={} reused={} (ratio {:.2}) items_copied={}",
            out.metrics.snapshots_materialized,
            out.metrics.snapshot_reuses,
            out.snapshot_reuse_ratio,
            out.metrics.snapshot_items_copied
        );
    }

    if violations > 0 {
        bail!("{} inconsistent read(s) observed", violations);
    }
    Ok(())
}
