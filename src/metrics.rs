//! Lightweight global metrics for snaplist.
//!
//! Потокобезопасные атомарные счётчики для подсистем:
//! - Writes (single-item / range)
//! - Notifications (published / suppressed by bulk windows)
//! - Snapshots (materialized / reused / items copied)
//! - Enumeration (items listed / flushes / skipped entries)

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

// ----- Writes -----
static WRITES_TOTAL: AtomicU64 = AtomicU64::new(0);
static RANGE_WRITES_TOTAL: AtomicU64 = AtomicU64::new(0);

// ----- Notifications -----
static NOTIFICATIONS_PUBLISHED: AtomicU64 = AtomicU64::new(0);
static NOTIFICATIONS_SUPPRESSED: AtomicU64 = AtomicU64::new(0);
static BULK_WINDOWS: AtomicU64 = AtomicU64::new(0);

// ----- Snapshots -----
static SNAPSHOTS_MATERIALIZED: AtomicU64 = AtomicU64::new(0);
static SNAPSHOT_REUSES: AtomicU64 = AtomicU64::new(0);
static SNAPSHOT_ITEMS_COPIED: AtomicU64 = AtomicU64::new(0);

// ----- Enumeration -----
static ENUM_ITEMS_LISTED: AtomicU64 = AtomicU64::new(0);
static ENUM_FLUSHES: AtomicU64 = AtomicU64::new(0);
static ENUM_ENTRIES_SKIPPED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    // Writes
    pub writes_total: u64,
    pub range_writes_total: u64,

    // Notifications
    pub notifications_published: u64,
    pub notifications_suppressed: u64,
    pub bulk_windows: u64,

    // Snapshots
    pub snapshots_materialized: u64,
    pub snapshot_reuses: u64,
    pub snapshot_items_copied: u64,

    // Enumeration
    pub enum_items_listed: u64,
    pub enum_flushes: u64,
    pub enum_entries_skipped: u64,
}

impl MetricsSnapshot {
    /// Share of iterations served from the cached snapshot.
    pub fn snapshot_reuse_ratio(&self) -> f64 {
        let total = self.snapshots_materialized + self.snapshot_reuses;
        if total == 0 {
            0.0
        } else {
            self.snapshot_reuses as f64 / total as f64
        }
    }

    pub fn avg_items_per_flush(&self) -> f64 {
        if self.enum_flushes == 0 {
            0.0
        } else {
            self.enum_items_listed as f64 / self.enum_flushes as f64
        }
    }
}

// ----- Recorders (Writes) -----
pub fn record_write() {
    WRITES_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn record_range_write() {
    WRITES_TOTAL.fetch_add(1, Ordering::Relaxed);
    RANGE_WRITES_TOTAL.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Notifications) -----
pub fn record_notifications_published(n: usize) {
    NOTIFICATIONS_PUBLISHED.fetch_add(n as u64, Ordering::Relaxed);
}

pub fn record_notification_suppressed() {
    NOTIFICATIONS_SUPPRESSED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_bulk_window() {
    BULK_WINDOWS.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Snapshots) -----
pub fn record_snapshot_materialized(items: usize) {
    SNAPSHOTS_MATERIALIZED.fetch_add(1, Ordering::Relaxed);
    SNAPSHOT_ITEMS_COPIED.fetch_add(items as u64, Ordering::Relaxed);
}

pub fn record_snapshot_reuse() {
    SNAPSHOT_REUSES.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Enumeration) -----
pub fn record_enum_flush(items: usize) {
    ENUM_FLUSHES.fetch_add(1, Ordering::Relaxed);
    ENUM_ITEMS_LISTED.fetch_add(items as u64, Ordering::Relaxed);
}

pub fn record_enum_skipped() {
    ENUM_ENTRIES_SKIPPED.fetch_add(1, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        writes_total: WRITES_TOTAL.load(Ordering::Relaxed),
        range_writes_total: RANGE_WRITES_TOTAL.load(Ordering::Relaxed),

        notifications_published: NOTIFICATIONS_PUBLISHED.load(Ordering::Relaxed),
        notifications_suppressed: NOTIFICATIONS_SUPPRESSED.load(Ordering::Relaxed),
        bulk_windows: BULK_WINDOWS.load(Ordering::Relaxed),

        snapshots_materialized: SNAPSHOTS_MATERIALIZED.load(Ordering::Relaxed),
        snapshot_reuses: SNAPSHOT_REUSES.load(Ordering::Relaxed),
        snapshot_items_copied: SNAPSHOT_ITEMS_COPIED.load(Ordering::Relaxed),

        enum_items_listed: ENUM_ITEMS_LISTED.load(Ordering::Relaxed),
        enum_flushes: ENUM_FLUSHES.load(Ordering::Relaxed),
        enum_entries_skipped: ENUM_ENTRIES_SKIPPED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    WRITES_TOTAL.store(0, Ordering::Relaxed);
    RANGE_WRITES_TOTAL.store(0, Ordering::Relaxed);

    NOTIFICATIONS_PUBLISHED.store(0, Ordering::Relaxed);
    NOTIFICATIONS_SUPPRESSED.store(0, Ordering::Relaxed);
    BULK_WINDOWS.store(0, Ordering::Relaxed);

    SNAPSHOTS_MATERIALIZED.store(0, Ordering::Relaxed);
    SNAPSHOT_REUSES.store(0, Ordering::Relaxed);
    SNAPSHOT_ITEMS_COPIED.store(0, Ordering::Relaxed);

    ENUM_ITEMS_LISTED.store(0, Ordering::Relaxed);
    ENUM_FLUSHES.store(0, Ordering::Relaxed);
    ENUM_ENTRIES_SKIPPED.store(0, Ordering::Relaxed);
}
