//! Directory enumeration: the producer that feeds a SnapList.
//!
//! One directory level is read and pushed into the list in batches:
//! - a batch goes out as soon as `first_flush` entries have been listed,
//!   so consumers can render early;
//! - independently, pending entries go out whenever `flush_interval_ms` has
//!   elapsed since the start or the previous batch, so a slow directory with
//!   fewer than `first_flush` entries still shows up before the end;
//! - whatever is left is pushed at the end.
//! Each batch is one `add_range`, i.e. one Add notification.
//!
//! Cancellation is cooperative: `cancel` is checked before every entry.
//! Per-entry metadata errors are skipped (and logged); failing to open the
//! directory itself is an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, UNIX_EPOCH};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;

use crate::config::ListConfig;
use crate::list::SnapList;
use crate::metrics;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Folder,
    File,
    Symlink,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Folder => "folder",
            ItemKind::File => "file",
            ItemKind::Symlink => "symlink",
        }
    }
}

/// One listed directory entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListedItem {
    pub name: String,
    pub path: PathBuf,
    pub kind: ItemKind,
    /// Size in bytes (0 for folders).
    pub size: u64,
    /// Last modification time, seconds since the Unix epoch.
    pub modified_secs: Option<u64>,
    pub hidden: bool,
}

impl ListedItem {
    /// Lower-cased extension without the dot; None for folders and extension-less names.
    pub fn extension(&self) -> Option<String> {
        if self.kind == ItemKind::Folder {
            return None;
        }
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct EnumerationSummary {
    pub listed: usize,
    pub skipped: usize,
    pub filtered: usize,
    pub flushes: usize,
    pub cancelled: bool,
    pub limited: bool,
    pub elapsed_ms: u128,
}

/// Enumeration knobs that are not part of ListConfig.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnumerateOptions {
    /// Wrap the whole run in one bulk window (one Reset instead of one Add per batch).
    pub bulk: bool,
    /// Clear the list before listing.
    pub clear_first: bool,
}

#[cfg(windows)]
fn has_hidden_attribute(md: &fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    md.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0
}

#[cfg(not(windows))]
fn has_hidden_attribute(_md: &fs::Metadata) -> bool {
    false
}

fn listed_item_from(entry: &fs::DirEntry) -> Result<ListedItem> {
    let path = entry.path();
    let name = entry.file_name().to_string_lossy().into_owned();
    let ft = entry
        .file_type()
        .with_context(|| format!("file type of {}", path.display()))?;
    let md = entry
        .metadata()
        .with_context(|| format!("metadata of {}", path.display()))?;

    let kind = if ft.is_symlink() {
        ItemKind::Symlink
    } else if ft.is_dir() {
        ItemKind::Folder
    } else {
        ItemKind::File
    };
    let size = if kind == ItemKind::Folder { 0 } else { md.len() };
    let modified_secs = md
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs());

    Ok(ListedItem {
        name,
        path,
        kind,
        size,
        modified_secs,
        hidden: has_hidden_attribute(&md),
    })
}

fn is_visible(item: &ListedItem, cfg: &ListConfig) -> bool {
    if item.hidden && !cfg.show_hidden {
        return false;
    }
    if item.name.starts_with('.') && !cfg.show_dot_files {
        return false;
    }
    true
}

/// List `dir` into `list`. Safe to call from a background thread while other
/// threads read the list.
pub fn enumerate_into(
    list: &SnapList<ListedItem>,
    dir: &Path,
    cfg: &ListConfig,
    opts: EnumerateOptions,
    cancel: &AtomicBool,
) -> Result<EnumerationSummary> {
    let started = Instant::now();
    let rd = fs::read_dir(dir).with_context(|| format!("read_dir {}", dir.display()))?;

    let _bulk = if opts.bulk { Some(list.bulk()) } else { None };
    if opts.clear_first {
        list.clear();
    }

    let interval = Duration::from_millis(cfg.flush_interval_ms);
    let mut summary = EnumerationSummary::default();
    let mut pending: Vec<ListedItem> = Vec::with_capacity(cfg.first_flush);
    let mut last_flush = Instant::now();

    let flush = |pending: &mut Vec<ListedItem>, summary: &mut EnumerationSummary| {
        if pending.is_empty() {
            return;
        }
        let n = pending.len();
        list.add_range(pending.drain(..));
        summary.flushes += 1;
        metrics::record_enum_flush(n);
        debug!("enumerate: flushed {} item(s) (total {})", n, summary.listed);
    };

    for entry in rd {
        if cancel.load(Ordering::Relaxed) {
            summary.cancelled = true;
            break;
        }

        let item = match entry
            .context("read_dir entry")
            .and_then(|e| listed_item_from(&e))
        {
            Ok(item) => item,
            Err(e) => {
                warn!("enumerate: skip entry in {}: {:#}", dir.display(), e);
                summary.skipped += 1;
                metrics::record_enum_skipped();
                continue;
            }
        };

        if !is_visible(&item, cfg) {
            summary.filtered += 1;
            continue;
        }

        pending.push(item);
        summary.listed += 1;

        if cfg.count_limit.map_or(false, |lim| summary.listed >= lim) {
            summary.limited = true;
            break;
        }

        // Интервал считается с начала перечисления, а не с первой пачки
        let due = summary.listed == cfg.first_flush || last_flush.elapsed() >= interval;
        if due {
            flush(&mut pending, &mut summary);
            last_flush = Instant::now();
        }
    }

    flush(&mut pending, &mut summary);
    summary.elapsed_ms = started.elapsed().as_millis();

    info!(
        "enumerate {}: listed={} skipped={} filtered={} flushes={}{}{}",
        dir.display(),
        summary.listed,
        summary.skipped,
        summary.filtered,
        summary.flushes,
        if summary.cancelled { " (cancelled)" } else { "" },
        if summary.limited { " (limit reached)" } else { "" },
    );
    Ok(summary)
}
