//! Bulk-update windows.
//!
//! Policy:
//! - Windows do not nest. A second begin while one is open is ignored; the
//!   producer is trusted to pair calls.
//! - end_bulk_operation always raises exactly one Reset, even if no begin preceded it.
//! - Reader visibility inside a window follows ListConfig::bulk_isolation.

use std::sync::Arc;

use log::{debug, warn};

use super::core::{GroupOp, SnapList};
use crate::config::BulkIsolation;
use crate::metrics;
use crate::notify::CollectionChange;
use crate::snapshot::Snapshot;

impl<T: Clone + Send + Sync + 'static> SnapList<T> {
    /// Open a window: notifications are suppressed until end_bulk_operation.
    pub fn begin_bulk_operation(&self) {
        let mut g = self.items.write();
        if g.bulk {
            debug!("begin_bulk_operation: window already open, ignored");
            return;
        }
        g.bulk = true;
        if self.cfg.bulk_isolation == BulkIsolation::Isolated {
            let frozen = Snapshot::new(Arc::new(g.vec.clone()), g.version);
            g.frozen = Some(frozen);
        }
        // Группы входят в окно на своём ходу, после уже запечатанных записей
        let mut p = self.ticket(&mut g, Vec::new());
        p.groups = GroupOp::BeginBulk;
        metrics::record_bulk_window();
        debug!(
            "begin_bulk_operation: count={}, isolation={}",
            g.vec.len(),
            self.cfg.bulk_isolation.as_str()
        );
        drop(g);

        self.dispatch(p);
    }

    /// Close the window and raise one Reset.
    pub fn end_bulk_operation(&self) {
        let mut g = self.items.write();
        if !g.bulk {
            warn!("end_bulk_operation without matching begin; raising Reset anyway");
        }
        g.bulk = false;
        g.frozen = None;
        let mut p = self.ticket(&mut g, vec![CollectionChange::reset()]);
        p.groups = GroupOp::EndBulk;
        debug!("end_bulk_operation: count={}", g.vec.len());
        drop(g);

        self.dispatch(p);
    }

    pub fn is_bulk_operation_active(&self) -> bool {
        self.items.read().bulk
    }

    /// Open a window that closes when the guard drops (on every exit path).
    pub fn bulk(&self) -> BulkGuard<'_, T> {
        self.begin_bulk_operation();
        BulkGuard { list: self }
    }
}

/// RAII bulk window: ends the window on drop.
pub struct BulkGuard<'a, T: Clone + Send + Sync + 'static> {
    list: &'a SnapList<T>,
}

impl<'a, T: Clone + Send + Sync + 'static> BulkGuard<'a, T> {
    pub fn list(&self) -> &SnapList<T> {
        self.list
    }
}

impl<'a, T: Clone + Send + Sync + 'static> Drop for BulkGuard<'a, T> {
    fn drop(&mut self) {
        self.list.end_bulk_operation();
    }
}
