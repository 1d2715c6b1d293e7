//! In-process read/write gate for single-writer safety.
//!
//! Two kinds of admission over one lock:
//! - write: single writer, blocks other writers and all readers.
//! - read: any number of concurrent readers, excludes writers while held.
//!
//! Backed by the platform read-write lock. Guards release on Drop.
//! A panic while a guard is held poisons the std lock; the gate recovers the
//! inner value, since callers check bounds before mutating.
//! The platform lock may queue new readers behind a waiting writer, so code
//! holding a read guard must not take a second one on the same gate.

use std::ops::{Deref, DerefMut};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

pub(crate) struct Gate<T> {
    inner: RwLock<T>,
}

/// Shared (reader) admission.
pub(crate) struct ReadGuard<'a, T> {
    guard: RwLockReadGuard<'a, T>,
}

/// Exclusive (writer) admission.
pub(crate) struct WriteGuard<'a, T> {
    guard: RwLockWriteGuard<'a, T>,
}

impl<'a, T> Deref for ReadGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<'a, T> Deref for WriteGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<'a, T> DerefMut for WriteGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Gate<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Acquire shared admission. Blocks while a writer holds the gate.
    pub(crate) fn read(&self) -> ReadGuard<'_, T> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        ReadGuard { guard }
    }

    /// Acquire exclusive admission. Blocks until all readers and writers leave.
    pub(crate) fn write(&self) -> WriteGuard<'_, T> {
        let guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        WriteGuard { guard }
    }

    /// Try to acquire shared admission. Returns None if a writer holds the gate.
    pub(crate) fn try_read(&self) -> Option<ReadGuard<'_, T>> {
        match self.inner.try_read() {
            Ok(guard) => Some(ReadGuard { guard }),
            Err(TryLockError::Poisoned(e)) => Some(ReadGuard {
                guard: e.into_inner(),
            }),
            Err(TryLockError::WouldBlock) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_share_writer_excludes() {
        let gate = Gate::new(5u32);
        let r1 = gate.read();
        let r2 = gate.try_read().expect("second reader must be admitted");
        assert_eq!(*r1 + *r2, 10);
        drop(r1);
        drop(r2);

        let mut w = gate.write();
        *w = 7;
        assert!(gate.try_read().is_none(), "reader must wait for writer");
        drop(w);
        assert_eq!(*gate.read(), 7);
    }

    #[test]
    fn poisoned_gate_is_recovered() {
        let gate = std::sync::Arc::new(Gate::new(vec![1, 2, 3]));
        let g2 = gate.clone();
        let _ = std::thread::spawn(move || {
            let w = g2.write();
            let _v: i32 = w[10]; // out of range -> panic while holding
        })
        .join();
        assert_eq!(gate.read().len(), 3);
        gate.write().push(4);
        assert_eq!(gate.read().len(), 4);
    }
}
