//! The per-document lock table.
//!
//! One slot per `(database, document)` pair, created on first acquisition
//! and removed by the last holder on release. Waiters on one document never
//! touch another document's slot; the table mutex is only held long enough
//! to find or retire a slot.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

type SlotKey = (String, String);

#[derive(Debug, Default)]
struct Slot {
    held: Mutex<bool>,
    released: Condvar,
}

/// Table of exclusive locks keyed by `(database, document)`.
#[derive(Debug, Default)]
pub struct DocumentLocks {
    table: Mutex<HashMap<SlotKey, Arc<Slot>>>,
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock for `(database, document)` is free, then take it.
    pub fn acquire(&self, database: &str, document: &str) -> DocumentGuard<'_> {
        let key = (database.to_string(), document.to_string());
        let slot = {
            let mut table = self.table.lock();
            Arc::clone(table.entry(key.clone()).or_default())
        };

        {
            let mut held = slot.held.lock();
            while *held {
                slot.released.wait(&mut held);
            }
            *held = true;
        }

        DocumentGuard {
            locks: self,
            key,
            slot,
        }
    }

    /// Number of live slots (held or awaited).
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }
}

/// Exclusive access to one document; released on drop.
#[must_use = "the document is unlocked as soon as the guard is dropped"]
#[derive(Debug)]
pub struct DocumentGuard<'a> {
    locks: &'a DocumentLocks,
    key: SlotKey,
    slot: Arc<Slot>,
}

impl Drop for DocumentGuard<'_> {
    fn drop(&mut self) {
        // Taking the table first stops new holders from cloning the slot
        // between the count check and the removal.
        let mut table = self.locks.table.lock();
        *self.slot.held.lock() = false;
        self.slot.released.notify_one();

        // One reference in the table, one in this guard: nobody is waiting.
        if Arc::strong_count(&self.slot) == 2 {
            table.remove(&self.key);
        }
    }
}
