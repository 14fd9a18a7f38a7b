//! Bounded connection table
//!
//! Every live connection holds a slot keyed by its connection id. Once the
//! table is at capacity new connections are turned away.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Concurrent set of live connection ids with an explicit limit
#[derive(Debug)]
pub struct ConnectionTable {
    ids: Mutex<HashSet<u64>>,
    /// 0 = unlimited
    capacity: usize,
}

impl ConnectionTable {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            ids: Mutex::new(HashSet::new()),
            capacity,
        })
    }

    /// Claim a slot for `id`; returns None when the table is full
    ///
    /// The slot is released when the returned guard is dropped.
    pub fn try_register(self: &Arc<Self>, id: u64) -> Option<SlotGuard> {
        let mut ids = self.lock();
        if self.capacity > 0 && ids.len() >= self.capacity {
            return None;
        }
        ids.insert(id);

        Some(SlotGuard {
            table: Arc::clone(self),
            id,
        })
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn release(&self, id: u64) {
        self.lock().remove(&id);
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<u64>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A claimed slot in the connection table
#[derive(Debug)]
pub struct SlotGuard {
    table: Arc<ConnectionTable>,
    id: u64,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.table.release(self.id);
    }
}
