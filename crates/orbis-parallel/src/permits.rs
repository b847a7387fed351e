//! Counting permit pool bounding the number of live worker threads.

use crossbeam_channel::{Receiver, Sender, bounded};

/// A counting semaphore built on a bounded channel: each in-flight permit occupies
/// one slot, and acquiring blocks while every slot is taken.
pub(crate) struct WorkerPermits {
    slots: Sender<()>,
    returned: Receiver<()>,
    capacity: usize,
}

/// A held permit, returned to the pool on drop (including during unwinding).
pub(crate) struct Permit<'a> {
    pool: &'a WorkerPermits,
}

impl WorkerPermits {
    /// Creates a pool with `capacity` permits. A zero capacity pool is never
    /// acquired from, so it is backed by a single slot.
    pub(crate) fn new(capacity: usize) -> Self {
        let (slots, returned) = bounded(capacity.max(1));
        Self {
            slots,
            returned,
            capacity,
        }
    }

    /// Blocks until a permit is free.
    pub(crate) fn acquire(&self) -> Permit<'_> {
        // Both ends live in `self`, so the channel cannot be disconnected.
        let _ = self.slots.send(());
        Permit { pool: self }
    }

    /// Number of permits currently held.
    #[cfg(test)]
    pub(crate) fn in_use(&self) -> usize {
        self.slots.len()
    }

    /// Total permits in the pool.
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let _ = self.pool.returned.try_recv();
    }
}
