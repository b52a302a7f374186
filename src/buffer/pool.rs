//! Fixed-size pool of reusable [`RecordData`] slots.
//!
//! Acquiring a buffer pops a free index off a `parking_lot`-guarded stack;
//! releasing it pushes the index back. The returned [`BufferHandle`] is
//! move-only and carries no `Drop` impl: ownership passes explicitly from
//! producer, to the record queue, to the worker, which alone calls
//! [`BufferHandle::release`]. This keeps the "exactly one owner at a time"
//! invariant a property of the type's API rather than of RAII timing, which
//! matters because a handle spends part of its life sitting inside an
//! `mpsc` channel where nothing runs its destructor on delivery.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::record::RecordData;
use crate::config::PoolConfig;

struct Slot {
    record: std::cell::UnsafeCell<RecordData>,
}

// Safety: a `Slot` is only ever touched through a `BufferHandle`, and the
// pool's free-list guarantees at most one handle for a given index exists
// at a time.
unsafe impl Sync for Slot {}

struct Inner {
    slots: Vec<Slot>,
    free: Mutex<Vec<u32>>,
}

/// A fixed-capacity set of [`RecordData`] slots shared between producer
/// threads and the worker.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<Inner>,
}

impl BufferPool {
    pub fn new(config: &PoolConfig) -> Self {
        let slots = (0..config.pool_size)
            .map(|_| Slot {
                record: std::cell::UnsafeCell::new(RecordData::new(
                    config.buffer_size,
                    config.string_capacity,
                )),
            })
            .collect::<Vec<_>>();
        let free = (0..config.pool_size as u32).rev().collect();
        BufferPool {
            inner: Arc::new(Inner {
                slots,
                free: Mutex::new(free),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.slots.len()
    }

    /// Number of buffers currently available, for diagnostics only — this
    /// value is stale the instant it is read under concurrent use.
    pub fn available(&self) -> usize {
        self.inner.free.lock().len()
    }

    /// Attempts to take a free buffer without blocking.
    pub fn try_acquire(&self) -> Option<BufferHandle> {
        let index = self.inner.free.lock().pop()?;
        Some(BufferHandle {
            pool: self.inner.clone(),
            index,
        })
    }
}

/// A uniquely-owned lease on one [`RecordData`] slot.
///
/// Does not implement `Clone` or `Drop` by design: the caller must hand it
/// to exactly one of [`BufferHandle::release`] or the record queue.
pub struct BufferHandle {
    pool: Arc<Inner>,
    index: u32,
}

impl BufferHandle {
    /// Mutable access to the leased record. Safe because a `BufferHandle`
    /// is the only live reference to its slot.
    pub fn record_mut(&mut self) -> &mut RecordData {
        unsafe { &mut *self.pool.slots[self.index as usize].record.get() }
    }

    pub fn record(&self) -> &RecordData {
        unsafe { &*self.pool.slots[self.index as usize].record.get() }
    }

    /// Returns the slot to its pool's free list, consuming the handle.
    pub fn release(self) {
        self.pool.free.lock().push(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;

    #[test]
    fn acquire_exhausts_and_release_replenishes() {
        let pool = BufferPool::new(&PoolConfig {
            pool_size: 2,
            buffer_size: 16,
            string_capacity: 2,
        });
        let a = pool.try_acquire().unwrap();
        let b = pool.try_acquire().unwrap();
        assert!(pool.try_acquire().is_none());
        a.release();
        assert_eq!(pool.available(), 1);
        let c = pool.try_acquire().unwrap();
        c.release();
        b.release();
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn handles_from_different_acquires_touch_distinct_slots() {
        let pool = BufferPool::new(&PoolConfig {
            pool_size: 2,
            buffer_size: 16,
            string_capacity: 2,
        });
        let mut a = pool.try_acquire().unwrap();
        let mut b = pool.try_acquire().unwrap();
        a.record_mut().logger_id = 11;
        b.record_mut().logger_id = 22;
        assert_eq!(a.record().logger_id, 11);
        assert_eq!(b.record().logger_id, 22);
        a.release();
        b.release();
    }
}
