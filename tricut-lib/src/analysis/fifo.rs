//! Bounded single-producer single-consumer queue of fixed-length audio
//! blocks.
//!
//! The producer (audio thread) never waits: when the queue is full it
//! evicts the oldest unread block and keeps going. The consumer never
//! waits either; a pop that races with an eviction simply retries on the
//! next oldest block.
//!
//! Samples are stored as `f32` bit patterns in atomics, and the read and
//! write cursors are monotonically increasing block counters, so a slot
//! is addressed by `cursor % capacity`.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

struct Shared {
    slots: Box<[AtomicU32]>,
    block_len: usize,
    capacity: usize,
    write: AtomicU64,
    read: AtomicU64,
    dropped: AtomicU64,
}

impl Shared {
    fn slot(&self, cursor: u64) -> &[AtomicU32] {
        let start = (cursor % self.capacity as u64) as usize * self.block_len;
        &self.slots[start..start + self.block_len]
    }
}

/// Create a queue of `capacity` blocks of `block_len` samples each.
///
/// Both sizes are raised to at least one.
pub fn audio_fifo(capacity: usize, block_len: usize) -> (FifoProducer, FifoConsumer) {
    let capacity = capacity.max(1);
    let block_len = block_len.max(1);
    let slots = (0..capacity * block_len)
        .map(|_| AtomicU32::new(0.0_f32.to_bits()))
        .collect::<Vec<_>>()
        .into_boxed_slice();
    let shared = Arc::new(Shared {
        slots,
        block_len,
        capacity,
        write: AtomicU64::new(0),
        read: AtomicU64::new(0),
        dropped: AtomicU64::new(0),
    });
    (
        FifoProducer {
            shared: Arc::clone(&shared),
        },
        FifoConsumer { shared },
    )
}

/// Writing end, owned by the audio thread.
pub struct FifoProducer {
    shared: Arc<Shared>,
}

impl FifoProducer {
    /// Copy `block` into the queue.
    ///
    /// Shorter blocks are zero-padded and longer ones truncated to the
    /// queue's block length. Returns `true` if the oldest unread block had
    /// to be evicted to make room.
    pub fn push(&mut self, block: &[f32]) -> bool {
        let shared = &*self.shared;
        let write = shared.write.load(Ordering::Relaxed);
        let mut evicted = false;

        loop {
            let read = shared.read.load(Ordering::Acquire);
            if write - read < shared.capacity as u64 {
                break;
            }
            if shared
                .read
                .compare_exchange(read, read + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                shared.dropped.fetch_add(1, Ordering::Relaxed);
                evicted = true;
                break;
            }
        }

        let slot = shared.slot(write);
        for (index, cell) in slot.iter().enumerate() {
            let sample = block.get(index).copied().unwrap_or(0.0);
            cell.store(sample.to_bits(), Ordering::Relaxed);
        }
        shared.write.store(write + 1, Ordering::Release);
        evicted
    }

    /// Samples per block.
    pub fn block_len(&self) -> usize {
        self.shared.block_len
    }

    /// Blocks held before the oldest is evicted.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}

/// Reading end, owned by the analysis thread.
pub struct FifoConsumer {
    shared: Arc<Shared>,
}

impl FifoConsumer {
    /// Number of unread blocks, never more than the capacity.
    pub fn available(&self) -> usize {
        // `write` first: any later `read` is at least `write - capacity`.
        let write = self.shared.write.load(Ordering::Acquire);
        let read = self.shared.read.load(Ordering::Acquire);
        (write.saturating_sub(read) as usize).min(self.shared.capacity)
    }

    /// Copy the oldest unread block into `out` and consume it.
    ///
    /// Copies `min(out.len(), block_len)` samples. Returns `false` when the
    /// queue is empty.
    pub fn pop_into(&mut self, out: &mut [f32]) -> bool {
        let shared = &*self.shared;
        loop {
            let read = shared.read.load(Ordering::Acquire);
            let write = shared.write.load(Ordering::Acquire);
            if read >= write {
                return false;
            }

            for (dest, cell) in out.iter_mut().zip(shared.slot(read).iter()) {
                *dest = f32::from_bits(cell.load(Ordering::Relaxed));
            }

            // A failed exchange means the producer evicted this block while
            // it was being copied.
            if shared
                .read
                .compare_exchange(read, read + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Allocating convenience wrapper around [`pop_into`](Self::pop_into).
    pub fn pop(&mut self) -> Option<Vec<f32>> {
        let mut block = vec![0.0; self.shared.block_len];
        if self.pop_into(&mut block) {
            Some(block)
        } else {
            None
        }
    }

    /// Blocks evicted by the producer since creation.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Samples per block.
    pub fn block_len(&self) -> usize {
        self.shared.block_len
    }
}
