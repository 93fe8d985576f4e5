use crate::invariants::{debug_assert_claim_bounded, debug_assert_drain_bounded};
use crate::{Backoff, Config, Flags, Metrics, MetricsSnapshot, RingError};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::fmt;
use std::hint;
use std::mem::{size_of, MaybeUninit};
use std::sync::atomic::{AtomicU32, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// This MPMC ring buffer uses the classic four-cursor protocol: each role
// (producer, consumer) owns a `head` (reservation frontier) and a `tail`
// (publication frontier).
//
// ## Cursors (u32, monotonic)
//
// Cursors are unbounded 32-bit counters that wrap modulo 2^32, never modulo
// the slot count. The slot index is `cursor & mask`, computed only when
// touching the buffer. Storing masked cursors instead would break the count
// arithmetic whenever the counters straddle a wrap: with monotonic cursors,
// `a.wrapping_sub(b)` is the exact element count for any pair at most
// `slot_count - 1` apart, wrap or no wrap.
//
// ## Memory ordering protocol
//
// **Producer (push path):**
// 1. Load `prod.head` with Relaxed (only same-role actors race on it)
// 2. Load `cons.tail` with Acquire (pairs with the consumer's Release in
//    step 5 of pop: the slots we are about to overwrite were fully read)
// 3. CAS `prod.head` forward with Relaxed/Relaxed to claim `[head, head+n)`
// 4. Write elements into the claimed slots (plain stores)
// 5. Spin until `prod.tail` equals our claimed start, then store
//    `prod.tail = head + n` with Release (publishes step 4 to consumers)
//
// **Consumer (pop path):** symmetric, with `cons.*` and `prod.tail`
// exchanged, and reads instead of writes in step 4.
//
// The Relaxed CAS on the head is sufficient because the head is only read
// back by same-role actors, which retry on failure; no payload visibility
// hangs off it. The spin in step 5 loads the own tail with Acquire: the
// value it waits for was Release-stored by the previous claimant of the
// same role, so that claimant's payload accesses are ordered before our own
// Release store. A consumer's single Acquire load of `prod.tail` therefore
// observes every element published up to that cursor, regardless of which
// producer wrote it.
//
// ## Slot ownership
//
// Slots cycle through four states as the cursors pass them: free, claimed
// by a producer, published, claimed by a consumer, free again. The capacity
// check keeps `prod.head` from lapping `cons.tail`, so at any instant each
// slot has at most one writer and no concurrent reader. Each slot is its
// own `UnsafeCell`: distinct producers write distinct slots concurrently,
// and a whole-buffer cell would alias their mutable borrows.
//
// =============================================================================

/// Outcome of a successful bulk [`push`](Ring::push) or [`pop`](Ring::pop).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Number of elements actually transferred.
    pub count: u32,
    /// Snapshot of how many more elements the same call could have
    /// transferred: remaining free slots after a push, remaining ready
    /// elements after a pop. Advisory; may be stale on return.
    pub remaining: u32,
}

/// One role's cursor group. `head` is the reservation frontier, `tail` the
/// publication frontier; `mask` is duplicated per role so the whole group
/// lives in a single cache line.
struct Cursors {
    head: AtomicU32,
    tail: AtomicU32,
    mask: u32,
}

impl Cursors {
    fn new(mask: u32) -> Self {
        Self {
            head: AtomicU32::new(0),
            tail: AtomicU32::new(0),
            mask,
        }
    }
}

/// Bounded lock-free MPMC ring buffer for `Copy` elements.
///
/// Multiple producers and multiple consumers move fixed-size elements in
/// FIFO order through a power-of-two slot array. Bulk operations claim and
/// publish a contiguous range of slots in one call. The ring never parks a
/// thread: operations either succeed, fail with
/// [`WouldBlock`](RingError::WouldBlock), or briefly spin while a peer of
/// the *same* role finishes publishing an earlier claim.
///
/// One slot always stays empty to tell a full ring from an empty one, so a
/// ring built over `n` slots holds at most `n - 1` elements.
///
/// # Example
///
/// ```
/// use ringmpmc_rs::{Flags, Ring};
///
/// let ring = Ring::<u32>::with_capacity(8)?;
///
/// let pushed = ring.push(&[10, 20, 30], Flags::NONE)?;
/// assert_eq!(pushed.count, 3);
///
/// let mut out = [0u32; 3];
/// let popped = ring.pop(&mut out, Flags::NONE)?;
/// assert_eq!(popped.count, 3);
/// assert_eq!(out, [10, 20, 30]);
/// # Ok::<(), ringmpmc_rs::RingError>(())
/// ```
#[repr(C)]
pub struct Ring<T> {
    // === PRODUCER HOT === (cache-line padded)
    prod: CachePadded<Cursors>,

    // === CONSUMER HOT === (cache-line padded)
    cons: CachePadded<Cursors>,

    // === COLD STATE ===
    metrics: Metrics,
    config: Config,

    // === SLOT STORAGE ===
    /// `slot_count` fixed-size slots, indexed by `cursor & mask`.
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// Safety: Ring is Send + Sync as long as T is Send. The cursor protocol
// hands each slot to exactly one thread at a time (see the module banner).
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ring")
            .field("capacity", &self.capacity())
            .field("ready", &self.ready())
            .field("free", &self.free())
            .finish_non_exhaustive()
    }
}

impl<T> Ring<T> {
    /// Creates a ring from a [`Config`].
    ///
    /// Fails with [`RingError::InvalidCapacity`] unless the slot count is a
    /// power of two in `2..=2^31`, with [`RingError::InvalidElementSize`]
    /// for zero-sized `T`, and with [`RingError::OutOfMemory`] if the slot
    /// array cannot be allocated.
    pub fn new(config: Config) -> Result<Self, RingError> {
        let slot_count = config.slot_count;
        if slot_count < 2 || slot_count > Config::MAX_SLOTS || !slot_count.is_power_of_two() {
            return Err(RingError::InvalidCapacity(slot_count));
        }
        if size_of::<T>() == 0 {
            return Err(RingError::InvalidElementSize);
        }

        let n = slot_count as usize;
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(n)
            .map_err(|_| RingError::OutOfMemory {
                bytes: n.saturating_mul(size_of::<T>()),
            })?;
        slots.resize_with(n, || UnsafeCell::new(MaybeUninit::uninit()));

        let mask = slot_count - 1;
        Ok(Self {
            prod: CachePadded::new(Cursors::new(mask)),
            cons: CachePadded::new(Cursors::new(mask)),
            metrics: Metrics::new(),
            config,
            slots: slots.into_boxed_slice(),
        })
    }

    /// Creates a ring over `slot_count` slots with the default configuration.
    ///
    /// The usable capacity is `slot_count - 1`.
    pub fn with_capacity(slot_count: u32) -> Result<Self, RingError> {
        Self::new(Config::new(slot_count))
    }

    // ---------------------------------------------------------------------
    // ACCESSORS
    // ---------------------------------------------------------------------

    /// Maximum number of elements the ring can hold (`slot_count - 1`).
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.prod.mask
    }

    /// Instantaneous count of published, not-yet-claimed elements.
    ///
    /// Advisory only: sampled with relaxed ordering, stale by the time it
    /// returns, and momentarily inconsistent snapshots are possible.
    #[inline]
    pub fn ready(&self) -> u32 {
        let prod_tail = self.prod.tail.load(Ordering::Relaxed);
        let cons_head = self.cons.head.load(Ordering::Relaxed);
        prod_tail.wrapping_sub(cons_head)
    }

    /// Instantaneous count of free slots. Advisory only, like
    /// [`ready`](Self::ready).
    #[inline]
    pub fn free(&self) -> u32 {
        let cons_tail = self.cons.tail.load(Ordering::Relaxed);
        let prod_head = self.prod.head.load(Ordering::Relaxed);
        self.prod
            .mask
            .wrapping_add(cons_tail)
            .wrapping_sub(prod_head)
    }

    /// Returns true if no published elements are waiting. Advisory.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ready() == 0
    }

    /// Returns true if no free slots remain. Advisory.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.free() == 0
    }

    /// Snapshot of the operation counters, all zero unless
    /// [`Config::with_metrics`] enabled collection.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Enqueues elements from `src`, in order, as one contiguous claim.
    ///
    /// Without [`Flags::SOME_DATA`] the call is all-or-nothing: it either
    /// enqueues `src.len()` elements or fails with
    /// [`WouldBlock`](RingError::WouldBlock) carrying the observed free
    /// count. With `SOME_DATA` it enqueues as many leading elements as fit
    /// (failing only when zero fit).
    ///
    /// FIFO is guaranteed per claim: elements of one call are dequeued in
    /// order, and two calls by the same thread dequeue in call order. No
    /// ordering is promised between racing producers.
    pub fn push(&self, src: &[T], flags: Flags) -> Result<Transfer, RingError>
    where
        T: Copy,
    {
        let len = Self::batch_len(src.len())?;
        let mask = self.prod.mask;

        let mut old_head = self.prod.head.load(Ordering::Relaxed);
        let mut retries = 0u64;
        let (n, free) = loop {
            let mut n = len;

            // Pairs with the Release store of `cons.tail` at the end of
            // pop: every slot at or past `cons_tail` has been fully read
            // and may be overwritten.
            let cons_tail = self.cons.tail.load(Ordering::Acquire);
            let free = mask.wrapping_add(cons_tail).wrapping_sub(old_head);

            if flags.accepts_partial() && free < len {
                n = free;
            }
            if n == 0 || free < n {
                self.metrics.record_claim_retries(&self.config, retries);
                return Err(RingError::WouldBlock { available: free });
            }

            let new_head = old_head.wrapping_add(n);
            if flags.is_single() {
                // Sole producer by contract: nobody else moves prod.head.
                self.prod.head.store(new_head, Ordering::Relaxed);
                break (n, free);
            }
            match self.prod.head.compare_exchange(
                old_head,
                new_head,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break (n, free),
                Err(current) => {
                    old_head = current;
                    retries += 1;
                }
            }
        };
        debug_assert_claim_bounded!(n, len, free, mask);

        // The claim window [old_head, old_head + n) is ours alone until we
        // publish; plain stores suffice.
        for i in 0..n {
            let idx = (old_head.wrapping_add(i) & mask) as usize;
            // SAFETY: Writing this slot is safe because:
            // 1. idx is within bounds (masked to slot_count - 1)
            // 2. The claim above reserved the slot exclusively for this call
            // 3. The capacity check guarantees no consumer still reads it
            //    (cons.tail had passed it when we computed `free`)
            unsafe {
                (*self.slots[idx].get()).write(src[i as usize]);
            }
        }

        // Claims publish in arrival order. A later claimant must not expose
        // `prod.tail` past slots an earlier claimant is still writing, so
        // we wait for our turn. The Acquire pairs with the previous
        // claimant's Release below, ordering its payload writes before our
        // own publish.
        let mut spins = 0u64;
        while self.prod.tail.load(Ordering::Acquire) != old_head {
            hint::spin_loop();
            spins += 1;
        }

        // Pairs with the Acquire load of `prod.tail` in pop: everything
        // written above is visible to any consumer that observes the new
        // cursor.
        self.prod
            .tail
            .store(old_head.wrapping_add(n), Ordering::Release);

        self.metrics
            .record_push(&self.config, u64::from(n), retries, spins);
        Ok(Transfer {
            count: n,
            remaining: free - n,
        })
    }

    /// [`push`](Self::push) retried under an adaptive [`Backoff`] while the
    /// ring is full. Gives up and returns the last `WouldBlock` once the
    /// backoff is exhausted; all other outcomes return immediately.
    pub fn push_with_backoff(&self, src: &[T], flags: Flags) -> Result<Transfer, RingError>
    where
        T: Copy,
    {
        let mut backoff = Backoff::new();
        loop {
            match self.push(src, flags) {
                Err(err) if err.is_would_block() && !backoff.is_exhausted() => backoff.snooze(),
                outcome => return outcome,
            }
        }
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// Dequeues up to `dst.len()` elements into `dst`, in FIFO order.
    ///
    /// Without [`Flags::SOME_DATA`] the call fails with
    /// [`WouldBlock`](RingError::WouldBlock) unless `dst.len()` elements
    /// are ready; with it, the call drains whatever is ready (failing only
    /// on an empty ring). The error carries the observed ready count.
    ///
    /// Note the asymmetry with [`push`](Self::push): a push checks that its
    /// *entire* claim fits below the opposite tail, while a pop only needs
    /// elements published at its *starting* cursor, with the ready count
    /// falling out of the same subtraction.
    pub fn pop(&self, dst: &mut [T], flags: Flags) -> Result<Transfer, RingError>
    where
        T: Copy,
    {
        let len = Self::batch_len(dst.len())?;
        let mask = self.cons.mask;

        let mut old_head = self.cons.head.load(Ordering::Relaxed);
        let mut retries = 0u64;
        let (n, ready) = loop {
            let mut n = len;

            // Pairs with the Release store of `prod.tail` at the end of
            // push: elements below `prod_tail` are fully written.
            let prod_tail = self.prod.tail.load(Ordering::Acquire);
            let ready = prod_tail.wrapping_sub(old_head);

            if flags.accepts_partial() && ready < len {
                n = ready;
            }
            if n == 0 || ready < n {
                self.metrics.record_claim_retries(&self.config, retries);
                return Err(RingError::WouldBlock { available: ready });
            }

            let new_head = old_head.wrapping_add(n);
            if flags.is_single() {
                // Sole consumer by contract.
                self.cons.head.store(new_head, Ordering::Relaxed);
                break (n, ready);
            }
            match self.cons.head.compare_exchange(
                old_head,
                new_head,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break (n, ready),
                Err(current) => {
                    old_head = current;
                    retries += 1;
                }
            }
        };
        debug_assert_drain_bounded!(n, len, ready, mask);

        for i in 0..n {
            let idx = (old_head.wrapping_add(i) & mask) as usize;
            // SAFETY: Reading this slot is safe because:
            // 1. idx is within bounds (masked to slot_count - 1)
            // 2. The slot sits below `prod_tail`, so a producer initialized
            //    it and the Acquire load above made that write visible
            // 3. The claim above reserved the slot exclusively for this call
            dst[i as usize] = unsafe { (*self.slots[idx].get()).assume_init_read() };
        }

        // Same in-order publish discipline as the producer side: earlier
        // claimants release their slots back to producers first.
        let mut spins = 0u64;
        while self.cons.tail.load(Ordering::Acquire) != old_head {
            hint::spin_loop();
            spins += 1;
        }

        // Pairs with the Acquire load of `cons.tail` in push: our slot
        // reads above happen before any producer overwrites those slots.
        self.cons
            .tail
            .store(old_head.wrapping_add(n), Ordering::Release);

        self.metrics
            .record_pop(&self.config, u64::from(n), retries, spins);
        Ok(Transfer {
            count: n,
            remaining: ready - n,
        })
    }

    /// [`pop`](Self::pop) retried under an adaptive [`Backoff`] while the
    /// ring is empty. Gives up and returns the last `WouldBlock` once the
    /// backoff is exhausted; all other outcomes return immediately.
    pub fn pop_with_backoff(&self, dst: &mut [T], flags: Flags) -> Result<Transfer, RingError>
    where
        T: Copy,
    {
        let mut backoff = Backoff::new();
        loop {
            match self.pop(dst, flags) {
                Err(err) if err.is_would_block() && !backoff.is_exhausted() => backoff.snooze(),
                outcome => return outcome,
            }
        }
    }

    // ---------------------------------------------------------------------
    // INTERNAL
    // ---------------------------------------------------------------------

    fn batch_len(len: usize) -> Result<u32, RingError> {
        match u32::try_from(len) {
            Ok(0) | Err(_) => Err(RingError::InvalidLength),
            Ok(len) => Ok(len),
        }
    }

    /// Seeds all four cursors at `origin` (the ring stays empty). Lets
    /// tests start right below the u32 wrap boundary.
    #[cfg(test)]
    pub(crate) fn set_cursor_origin(&mut self, origin: u32) {
        self.prod.head.store(origin, Ordering::Relaxed);
        self.prod.tail.store(origin, Ordering::Relaxed);
        self.cons.head.store(origin, Ordering::Relaxed);
        self.cons.tail.store(origin, Ordering::Relaxed);
    }
}
