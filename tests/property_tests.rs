//! Property-based tests for the cursor protocol invariants.
//!
//! A single-threaded `VecDeque` model replays every operation sequence the
//! ring sees; counts, contents and error payloads must agree exactly. The
//! remaining properties quantify the bounds that hold for any interleaving
//! of successful operations.

use proptest::prelude::*;
use ringmpmc_rs::{Flags, Ring, RingError};
use std::collections::VecDeque;

// =============================================================================
// Model equivalence: the ring behaves like a bounded FIFO queue
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Push { len: usize, partial: bool },
    Pop { len: usize, partial: bool },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1usize..=9, prop::bool::ANY).prop_map(|(len, partial)| Op::Push { len, partial }),
        (1usize..=9, prop::bool::ANY).prop_map(|(len, partial)| Op::Pop { len, partial }),
    ]
}

proptest! {
    #[test]
    fn matches_bounded_queue_model(ops in prop::collection::vec(op_strategy(), 1..250)) {
        let ring = Ring::<u32>::with_capacity(16).unwrap();
        let capacity = ring.capacity() as usize;
        let mut model: VecDeque<u32> = VecDeque::new();
        let mut next_value = 0u32;

        for op in ops {
            match op {
                Op::Push { len, partial } => {
                    let flags = if partial { Flags::SOME_DATA } else { Flags::NONE };
                    let batch: Vec<u32> =
                        (next_value..next_value + len as u32).collect();
                    let free = capacity - model.len();

                    match ring.push(&batch, flags) {
                        Ok(transfer) => {
                            let count = transfer.count as usize;
                            if partial {
                                prop_assert_eq!(count, len.min(free));
                            } else {
                                prop_assert_eq!(count, len);
                            }
                            prop_assert_eq!(transfer.remaining as usize, free - count);
                            model.extend(&batch[..count]);
                            next_value += transfer.count;
                        }
                        Err(RingError::WouldBlock { available }) => {
                            prop_assert_eq!(available as usize, free);
                            // All-or-nothing fails whenever the batch does
                            // not fit; partial mode only on a full ring.
                            if partial {
                                prop_assert_eq!(free, 0);
                            } else {
                                prop_assert!(free < len);
                            }
                        }
                        Err(other) => prop_assert!(false, "unexpected error {other:?}"),
                    }
                }
                Op::Pop { len, partial } => {
                    let flags = if partial { Flags::SOME_DATA } else { Flags::NONE };
                    let mut out = vec![0u32; len];
                    let ready = model.len();

                    match ring.pop(&mut out, flags) {
                        Ok(transfer) => {
                            let count = transfer.count as usize;
                            if partial {
                                prop_assert_eq!(count, len.min(ready));
                            } else {
                                prop_assert_eq!(count, len);
                            }
                            prop_assert_eq!(transfer.remaining as usize, ready - count);
                            for value in &out[..count] {
                                prop_assert_eq!(Some(*value), model.pop_front());
                            }
                        }
                        Err(RingError::WouldBlock { available }) => {
                            prop_assert_eq!(available as usize, ready);
                            if partial {
                                prop_assert_eq!(ready, 0);
                            } else {
                                prop_assert!(ready < len);
                            }
                        }
                        Err(other) => prop_assert!(false, "unexpected error {other:?}"),
                    }
                }
            }

            // Occupancy bounds hold after every operation.
            prop_assert_eq!(ring.ready() as usize, model.len());
            prop_assert_eq!(ring.free() as usize, capacity - model.len());
            prop_assert!(ring.ready() <= ring.capacity());
        }
    }
}

// =============================================================================
// Conservation: everything pushed is popped exactly once, in order
// =============================================================================

proptest! {
    #[test]
    fn conserves_elements(batch_sizes in prop::collection::vec(1usize..=12, 1..60)) {
        let ring = Ring::<u64>::with_capacity(32).unwrap();
        let mut pushed = Vec::new();
        let mut popped = Vec::new();
        let mut next_value = 0u64;

        for len in batch_sizes {
            let batch: Vec<u64> = (next_value..next_value + len as u64).collect();
            if let Ok(transfer) = ring.push(&batch, Flags::SOME_DATA) {
                pushed.extend_from_slice(&batch[..transfer.count as usize]);
                next_value += u64::from(transfer.count);
            }

            // Drain roughly half as we go to keep the ring churning.
            let mut out = [0u64; 6];
            if let Ok(transfer) = ring.pop(&mut out, Flags::SOME_DATA) {
                popped.extend_from_slice(&out[..transfer.count as usize]);
            }
        }

        // Final drain.
        let mut out = [0u64; 32];
        while let Ok(transfer) = ring.pop(&mut out, Flags::SOME_DATA) {
            popped.extend_from_slice(&out[..transfer.count as usize]);
        }

        prop_assert!(ring.is_empty());
        prop_assert_eq!(pushed, popped);
    }
}

// =============================================================================
// Construction: the slot count predicate is exact
// =============================================================================

proptest! {
    #[test]
    fn construction_accepts_exactly_valid_slot_counts(slot_count in 0u32..=4096) {
        let valid = slot_count >= 2 && slot_count.is_power_of_two();
        match Ring::<u32>::with_capacity(slot_count) {
            Ok(ring) => {
                prop_assert!(valid);
                prop_assert_eq!(ring.capacity(), slot_count - 1);
            }
            Err(RingError::InvalidCapacity(reported)) => {
                prop_assert!(!valid);
                prop_assert_eq!(reported, slot_count);
            }
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }
}

// =============================================================================
// Partial transfers never exceed the request or the available space
// =============================================================================

proptest! {
    #[test]
    fn partial_transfer_bounds(
        pre_fill in 0usize..=15,
        request in 1usize..=20,
    ) {
        let ring = Ring::<u32>::with_capacity(16).unwrap();
        let capacity = ring.capacity() as usize;

        let fill: Vec<u32> = (0..pre_fill as u32).collect();
        if !fill.is_empty() {
            ring.push(&fill, Flags::NONE).unwrap();
        }

        let batch = vec![99u32; request];
        let free = capacity - pre_fill;
        match ring.push(&batch, Flags::SOME_DATA) {
            Ok(transfer) => {
                prop_assert!(transfer.count as usize <= request);
                prop_assert!(transfer.count as usize <= free);
                prop_assert!(transfer.count > 0);
            }
            Err(RingError::WouldBlock { available }) => {
                prop_assert_eq!(available, 0);
                prop_assert_eq!(free, 0);
            }
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }
}
