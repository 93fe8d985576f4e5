//! Debug assertion macros for the cursor protocol invariants.
//!
//! Active only in debug builds; release builds compile them away. Each
//! macro is checked after a successful claim, where the confirmed head
//! value makes the bound sound (checking inside the claim loop would race
//! against same-role peers refreshing the head).

/// Assert that a producer claim stayed within its request and the free
/// slots that justified it, and that the free count itself was in range.
///
/// Bounds: `1 <= n <= len`, `n <= free <= capacity`.
macro_rules! debug_assert_claim_bounded {
    ($n:expr, $len:expr, $free:expr, $capacity:expr) => {
        debug_assert!(
            $n >= 1 && $n <= $len && $n <= $free && $free <= $capacity,
            "claim out of bounds: n={} len={} free={} capacity={}",
            $n,
            $len,
            $free,
            $capacity
        )
    };
}

/// Assert that a consumer claim stayed within its request and the ready
/// elements that justified it, and that the ready count itself was in
/// range (a ready count past capacity means a cursor overtook its bound).
macro_rules! debug_assert_drain_bounded {
    ($n:expr, $len:expr, $ready:expr, $capacity:expr) => {
        debug_assert!(
            $n >= 1 && $n <= $len && $n <= $ready && $ready <= $capacity,
            "drain out of bounds: n={} len={} ready={} capacity={}",
            $n,
            $len,
            $ready,
            $capacity
        )
    };
}

pub(crate) use debug_assert_claim_bounded;
pub(crate) use debug_assert_drain_bounded;
