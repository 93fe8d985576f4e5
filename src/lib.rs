//! RingMPMC - Lock-Free Multi-Producer Multi-Consumer Bounded Queue
//!
//! A bounded ring buffer that transports fixed-size `Copy` elements between
//! threads in FIFO order, using the four-cursor reserve/publish protocol:
//! each role (producer, consumer) serializes claims through a CAS on its
//! *head* cursor and publishes finished work through a Release store on its
//! *tail* cursor. A single acquire/release pair per bulk transfer makes the
//! plain element copies visible without per-slot atomics.
//!
//! # Key Features
//!
//! - Bulk transfers: one call claims, fills and publishes a contiguous
//!   range of slots
//! - Cache-line separated producer and consumer cursor groups (no false
//!   sharing between the two roles)
//! - Partial transfers on request ([`Flags::SOME_DATA`])
//! - Single-producer / single-consumer fast paths that skip the CAS
//!   ([`Flags::single`])
//! - Never parks a thread: full/empty conditions surface as
//!   [`RingError::WouldBlock`] for the caller's own retry policy
//!
//! # Example
//!
//! ```
//! use ringmpmc_rs::{Flags, Ring};
//!
//! // 8 slots hold up to 7 elements; one slot always stays empty.
//! let ring = Ring::<u64>::with_capacity(8).unwrap();
//!
//! ring.push(&[1, 2, 3], Flags::NONE).unwrap();
//!
//! let mut out = [0u64; 4];
//! let drained = ring.pop(&mut out, Flags::SOME_DATA).unwrap();
//! assert_eq!(drained.count, 3);
//! assert_eq!(&out[..3], &[1, 2, 3]);
//! ```

mod backoff;
mod config;
mod error;
mod flags;
mod invariants;
mod metrics;
mod ring;

pub use backoff::Backoff;
pub use config::{Config, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG};
pub use error::RingError;
pub use flags::Flags;
pub use metrics::{Metrics, MetricsSnapshot};
pub use ring::{Ring, Transfer};
