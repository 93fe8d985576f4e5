use crate::Config;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe operation counters, updated only when
/// [`Config::enable_metrics`] is set.
///
/// All counters use relaxed increments: they are monotone tallies with no
/// synchronization role.
#[derive(Debug, Default)]
pub struct Metrics {
    items_pushed: AtomicU64,
    items_popped: AtomicU64,
    batches_pushed: AtomicU64,
    batches_popped: AtomicU64,
    /// Claim CAS attempts that lost to a same-role peer.
    claim_retries: AtomicU64,
    /// Iterations spent waiting for an earlier claimant to publish.
    publish_spins: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_push(&self, config: &Config, items: u64, retries: u64, spins: u64) {
        if config.enable_metrics {
            self.items_pushed.fetch_add(items, Ordering::Relaxed);
            self.batches_pushed.fetch_add(1, Ordering::Relaxed);
            self.claim_retries.fetch_add(retries, Ordering::Relaxed);
            self.publish_spins.fetch_add(spins, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_pop(&self, config: &Config, items: u64, retries: u64, spins: u64) {
        if config.enable_metrics {
            self.items_popped.fetch_add(items, Ordering::Relaxed);
            self.batches_popped.fetch_add(1, Ordering::Relaxed);
            self.claim_retries.fetch_add(retries, Ordering::Relaxed);
            self.publish_spins.fetch_add(spins, Ordering::Relaxed);
        }
    }

    /// Retries spent by a claim loop that ultimately failed would-block.
    pub(crate) fn record_claim_retries(&self, config: &Config, retries: u64) {
        if config.enable_metrics && retries > 0 {
            self.claim_retries.fetch_add(retries, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_pushed: self.items_pushed.load(Ordering::Relaxed),
            items_popped: self.items_popped.load(Ordering::Relaxed),
            batches_pushed: self.batches_pushed.load(Ordering::Relaxed),
            batches_popped: self.batches_popped.load(Ordering::Relaxed),
            claim_retries: self.claim_retries.load(Ordering::Relaxed),
            publish_spins: self.publish_spins.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the [`Metrics`] counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub items_pushed: u64,
    pub items_popped: u64,
    pub batches_pushed: u64,
    pub batches_popped: u64,
    pub claim_retries: u64,
    pub publish_spins: u64,
}
