//! # Packet Rate Aggregator
//!
//! Fixed-window action counters. Network threads increment; the tick thread
//! samples and resets once per window. No smoothing: a burst at the start of
//! a window counts the same as one spread across it.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Kinds of rate-counted packets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// Arm swing animation.
    Swing,
    /// Generic custom payload.
    Payload,
}

impl PacketKind {
    const COUNT: usize = 2;

    const fn index(self) -> usize {
        match self {
            Self::Swing => 0,
            Self::Payload => 1,
        }
    }
}

/// Per-participant packet counters.
#[derive(Debug, Default)]
pub struct PacketCounters {
    counts: [AtomicU32; PacketKind::COUNT],
    /// Drop further packets of this kind until the next passing window.
    cancelled: [AtomicBool; PacketKind::COUNT],
}

impl PacketCounters {
    /// Counts one packet and returns the running total for the window.
    pub fn increment(&self, kind: PacketKind) -> u32 {
        self.counts[kind.index()]
            .fetch_add(1, Ordering::Relaxed)
            .saturating_add(1)
    }

    /// Current count without resetting.
    #[must_use]
    pub fn count(&self, kind: PacketKind) -> u32 {
        self.counts[kind.index()].load(Ordering::Relaxed)
    }

    /// Returns the window's count and starts a new window.
    pub fn sample_and_reset(&self, kind: PacketKind) -> u32 {
        self.counts[kind.index()].swap(0, Ordering::AcqRel)
    }

    /// Should packets of this kind be cancelled?
    #[must_use]
    pub fn is_cancelled(&self, kind: PacketKind) -> bool {
        self.cancelled[kind.index()].load(Ordering::Acquire)
    }

    /// Sets whether packets of this kind are cancelled.
    pub fn set_cancelled(&self, kind: PacketKind, cancelled: bool) {
        self.cancelled[kind.index()].store(cancelled, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sample_and_reset() {
        let counters = PacketCounters::default();
        for _ in 0..51 {
            counters.increment(PacketKind::Swing);
        }
        assert_eq!(counters.count(PacketKind::Payload), 0);
        assert_eq!(counters.sample_and_reset(PacketKind::Swing), 51);
        assert_eq!(counters.count(PacketKind::Swing), 0);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let counters = Arc::new(PacketCounters::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counters = Arc::clone(&counters);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        counters.increment(PacketKind::Payload);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counters.sample_and_reset(PacketKind::Payload), 4_000);
    }

    #[test]
    fn test_cancel_flag() {
        let counters = PacketCounters::default();
        assert!(!counters.is_cancelled(PacketKind::Swing));
        counters.set_cancelled(PacketKind::Swing, true);
        assert!(counters.is_cancelled(PacketKind::Swing));
        assert!(!counters.is_cancelled(PacketKind::Payload));
    }
}
