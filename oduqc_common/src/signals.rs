//! Process-wide cancellation signals.
//!
//! `CancellationSource` bundles the emergency-stop and fatal-condition flags
//! in one lock-free byte. It is shared through an `Arc` between whatever sets
//! the flags (an interrupt or signal handler, external safety checks) and the
//! motion core, which only reads them.

use bitflags::bitflags;
use std::sync::atomic::{AtomicU8, Ordering};

bitflags! {
    /// Pending cancellation signals.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CancelSignals: u8 {
        /// Set asynchronously by the emergency-stop input.
        const EMERGENCY_STOP  = 0x01;
        /// Set by safety checks outside the motion core.
        const FATAL_CONDITION = 0x02;
    }
}

/// Two independently settable, never blocking cancellation flags.
#[derive(Debug, Default)]
pub struct CancellationSource {
    bits: AtomicU8,
}

impl CancellationSource {
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
        }
    }

    /// Raise the emergency stop. Safe to call from a signal handler thread.
    #[inline]
    pub fn trigger_emergency_stop(&self) {
        self.bits
            .fetch_or(CancelSignals::EMERGENCY_STOP.bits(), Ordering::SeqCst);
    }

    /// Operator resume.
    #[inline]
    pub fn clear_emergency_stop(&self) {
        self.bits
            .fetch_and(!CancelSignals::EMERGENCY_STOP.bits(), Ordering::SeqCst);
    }

    #[inline]
    pub fn set_fatal_condition(&self, active: bool) {
        if active {
            self.bits
                .fetch_or(CancelSignals::FATAL_CONDITION.bits(), Ordering::SeqCst);
        } else {
            self.bits
                .fetch_and(!CancelSignals::FATAL_CONDITION.bits(), Ordering::SeqCst);
        }
    }

    /// Both flags read in one atomic load.
    #[inline]
    pub fn snapshot(&self) -> CancelSignals {
        CancelSignals::from_bits_truncate(self.bits.load(Ordering::SeqCst))
    }

    #[inline]
    pub fn is_emergency_stop(&self) -> bool {
        self.snapshot().contains(CancelSignals::EMERGENCY_STOP)
    }

    #[inline]
    pub fn is_fatal_condition(&self) -> bool {
        self.snapshot().contains(CancelSignals::FATAL_CONDITION)
    }

    /// True when any flag is raised.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        !self.snapshot().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn flags_are_independent() {
        let source = CancellationSource::new();
        assert!(!source.is_cancelled());

        source.trigger_emergency_stop();
        source.set_fatal_condition(true);
        assert_eq!(
            source.snapshot(),
            CancelSignals::EMERGENCY_STOP | CancelSignals::FATAL_CONDITION
        );

        source.clear_emergency_stop();
        assert!(!source.is_emergency_stop());
        assert!(source.is_fatal_condition());

        source.set_fatal_condition(false);
        assert!(!source.is_cancelled());
    }

    #[test]
    fn visible_across_threads() {
        let source = Arc::new(CancellationSource::new());
        let remote = Arc::clone(&source);
        thread::spawn(move || remote.trigger_emergency_stop())
            .join()
            .unwrap();
        assert!(source.is_emergency_stop());
    }
}
