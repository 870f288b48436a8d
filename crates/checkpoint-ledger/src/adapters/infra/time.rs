use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use shared_types::Timestamp;

use crate::ports::outbound::TimeSource;

/// Default time source using system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Clock set by hand, shared between clones.
#[derive(Debug, Default, Clone)]
pub struct ManualTimeSource {
    now: Arc<AtomicU64>,
}

impl ManualTimeSource {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualTimeSource::new(100);
        let handle = clock.clone();

        handle.advance(5);
        assert_eq!(clock.now(), 105);

        handle.set(7);
        assert_eq!(clock.now(), 7);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemTimeSource.now() > 1_577_836_800);
    }
}
