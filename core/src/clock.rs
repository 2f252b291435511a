//! Time source abstraction
//!
//! Every engine-visible instant is a plain unix timestamp plus a block
//! height, supplied through the `Clock` trait so tests can drive time
//! explicitly instead of sleeping.

use parking_lot::Mutex;

use crate::types::{BlockNumber, Timestamp};

/// Supplies the current time and block height.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
    fn block_number(&self) -> BlockNumber;
}

/// Wall-clock time source. Block height advances with wall-clock seconds,
/// which keeps historical token queries monotonic without a real chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp().max(0) as Timestamp
    }

    fn block_number(&self) -> BlockNumber {
        self.now()
    }
}

/// Manually driven time source for tests.
#[derive(Debug, Default)]
pub struct MockClock {
    inner: Mutex<MockClockState>,
}

#[derive(Debug, Default, Clone, Copy)]
struct MockClockState {
    now: Timestamp,
    block: BlockNumber,
}

impl MockClock {
    pub fn new(now: Timestamp, block: BlockNumber) -> Self {
        Self {
            inner: Mutex::new(MockClockState { now, block }),
        }
    }

    pub fn set_time(&self, now: Timestamp) {
        self.inner.lock().now = now;
    }

    pub fn advance(&self, secs: u64) {
        self.inner.lock().now += secs;
    }

    pub fn set_block(&self, block: BlockNumber) {
        self.inner.lock().block = block;
    }

    pub fn advance_block(&self, blocks: u64) {
        self.inner.lock().block += blocks;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Timestamp {
        self.inner.lock().now
    }

    fn block_number(&self) -> BlockNumber {
        self.inner.lock().block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_advances() {
        let clock = MockClock::new(1000, 5);
        assert_eq!(clock.now(), 1000);
        assert_eq!(clock.block_number(), 5);

        clock.advance(50);
        clock.advance_block(2);
        assert_eq!(clock.now(), 1050);
        assert_eq!(clock.block_number(), 7);

        clock.set_time(9999);
        assert_eq!(clock.now(), 9999);
    }

    #[test]
    fn test_system_clock_is_nonzero() {
        let clock = SystemClock;
        assert!(clock.now() > 0);
        assert_eq!(clock.now(), clock.block_number());
    }
}
