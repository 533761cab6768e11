//! Link timing configuration
//!
//! The only timeouts in the system are fixed retry budgets: a read waits at
//! most `read_retries × read_poll_ms`, a flush keeps trying for at most
//! `write_retries × write_retry_ms`.

use embassy_time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default receive poll attempts
pub const READ_MAX_RETRY: u32 = 100;

/// Default receive poll interval (ms)
pub const READ_POLL_MS: u32 = 5;

/// Default hardware transmit attempts per flush
pub const WRITE_MAX_RETRY: u32 = 10;

/// Default delay between transmit attempts (ms)
pub const WRITE_RETRY_MS: u32 = 2;

/// Retry budgets for the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkTiming {
    /// Occupancy polls before `wait_for` gives up
    pub read_retries: u32,
    /// Sleep between occupancy polls (ms)
    pub read_poll_ms: u32,
    /// Transmit attempts before a flush gives up
    pub write_retries: u32,
    /// Sleep between transmit attempts (ms)
    pub write_retry_ms: u32,
}

impl LinkTiming {
    pub const DEFAULT: Self = Self {
        read_retries: READ_MAX_RETRY,
        read_poll_ms: READ_POLL_MS,
        write_retries: WRITE_MAX_RETRY,
        write_retry_ms: WRITE_RETRY_MS,
    };

    pub fn read_poll(&self) -> Duration {
        Duration::from_millis(self.read_poll_ms as u64)
    }

    pub fn write_retry_delay(&self) -> Duration {
        Duration::from_millis(self.write_retry_ms as u64)
    }

    /// Upper bound on how long a single `wait_for` sleeps
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_retries as u64 * self.read_poll_ms as u64)
    }
}

impl Default for LinkTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}
