//! Monitor configuration
//!
//! Firmware bakes these in at build time; with the `serde` feature they
//! round-trip through postcard like the rest of the board configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Link silence after which failed polls count as a timeout
pub const LINK_TIMEOUT_MS: u32 = 30_000;

/// Longest sleep between polls once the display is asleep
pub const SLEEP_WAIT_MS: u32 = 60_000;

/// How long to wait for UI input between polls when not drawing
pub const UI_WAIT_MS: u32 = 1_000;

/// Link monitor timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MonitorConfig {
    /// Liveness age beyond which a failed poll becomes `SerialTimeout`
    pub link_timeout_ms: u32,
    /// Wait in `Sleeping` before polling again
    pub sleep_wait_ms: u32,
    /// UI wait in every state except `Draw`
    pub ui_wait_ms: u32,
}

impl MonitorConfig {
    pub const DEFAULT: Self = Self {
        link_timeout_ms: LINK_TIMEOUT_MS,
        sleep_wait_ms: SLEEP_WAIT_MS,
        ui_wait_ms: UI_WAIT_MS,
    };
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
