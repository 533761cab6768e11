//! Link monitor states and transitions

use super::events::LinkEvent;
use crate::config::MonitorConfig;

/// Display power and redraw state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Backlight coming back on
    #[default]
    WakeUp,
    /// Reload the table and redraw
    Draw,
    /// Nothing to redraw, keep polling
    Idle,
    /// Link lost, backlight going off
    GoSleep,
    /// Backlight off, polling slowly
    Sleeping,
}

/// Side effect the firmware performs for the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorAction {
    /// Backlight to full
    WakeBacklight,
    /// Load the volume table and redraw changed slots
    RefreshTable,
    Nothing,
    /// Backlight off
    DimBacklight,
    /// Block for up to this many milliseconds
    SleepWait(u32),
}

impl LinkState {
    /// Check if the backlight is off
    pub fn is_asleep(&self) -> bool {
        matches!(self, LinkState::GoSleep | LinkState::Sleeping)
    }

    /// What to do in this state before transitioning
    pub fn action(&self, config: &MonitorConfig) -> MonitorAction {
        match self {
            LinkState::WakeUp => MonitorAction::WakeBacklight,
            LinkState::Draw => MonitorAction::RefreshTable,
            LinkState::Idle => MonitorAction::Nothing,
            LinkState::GoSleep => MonitorAction::DimBacklight,
            LinkState::Sleeping => MonitorAction::SleepWait(config.sleep_wait_ms),
        }
    }

    /// How long to wait for UI input before polling
    ///
    /// Zero while drawing so pending changes are picked up right away.
    pub fn ui_wait_ms(&self, config: &MonitorConfig) -> u32 {
        match self {
            LinkState::Draw => 0,
            _ => config.ui_wait_ms,
        }
    }

    /// Process an event and return the next state
    pub fn transition(self, event: LinkEvent) -> Self {
        use LinkEvent::*;
        use LinkState::*;

        match (self, event) {
            // Always redraw after waking
            (WakeUp, _) => Draw,

            (Draw, Change | UiInput) => Draw,
            (Draw, _) => Idle,

            (Idle, Change | UiInput) => Draw,
            (Idle, SerialTimeout) => GoSleep,
            (Idle, _) => Idle,

            // Only the host can wake the display
            (GoSleep | Sleeping, Change) => WakeUp,
            (GoSleep | Sleeping, _) => Sleeping,
        }
    }
}
