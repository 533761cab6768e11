//! Board-agnostic logic for the mixer display
//!
//! This crate holds everything the display decides without touching
//! hardware or the serial link directly:
//!
//! - Link monitor state machine (wake, draw, idle, sleep)
//! - Mixer slots tracking what each on-screen line shows
//! - Monitor configuration

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod monitor;
pub mod slots;

pub use config::MonitorConfig;
pub use monitor::{LinkEvent, LinkState, MonitorAction};
pub use slots::{MixerSlots, SessionSlot};
