//! Link monitor state machine
//!
//! Drives the display's power state from UI activity and change polls.
//! The machine is explicit and finite: each loop iteration classifies what
//! happened into one [`LinkEvent`], performs the [`MonitorAction`] of the
//! current state, then transitions.

pub mod events;
pub mod machine;

pub use events::LinkEvent;
pub use machine::{LinkState, MonitorAction};
