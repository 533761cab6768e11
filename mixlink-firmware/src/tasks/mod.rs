//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod buttons;
pub mod link;
pub mod monitor;

pub use buttons::{buttons_task, Buttons};
pub use link::{flush_task, uart_rx_task};
pub use monitor::monitor_task;
