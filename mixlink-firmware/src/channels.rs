//! Inter-task communication
//!
//! Shared link instances and the button channel between Embassy tasks.

use embassy_rp::uart::BufferedUartTx;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use mixlink_hal::IoLink;
use mixlink_link::{MixerLink, Transport};

/// Transport queue capacities
pub const TX_QUEUE: usize = 512;
pub const RX_QUEUE: usize = 512;

/// Channel capacity for button presses
const INPUT_CHANNEL_SIZE: usize = 4;

/// Buffered transport over UART0
pub type DisplayTransport =
    Transport<CriticalSectionRawMutex, IoLink<BufferedUartTx>, TX_QUEUE, RX_QUEUE>;

/// Protocol engine talking to the host
pub type DisplayLink = MixerLink<'static, CriticalSectionRawMutex, DisplayTransport>;

/// Front-panel buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Button {
    /// Select the next mixer line
    Next,
    Minus,
    Plus,
    Mute,
}

/// Button presses from the input task
pub static INPUT_CHANNEL: Channel<CriticalSectionRawMutex, Button, INPUT_CHANNEL_SIZE> =
    Channel::new();
