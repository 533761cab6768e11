//! Mixlink - Mixer Display Firmware
//!
//! Firmware for an RP2040 display that mirrors a host computer's
//! per-application volume mixer over a CRC-checked serial link.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use mixlink_hal::IoLink;
use mixlink_link::{MixerLink, Transport};

use crate::channels::{DisplayLink, DisplayTransport};
use crate::config::{LINK_TIMING, UART_BAUD};
use crate::tasks::monitor::ICON_SIZE;

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

// Link instances shared between tasks
static TRANSPORT: StaticCell<DisplayTransport> = StaticCell::new();
static LINK: StaticCell<DisplayLink> = StaticCell::new();

// Only one icon is held at a time
static ICON: StaticCell<[u8; ICON_SIZE]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Mixlink firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Setup UART for the host link
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = UART_BAUD;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized at {} baud", UART_BAUD);

    let transport: &'static DisplayTransport =
        TRANSPORT.init(Transport::new(IoLink::new(tx), LINK_TIMING));
    let link: &'static DisplayLink = LINK.init(MixerLink::new(transport));

    // Backlight on GPIO 13, buttons on GPIO 14-17 (active low)
    let backlight = Output::new(p.PIN_13, Level::High);
    let buttons = tasks::Buttons {
        next: Input::new(p.PIN_14, Pull::Up),
        minus: Input::new(p.PIN_15, Pull::Up),
        plus: Input::new(p.PIN_16, Pull::Up),
        mute: Input::new(p.PIN_17, Pull::Up),
    };

    let icon = ICON.init([0u8; ICON_SIZE]);

    info!("Spawning tasks...");

    spawner.spawn(tasks::flush_task(transport)).unwrap();
    spawner.spawn(tasks::uart_rx_task(rx, transport)).unwrap();
    spawner.spawn(tasks::buttons_task(buttons)).unwrap();
    spawner
        .spawn(tasks::monitor_task(link, backlight, icon))
        .unwrap();

    info!("All tasks spawned");

    link.echo("mixlink display up").await;
}
