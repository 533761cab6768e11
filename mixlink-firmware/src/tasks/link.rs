//! Serial link tasks
//!
//! The flush task drains the transport's TX queue whenever something is
//! written; the RX task moves UART bytes into the transport's RX queue.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use crate::channels::DisplayTransport;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Flush task - sends queued bytes in the background
#[embassy_executor::task]
pub async fn flush_task(transport: &'static DisplayTransport) -> ! {
    info!("Flush task started");
    transport.run().await
}

/// UART RX task - feeds received bytes to the transport
#[embassy_executor::task]
pub async fn uart_rx_task(mut rx: BufferedUartRx, transport: &'static DisplayTransport) {
    info!("UART RX task started");

    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);
                let accepted = transport.receive(&buf[..n]);
                if accepted < n {
                    warn!("RX queue full, dropped {} bytes", n - accepted);
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}
