//! Buffered serial transport
//!
//! Owns a bounded TX queue drained into the [`SerialLink`] and a bounded RX
//! queue filled by the hardware receive path. Producers never block: a write
//! that does not fit is refused whole, received bytes that do not fit are
//! dropped.
//!
//! Draining happens in three ways:
//! - [`Transport::run`], a background task woken by every successful write
//! - [`Transport::flush`], for callers that need the bytes out now
//! - [`Transport::try_flush`], a single pass that never waits, for interrupt
//!   context

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use heapless::Deque;

use mixlink_hal::SerialLink;
use mixlink_protocol::{CHECKSUM_LEN, SCRATCH_SIZE};

use crate::channel::ByteChannel;
use crate::config::LinkTiming;
use crate::sync::IsrGuard;

/// Bytes handed to the hardware per transmit attempt
const FLUSH_CHUNK: usize = 64;

/// Outcome of one transmit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drain {
    /// Nothing queued
    Empty,
    /// Hardware took at least one byte
    Sent,
    /// Hardware took nothing
    Stalled,
}

/// Buffered duplex byte channel over a [`SerialLink`]
///
/// `TX` and `RX` are the queue capacities in bytes. `RX` must hold the
/// largest checksummed unit the engine reads.
pub struct Transport<M: RawMutex, L, const TX: usize, const RX: usize> {
    /// Doubles as the flush lock
    link: Mutex<M, L>,
    tx: BlockingMutex<M, RefCell<Deque<u8, TX>>>,
    rx: BlockingMutex<M, RefCell<Deque<u8, RX>>>,
    tx_pending: Signal<M, ()>,
    timing: LinkTiming,
}

impl<M: RawMutex, L: SerialLink, const TX: usize, const RX: usize> Transport<M, L, TX, RX> {
    const RX_HOLDS_UNIT: () = assert!(
        RX >= SCRATCH_SIZE + CHECKSUM_LEN,
        "RX queue cannot hold a full checksummed unit"
    );

    pub const fn new(link: L, timing: LinkTiming) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::RX_HOLDS_UNIT;
        Self {
            link: Mutex::new(link),
            tx: BlockingMutex::new(RefCell::new(Deque::new())),
            rx: BlockingMutex::new(RefCell::new(Deque::new())),
            tx_pending: Signal::new(),
            timing,
        }
    }

    pub fn timing(&self) -> &LinkTiming {
        &self.timing
    }

    /// Exclusive access to the hardware link
    ///
    /// Holding the guard blocks every flush.
    pub async fn link(&self) -> MutexGuard<'_, M, L> {
        self.link.lock().await
    }

    /// Queue `data` for transmission
    ///
    /// All or nothing: returns `data.len()` on success, 0 when the TX queue
    /// lacks room for the whole frame.
    pub fn write(&self, data: &[u8]) -> usize {
        if data.is_empty() {
            return 0;
        }

        let accepted = self.tx.lock(|tx| {
            let mut tx = tx.borrow_mut();
            if tx.capacity() - tx.len() < data.len() {
                return 0;
            }
            for &byte in data {
                // Room was checked above
                let _ = tx.push_back(byte);
            }
            data.len()
        });

        if accepted == 0 {
            #[cfg(feature = "defmt")]
            defmt::warn!("TX queue full, refused {} bytes", data.len());
        } else {
            self.tx_pending.signal(());
        }
        accepted
    }

    /// Bytes waiting in the TX queue
    pub fn pending(&self) -> usize {
        self.tx.lock(|tx| tx.borrow().len())
    }

    /// Drain the TX queue into the link
    ///
    /// Does nothing while the link is disconnected. A link that accepts
    /// nothing is retried `write_retries` times `write_retry_ms` apart, and
    /// any accepted byte restores the full budget. Whatever is still queued
    /// after that waits for the next flush.
    pub async fn flush(&self) {
        let mut link = self.link.lock().await;
        if !link.is_connected() {
            return;
        }

        let mut retries = self.timing.write_retries;
        loop {
            match self.drain_step(&mut *link) {
                Drain::Empty => return,
                Drain::Sent => retries = self.timing.write_retries,
                Drain::Stalled => {
                    retries = retries.saturating_sub(1);
                    if retries == 0 {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("Flush gave up, {} bytes left queued", self.pending());
                        return;
                    }
                    Timer::after(self.timing.write_retry_delay()).await;
                }
            }
        }
    }

    /// One non-waiting drain pass
    ///
    /// Returns `false` if another flush holds the link.
    pub fn try_flush(&self) -> bool {
        let mut guard = IsrGuard::acquire(&self.link);
        let Some(link) = guard.get() else {
            return false;
        };
        if link.is_connected() {
            while self.drain_step(link) == Drain::Sent {}
        }
        true
    }

    /// Background flush loop
    ///
    /// Sleeps until a write signals pending data, then flushes once.
    /// Signals raised while flushing coalesce into one more pass.
    pub async fn run(&self) -> ! {
        loop {
            self.tx_pending.wait().await;
            self.flush().await;
        }
    }

    /// Offer the front contiguous run of the TX queue to the link
    fn drain_step(&self, link: &mut L) -> Drain {
        let mut staged = [0u8; FLUSH_CHUNK];
        let len = self.tx.lock(|tx| {
            let tx = tx.borrow();
            let (front, _) = tx.as_slices();
            let len = front.len().min(FLUSH_CHUNK);
            staged[..len].copy_from_slice(&front[..len]);
            len
        });
        if len == 0 {
            return Drain::Empty;
        }

        let sent = link.transmit(&staged[..len]).min(len);
        if sent == 0 {
            return Drain::Stalled;
        }
        self.tx.lock(|tx| {
            let mut tx = tx.borrow_mut();
            for _ in 0..sent {
                tx.pop_front();
            }
        });
        Drain::Sent
    }

    /// Hardware receive entry point
    ///
    /// Appends as much of `data` as fits and returns that count; the rest is
    /// dropped. Safe to call from interrupt context.
    pub fn receive(&self, data: &[u8]) -> usize {
        let accepted = self.rx.lock(|rx| {
            let mut rx = rx.borrow_mut();
            let mut accepted = 0;
            for &byte in data {
                if rx.push_back(byte).is_err() {
                    break;
                }
                accepted += 1;
            }
            accepted
        });

        if accepted < data.len() {
            #[cfg(feature = "defmt")]
            defmt::warn!("RX queue full, dropped {} bytes", data.len() - accepted);
        }
        accepted
    }

    /// Bytes waiting in the RX queue
    pub fn available(&self) -> usize {
        self.rx.lock(|rx| rx.borrow().len())
    }

    /// Poll until `n` bytes are readable
    ///
    /// Returns the readable count (at least `n`), or 0 once `read_retries`
    /// polls have failed.
    pub async fn wait_for(&self, n: usize) -> usize {
        let mut retries = self.timing.read_retries;
        loop {
            let available = self.available();
            if available >= n {
                return available;
            }
            retries = retries.saturating_sub(1);
            if retries == 0 {
                return 0;
            }
            Timer::after(self.timing.read_poll()).await;
        }
    }

    /// Move up to `buf.len()` bytes out of the RX queue, oldest first
    pub fn read(&self, buf: &mut [u8]) -> usize {
        self.rx.lock(|rx| {
            let mut rx = rx.borrow_mut();
            let mut read = 0;
            while read < buf.len() {
                match rx.pop_front() {
                    Some(byte) => {
                        buf[read] = byte;
                        read += 1;
                    }
                    None => break,
                }
            }
            read
        })
    }

    /// Discard all received bytes
    pub fn empty_rx(&self) {
        self.rx.lock(|rx| rx.borrow_mut().clear());
    }
}

impl<M: RawMutex, L: SerialLink, const TX: usize, const RX: usize> ByteChannel
    for Transport<M, L, TX, RX>
{
    fn write(&self, data: &[u8]) -> usize {
        Transport::write(self, data)
    }

    async fn flush(&self) {
        Transport::flush(self).await
    }

    async fn wait_for(&self, n: usize) -> usize {
        Transport::wait_for(self, n).await
    }

    fn read(&self, buf: &mut [u8]) -> usize {
        Transport::read(self, buf)
    }

    fn empty_rx(&self) {
        Transport::empty_rx(self)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use std::vec::Vec;

    /// Link that accepts at most `limit` bytes per call, `stall_after` calls
    struct FakeLink {
        sent: Vec<u8>,
        limit: usize,
        calls: usize,
        stall_after: usize,
        connected: bool,
    }

    impl FakeLink {
        fn new(limit: usize) -> Self {
            Self {
                sent: Vec::new(),
                limit,
                calls: 0,
                stall_after: usize::MAX,
                connected: true,
            }
        }
    }

    impl SerialLink for FakeLink {
        fn transmit(&mut self, data: &[u8]) -> usize {
            self.calls += 1;
            if self.calls > self.stall_after {
                return 0;
            }
            let n = data.len().min(self.limit);
            self.sent.extend_from_slice(&data[..n]);
            n
        }

        fn is_connected(&self) -> bool {
            self.connected
        }
    }

    type TestTransport = Transport<CriticalSectionRawMutex, FakeLink, 16, 512>;

    const FAST: LinkTiming = LinkTiming {
        read_retries: 5,
        read_poll_ms: 1,
        write_retries: 3,
        write_retry_ms: 1,
    };

    fn transport(limit: usize) -> TestTransport {
        Transport::new(FakeLink::new(limit), FAST)
    }

    #[test]
    fn test_write_is_all_or_nothing() {
        let t = transport(64);
        assert_eq!(t.write(&[1; 10]), 10);
        assert_eq!(t.write(&[2; 7]), 0);
        assert_eq!(t.pending(), 10);
        assert_eq!(t.write(&[3; 6]), 6);
        assert_eq!(t.pending(), 16);
        assert_eq!(t.write(&[]), 0);
    }

    #[test]
    fn test_flush_delivers_in_order() {
        let t = transport(64);
        t.write(&[1, 2, 3]);
        t.write(&[4, 5]);
        block_on(t.flush());
        assert_eq!(t.pending(), 0);
        assert_eq!(block_on(t.link()).sent, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_flush_across_wraparound() {
        let t = transport(64);
        t.write(&[0; 12]);
        block_on(t.flush());
        // Next write wraps the ring
        let data: Vec<u8> = (1..=10).collect();
        t.write(&data);
        block_on(t.flush());
        let link = block_on(t.link());
        assert_eq!(&link.sent[12..], &data[..]);
    }

    #[test]
    fn test_flush_partial_transmit_keeps_order() {
        let t = transport(3);
        t.write(&[1, 2, 3, 4, 5, 6, 7]);
        block_on(t.flush());
        // 3 + 3 + 1, short writes are progress rather than stalls
        assert_eq!(t.pending(), 0);
        assert_eq!(block_on(t.link()).calls, 3);
        assert_eq!(block_on(t.link()).sent, [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_flush_gives_up_and_keeps_bytes() {
        let t = transport(64);
        block_on(t.link()).stall_after = 0;
        t.write(&[9; 5]);
        block_on(t.flush());
        assert_eq!(t.pending(), 5);
        assert_eq!(block_on(t.link()).calls, FAST.write_retries as usize);

        // Later flush picks them up
        block_on(t.link()).stall_after = usize::MAX;
        block_on(t.flush());
        assert_eq!(t.pending(), 0);
    }

    #[test]
    fn test_flush_slow_link_drains_fully() {
        // Far more short writes than the retry budget allows stalls
        let t: Transport<CriticalSectionRawMutex, FakeLink, 256, 512> =
            Transport::new(FakeLink::new(8), LinkTiming::DEFAULT);
        t.write(&[0xAB; 200]);
        block_on(t.flush());
        assert_eq!(t.pending(), 0);
        let link = block_on(t.link());
        assert_eq!(link.calls, 25);
        assert_eq!(link.sent.len(), 200);
    }

    #[test]
    fn test_flush_budget_counts_only_stalls() {
        let t = transport(4);
        block_on(t.link()).stall_after = 3;
        t.write(&[5; 16]);
        block_on(t.flush());
        // Three accepted writes, then the full budget of empty ones
        assert_eq!(t.pending(), 4);
        assert_eq!(block_on(t.link()).calls, 3 + FAST.write_retries as usize);
    }

    #[test]
    fn test_flush_disconnected_is_noop() {
        let t = transport(64);
        block_on(t.link()).connected = false;
        t.write(&[1, 2]);
        block_on(t.flush());
        assert_eq!(t.pending(), 2);
        assert_eq!(block_on(t.link()).calls, 0);
    }

    #[test]
    fn test_try_flush_skips_when_locked() {
        let t = transport(64);
        t.write(&[1, 2, 3]);
        {
            let _held = block_on(t.link());
            assert!(!t.try_flush());
        }
        assert_eq!(t.pending(), 3);
        assert!(t.try_flush());
        assert_eq!(t.pending(), 0);
    }

    #[test]
    fn test_receive_read_fifo() {
        let t = transport(64);
        assert_eq!(t.receive(&[1, 2, 3, 4]), 4);
        let mut buf = [0u8; 3];
        assert_eq!(t.read(&mut buf), 3);
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(t.read(&mut buf), 1);
        assert_eq!(buf[0], 4);
        assert_eq!(t.read(&mut buf), 0);
    }

    #[test]
    fn test_receive_overflow_drops_tail() {
        let t = transport(64);
        let data = [7u8; 600];
        assert_eq!(t.receive(&data), 512);
        assert_eq!(t.available(), 512);
    }

    #[test]
    fn test_empty_rx() {
        let t = transport(64);
        t.receive(&[1, 2, 3]);
        t.empty_rx();
        assert_eq!(t.available(), 0);
    }

    #[test]
    fn test_wait_for_ready() {
        let t = transport(64);
        t.receive(&[0; 6]);
        assert_eq!(block_on(t.wait_for(4)), 6);
    }

    #[test]
    fn test_wait_for_times_out() {
        let t = transport(64);
        t.receive(&[0; 3]);
        assert_eq!(block_on(t.wait_for(4)), 0);
        // Nothing consumed by the failed wait
        assert_eq!(t.available(), 3);
    }
}
