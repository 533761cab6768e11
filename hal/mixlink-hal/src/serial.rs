//! Serial link abstraction
//!
//! The transport drains its transmit queue through [`SerialLink::transmit`].
//! Received bytes travel the other way: the hardware receive path pushes them
//! into the transport itself, so there is no receive method here.

/// Hardware byte-transmit primitive
///
/// Implementations must not block indefinitely. Accepting fewer bytes than
/// offered (including zero) is how the hardware reports "busy"; the transport
/// retries the rest later.
pub trait SerialLink {
    /// Hand `data` to the hardware
    ///
    /// Returns the number of bytes actually accepted.
    fn transmit(&mut self, data: &[u8]) -> usize;

    /// Whether the peer is attached
    ///
    /// A link that is not connected is never flushed, bytes stay queued.
    fn is_connected(&self) -> bool;
}

impl<T: SerialLink + ?Sized> SerialLink for &mut T {
    fn transmit(&mut self, data: &[u8]) -> usize {
        (**self).transmit(data)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

/// [`SerialLink`] over any `embedded_io::Write`
///
/// UARTs have no notion of a connected peer, so the status is a flag the
/// board code toggles (DTR line, USB enumeration, ...). It starts connected.
#[derive(Debug)]
pub struct IoLink<W> {
    io: W,
    connected: bool,
}

impl<W: embedded_io::Write> IoLink<W> {
    /// Wrap a writer
    pub fn new(io: W) -> Self {
        Self { io, connected: true }
    }

    /// Update the connection status
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Get a mutable reference to the wrapped writer
    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.io
    }

    /// Release the wrapped writer
    pub fn into_inner(self) -> W {
        self.io
    }
}

impl<W: embedded_io::Write> SerialLink for IoLink<W> {
    fn transmit(&mut self, data: &[u8]) -> usize {
        if data.is_empty() {
            return 0;
        }
        // A write error is reported as nothing sent; the transport retries.
        self.io.write(data).unwrap_or(0)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
