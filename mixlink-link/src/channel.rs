//! Byte channel seen by the exchange engine

/// Duplex byte channel with bounded, poll-based waiting
///
/// [`crate::Transport`] is the production implementation.
#[allow(async_fn_in_trait)]
pub trait ByteChannel {
    /// Queue bytes for transmission
    ///
    /// Returns the number of bytes accepted; anything short of `data.len()`
    /// means the frame did not go out whole.
    fn write(&self, data: &[u8]) -> usize;

    /// Push queued bytes to the hardware now
    async fn flush(&self);

    /// Wait until at least `n` bytes are readable
    ///
    /// Returns the number of readable bytes, or 0 when the retry budget ran
    /// out first.
    async fn wait_for(&self, n: usize) -> usize;

    /// Move up to `buf.len()` received bytes into `buf`, oldest first
    fn read(&self, buf: &mut [u8]) -> usize;

    /// Drop everything received so far
    fn empty_rx(&self);
}
