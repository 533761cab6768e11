//! Command/response exchange engine
//!
//! Every public operation is one *exchange*: it takes the session lock, talks
//! to the host, and releases the lock when it returns, whatever the outcome.
//! The session owns the single scratch buffer every verified read decodes
//! into, which is why exchanges can never overlap.
//!
//! # Verified reads
//!
//! A verified read of `n` bytes waits for `n + 4` bytes, reads the payload
//! into scratch, then compares the trailing CRC-32/MPEG-2. A mismatch and a
//! timeout are the same failure.
//!
//! # Failure handling
//!
//! On a failed read the engine sends the `FAIL` sentinel, drops whatever is
//! left in the RX queue, and returns [`LinkError::Checksum`]. Each successful
//! verification stamps the liveness clock ([`MixerLink::since_last_success`]).

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{Duration, Instant};
use portable_atomic::{AtomicU64, Ordering};

use mixlink_protocol::commands::{LOAD_ALL, QUERY_CHANGES, READ_IMG};
use mixlink_protocol::wire::{self, checksum_matches, read_u32, seal_u32};
use mixlink_protocol::{
    ChangeStatus, EntryHeader, ImageRequest, MuteFrame, ProgramVolume, Response, VolumeFrame,
    VolumeTable, CHECKSUM_LEN, CHUNK_SIZE, MAX_SESSIONS, SCRATCH_SIZE,
};

use crate::channel::ByteChannel;

/// Failed exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Reply missing, short, or failed its checksum
    Checksum,
    /// Image larger than the caller's buffer; nothing was transferred
    BufferTooSmall { declared: u32, capacity: usize },
}

/// State only one exchange may touch at a time
struct Session {
    scratch: [u8; SCRATCH_SIZE],
    volumes: VolumeTable,
}

/// Requester side of the mixer protocol
pub struct MixerLink<'c, M: RawMutex, C> {
    channel: &'c C,
    session: Mutex<M, Session>,
    /// Tick of the last verified read
    last_success: AtomicU64,
}

impl<'c, M: RawMutex, C: ByteChannel> MixerLink<'c, M, C> {
    pub fn new(channel: &'c C) -> Self {
        Self {
            channel,
            session: Mutex::new(Session {
                scratch: [0; SCRATCH_SIZE],
                volumes: VolumeTable::default(),
            }),
            last_success: AtomicU64::new(0),
        }
    }

    async fn exchange(&self) -> Exchange<'_, M, C> {
        Exchange {
            channel: self.channel,
            session: self.session.lock().await,
            last_success: &self.last_success,
        }
    }

    /// Refresh the whole volume table
    ///
    /// The table is cleared once the entry count verifies, then filled slot
    /// by slot. A failure part way leaves the entries read so far in place
    /// and every other slot empty.
    pub async fn load_volumes(&self) -> Result<(), LinkError> {
        self.exchange().await.load_volumes().await
    }

    /// Copy of the table as of the last refresh
    pub async fn volumes(&self) -> VolumeTable {
        self.session.lock().await.volumes.clone()
    }

    /// Fetch the icon of session `pid` into `buf`
    ///
    /// Returns the image length.
    pub async fn load_image(&self, pid: i16, buf: &mut [u8]) -> Result<usize, LinkError> {
        self.exchange().await.load_image(pid, buf).await
    }

    /// Push a volume for `pid`, delivered best-effort
    pub async fn set_volume(&self, pid: i16, volume: u8) {
        self.exchange().await.set_volume(pid, volume).await
    }

    /// Push a mute flag for `pid`, delivered best-effort
    pub async fn set_mute(&self, pid: i16, muted: bool) {
        self.exchange().await.set_mute(pid, muted)
    }

    /// Send diagnostic text for the host to print
    ///
    /// Text is cut at an interior NUL and to what fits in one scratch buffer.
    pub async fn echo(&self, text: &str) {
        self.exchange().await.echo(text.as_bytes())
    }

    /// Ask the host whether its mixer state changed
    pub async fn changes(&self) -> ChangeStatus {
        self.exchange().await.changes().await
    }

    /// Instant of the last verified read
    pub fn last_success(&self) -> Instant {
        Instant::from_ticks(self.last_success.load(Ordering::Relaxed))
    }

    /// Time since the last verified read
    pub fn since_last_success(&self) -> Duration {
        let last = self.last_success.load(Ordering::Relaxed);
        Duration::from_ticks(Instant::now().as_ticks().saturating_sub(last))
    }
}

/// One checked-out session
struct Exchange<'a, M: RawMutex, C> {
    channel: &'a C,
    session: MutexGuard<'a, M, Session>,
    last_success: &'a AtomicU64,
}

impl<M: RawMutex, C: ByteChannel> Exchange<'_, M, C> {
    async fn load_volumes(&mut self) -> Result<(), LinkError> {
        self.channel.empty_rx();
        self.send(&[LOAD_ALL]);
        self.channel.flush().await;

        if self.verified_read(1).await.is_err() {
            return Err(self.fail().await);
        }
        let count = self.session.scratch[0] as usize;

        self.session.volumes = VolumeTable::default();
        for slot in 0..count.min(MAX_SESSIONS) {
            match self.read_entry().await {
                Ok(volume) => self.session.volumes[slot] = Some(volume),
                Err(_) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Volume entry {} of {} failed verification", slot, count);
                    return Err(self.fail().await);
                }
            }
        }

        self.ack().await;
        Ok(())
    }

    /// Header unit, then name unit
    async fn read_entry(&mut self) -> Result<ProgramVolume, LinkError> {
        self.verified_read(EntryHeader::LEN).await?;
        let header = EntryHeader::from_bytes(&self.session.scratch[..EntryHeader::LEN])
            .map_err(|_| LinkError::Checksum)?;

        let name_len = header.name_len as usize;
        self.verified_read(name_len).await?;
        Ok(ProgramVolume::from_entry(
            &header,
            &self.session.scratch[..name_len],
        ))
    }

    async fn load_image(&mut self, pid: i16, buf: &mut [u8]) -> Result<usize, LinkError> {
        self.channel.empty_rx();
        self.send(&[READ_IMG]);
        self.send(&ImageRequest { pid }.encode());
        self.channel.flush().await;

        if self.verified_read(4).await.is_err() {
            return Err(self.fail().await);
        }
        let declared = read_u32(&self.session.scratch[..4]).map_err(|_| LinkError::Checksum)?;

        if declared as usize > buf.len() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Image for pid {} is {} bytes, buffer holds {}", pid, declared, buf.len());
            self.fail().await;
            return Err(LinkError::BufferTooSmall {
                declared,
                capacity: buf.len(),
            });
        }

        self.send(&seal_u32(CHUNK_SIZE));
        self.channel.flush().await;

        let total = declared as usize;
        let mut received = 0;
        while received < total {
            let len = (CHUNK_SIZE as usize).min(total - received);
            if self.verified_read(len).await.is_err() {
                return Err(self.fail().await);
            }
            buf[received..received + len].copy_from_slice(&self.session.scratch[..len]);
            received += len;
            // Acknowledges this chunk and asks for the next
            self.ack().await;
        }

        Ok(total)
    }

    async fn set_volume(&mut self, pid: i16, volume: u8) {
        self.channel.empty_rx();
        self.send(&VolumeFrame { pid, volume }.encode());
        self.channel.flush().await;
    }

    fn set_mute(&mut self, pid: i16, muted: bool) {
        self.send(&MuteFrame { pid, muted }.encode());
    }

    fn echo(&mut self, text: &[u8]) {
        let text = &text[..text.len().min(SCRATCH_SIZE - 2)];
        let Ok(len) = wire::encode_echo(text, &mut self.session.scratch) else {
            return;
        };
        self.send(&self.session.scratch[..len]);
    }

    async fn changes(&mut self) -> ChangeStatus {
        self.channel.flush().await;
        self.channel.empty_rx();
        self.send(&[QUERY_CHANGES]);
        self.channel.flush().await;

        if self.verified_read(1).await.is_err() {
            return ChangeStatus::Failed;
        }
        ChangeStatus::from_flag(self.session.scratch[0])
    }

    /// Read `n` bytes plus checksum; payload lands in `scratch[..n]`
    async fn verified_read(&mut self, n: usize) -> Result<(), LinkError> {
        if n > SCRATCH_SIZE {
            return Err(LinkError::Checksum);
        }
        if self.channel.wait_for(n + CHECKSUM_LEN).await == 0 {
            return Err(LinkError::Checksum);
        }

        let payload = &mut self.session.scratch[..n];
        self.channel.read(payload);
        let mut claimed = [0u8; CHECKSUM_LEN];
        self.channel.read(&mut claimed);

        if !checksum_matches(payload, claimed) {
            return Err(LinkError::Checksum);
        }
        self.touch();
        Ok(())
    }

    /// Send `FAIL` and resynchronize
    async fn fail(&mut self) -> LinkError {
        self.send(Response::Fail.frame());
        self.channel.flush().await;
        self.channel.empty_rx();
        LinkError::Checksum
    }

    /// Send `OK`
    ///
    /// RX is cleared before sending, since the host may answer `OK` right away.
    async fn ack(&mut self) {
        self.channel.empty_rx();
        self.send(Response::Ok.frame());
        self.channel.flush().await;
        self.touch();
    }

    fn send(&self, frame: &[u8]) {
        let written = self.channel.write(frame);
        if written < frame.len() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Short write: {} of {} bytes queued", written, frame.len());
        }
    }

    fn touch(&self) {
        self.last_success
            .store(Instant::now().as_ticks(), Ordering::Relaxed);
    }
}
