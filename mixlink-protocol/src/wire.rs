//! Checksummed units and fixed frame layouts
//!
//! Layouts (all integers little-endian):
//! - Checksummed unit: `[payload][crc(payload):4]`
//! - Table entry header: unit of `[pid:2][volume:1][mute:1][name_len:1]`
//! - Image request: `[pid:2][crc(pid):4]`
//! - Push volume: `[SET_VOLUME][pid:2][volume:1][crc(pid‖volume):4]`
//! - Push mute: `[SET_MUTE][pid:2][mute:1][crc(pid‖mute):4]`
//! - Diagnostic: `[ECHO][text][0x00]`

use crate::commands::{ECHO, SET_MUTE, SET_VOLUME};
use crate::crc::crc32_mpeg2;

/// Checksum bytes trailing every unit
pub const CHECKSUM_LEN: usize = 4;

/// Size of the requester's decode buffer
///
/// Bounds every unit payload the display accepts.
pub const SCRATCH_SIZE: usize = 256;

/// Largest image chunk the display asks for
pub const CHUNK_SIZE: u32 = (SCRATCH_SIZE - CHECKSUM_LEN) as u32;

/// Errors from encoding or decoding wire data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireError {
    /// Checksum mismatch
    InvalidChecksum,
    /// Not enough bytes for the layout
    Truncated,
    /// Output buffer too small for encoding
    BufferTooSmall,
    /// Leading opcode is not the one the layout expects
    UnexpectedCommand,
}

/// Whether `claimed` (as read off the wire) is the checksum of `payload`
pub fn checksum_matches(payload: &[u8], claimed: [u8; CHECKSUM_LEN]) -> bool {
    crc32_mpeg2(payload) == u32::from_le_bytes(claimed)
}

/// Write `payload` followed by its checksum into `out`
///
/// Returns the number of bytes written.
pub fn seal(payload: &[u8], out: &mut [u8]) -> Result<usize, WireError> {
    let len = payload.len() + CHECKSUM_LEN;
    if out.len() < len {
        return Err(WireError::BufferTooSmall);
    }
    out[..payload.len()].copy_from_slice(payload);
    out[payload.len()..len].copy_from_slice(&crc32_mpeg2(payload).to_le_bytes());
    Ok(len)
}

/// Verify a complete unit and return its payload
pub fn open(unit: &[u8]) -> Result<&[u8], WireError> {
    if unit.len() < CHECKSUM_LEN {
        return Err(WireError::Truncated);
    }
    let (payload, crc) = unit.split_at(unit.len() - CHECKSUM_LEN);
    let mut claimed = [0u8; CHECKSUM_LEN];
    claimed.copy_from_slice(crc);
    if checksum_matches(payload, claimed) {
        Ok(payload)
    } else {
        Err(WireError::InvalidChecksum)
    }
}

/// A `u32` as a checksummed unit (image length, chunk size)
pub fn seal_u32(value: u32) -> [u8; 4 + CHECKSUM_LEN] {
    let mut out = [0u8; 4 + CHECKSUM_LEN];
    let bytes = value.to_le_bytes();
    out[..4].copy_from_slice(&bytes);
    out[4..].copy_from_slice(&crc32_mpeg2(&bytes).to_le_bytes());
    out
}

/// Decode an already verified 4-byte payload
pub fn read_u32(payload: &[u8]) -> Result<u32, WireError> {
    let bytes: [u8; 4] = payload
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or(WireError::Truncated)?;
    Ok(u32::from_le_bytes(bytes))
}

/// Fixed part of a volume table entry
///
/// The name follows as its own checksummed unit of `name_len` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EntryHeader {
    pub pid: i16,
    pub volume: u8,
    pub muted: bool,
    pub name_len: u8,
}

impl EntryHeader {
    /// Payload length, checksum excluded
    pub const LEN: usize = 5;

    /// Decode a verified header payload
    pub fn from_bytes(payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() < Self::LEN {
            return Err(WireError::Truncated);
        }
        Ok(Self {
            pid: i16::from_le_bytes([payload[0], payload[1]]),
            volume: payload[2],
            muted: payload[3] != 0,
            name_len: payload[4],
        })
    }

    /// Encode the header payload
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let pid = self.pid.to_le_bytes();
        [pid[0], pid[1], self.volume, self.muted as u8, self.name_len]
    }

    /// Encode the header as a checksummed unit
    pub fn sealed(&self) -> [u8; Self::LEN + CHECKSUM_LEN] {
        let mut out = [0u8; Self::LEN + CHECKSUM_LEN];
        let payload = self.to_bytes();
        out[..Self::LEN].copy_from_slice(&payload);
        out[Self::LEN..].copy_from_slice(&crc32_mpeg2(&payload).to_le_bytes());
        out
    }
}

/// `[pid][crc(pid)]`, sent after the `READ_IMG` opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImageRequest {
    pub pid: i16,
}

impl ImageRequest {
    /// Encoded length
    pub const LEN: usize = 2 + CHECKSUM_LEN;

    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        let pid = self.pid.to_le_bytes();
        out[..2].copy_from_slice(&pid);
        out[2..].copy_from_slice(&crc32_mpeg2(&pid).to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let unit = bytes.get(..Self::LEN).ok_or(WireError::Truncated)?;
        let payload = open(unit)?;
        Ok(Self {
            pid: i16::from_le_bytes([payload[0], payload[1]]),
        })
    }
}

/// Push-volume frame, opcode included
///
/// Volume is sent as given; range checks are the caller's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VolumeFrame {
    pub pid: i16,
    pub volume: u8,
}

impl VolumeFrame {
    /// Encoded length
    pub const LEN: usize = 1 + 3 + CHECKSUM_LEN;

    pub fn encode(&self) -> [u8; Self::LEN] {
        encode_pid_byte(SET_VOLUME, self.pid, self.volume)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let (pid, volume) = decode_pid_byte(SET_VOLUME, bytes)?;
        Ok(Self { pid, volume })
    }
}

/// Push-mute frame, opcode included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MuteFrame {
    pub pid: i16,
    pub muted: bool,
}

impl MuteFrame {
    /// Encoded length
    pub const LEN: usize = 1 + 3 + CHECKSUM_LEN;

    pub fn encode(&self) -> [u8; Self::LEN] {
        encode_pid_byte(SET_MUTE, self.pid, self.muted as u8)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let (pid, flag) = decode_pid_byte(SET_MUTE, bytes)?;
        Ok(Self {
            pid,
            muted: flag != 0,
        })
    }
}

/// `[opcode][pid:2][value:1][crc(pid‖value):4]`, checksum excludes the opcode
fn encode_pid_byte(opcode: u8, pid: i16, value: u8) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[0] = opcode;
    out[1..3].copy_from_slice(&pid.to_le_bytes());
    out[3] = value;
    let crc = crc32_mpeg2(&out[1..4]);
    out[4..].copy_from_slice(&crc.to_le_bytes());
    out
}

fn decode_pid_byte(opcode: u8, bytes: &[u8]) -> Result<(i16, u8), WireError> {
    if bytes.len() < 8 {
        return Err(WireError::Truncated);
    }
    if bytes[0] != opcode {
        return Err(WireError::UnexpectedCommand);
    }
    let payload = open(&bytes[1..8])?;
    Ok((i16::from_le_bytes([payload[0], payload[1]]), payload[2]))
}

/// Write a diagnostic frame: opcode, text, terminating NUL
///
/// Text is cut at its first interior NUL, since the host reads up to one.
pub fn encode_echo(bytes: &[u8], out: &mut [u8]) -> Result<usize, WireError> {
    let text_len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let len = 1 + text_len + 1;
    if out.len() < len {
        return Err(WireError::BufferTooSmall);
    }
    out[0] = ECHO;
    out[1..1 + text_len].copy_from_slice(&bytes[..text_len]);
    out[1 + text_len] = 0;
    Ok(len)
}
