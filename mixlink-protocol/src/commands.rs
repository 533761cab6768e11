//! Opcodes and response sentinels
//!
//! Opcodes flow display → host and open an exchange. The two response
//! opcodes are only ever sent as precomputed sentinel frames.

use crate::crc::crc32_mpeg2;
use crate::wire::CHECKSUM_LEN;

// Request opcodes: Display → Host
pub const LOAD_ALL: u8 = 0x01;
pub const READ_IMG: u8 = 0x02;
pub const SET_VOLUME: u8 = 0x03;
pub const ECHO: u8 = 0x04;
pub const SET_MUTE: u8 = 0x05;
pub const QUERY_CHANGES: u8 = 0x06;

// Response opcodes
pub const RESPONSE_OK: u8 = 0xA0;
pub const RESPONSE_FAIL: u8 = 0xB0;

/// Length of a sentinel frame (opcode + checksum)
pub const SENTINEL_LEN: usize = 1 + CHECKSUM_LEN;

/// `[RESPONSE_OK][crc]`
pub const RESPONSE_OK_FRAME: [u8; SENTINEL_LEN] = sentinel(RESPONSE_OK);

/// `[RESPONSE_FAIL][crc]`
pub const RESPONSE_FAIL_FRAME: [u8; SENTINEL_LEN] = sentinel(RESPONSE_FAIL);

const fn sentinel(opcode: u8) -> [u8; SENTINEL_LEN] {
    let crc = crc32_mpeg2(&[opcode]).to_le_bytes();
    [opcode, crc[0], crc[1], crc[2], crc[3]]
}

/// Request sent by the display to open an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// Fetch the full volume table
    LoadAll = LOAD_ALL,
    /// Fetch the icon of one session
    ReadImage = READ_IMG,
    /// Push a new volume
    SetVolume = SET_VOLUME,
    /// Diagnostic text, printed by the host
    Echo = ECHO,
    /// Push a mute flag
    SetMute = SET_MUTE,
    /// Ask whether anything changed since the last query
    QueryChanges = QUERY_CHANGES,
}

impl Command {
    /// Get the opcode byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Parse an opcode byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            LOAD_ALL => Some(Command::LoadAll),
            READ_IMG => Some(Command::ReadImage),
            SET_VOLUME => Some(Command::SetVolume),
            ECHO => Some(Command::Echo),
            SET_MUTE => Some(Command::SetMute),
            QUERY_CHANGES => Some(Command::QueryChanges),
            _ => None,
        }
    }
}

/// Exchange outcome sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Response {
    Ok = RESPONSE_OK,
    Fail = RESPONSE_FAIL,
}

impl Response {
    /// The precomputed frame for this sentinel
    pub fn frame(self) -> &'static [u8; SENTINEL_LEN] {
        match self {
            Response::Ok => &RESPONSE_OK_FRAME,
            Response::Fail => &RESPONSE_FAIL_FRAME,
        }
    }

    /// Recognize a sentinel frame, checksum included
    pub fn from_frame(frame: &[u8]) -> Option<Self> {
        if frame == &RESPONSE_OK_FRAME[..] {
            Some(Response::Ok)
        } else if frame == &RESPONSE_FAIL_FRAME[..] {
            Some(Response::Fail)
        } else {
            None
        }
    }
}

/// Result of a change poll
///
/// The discriminants are the values the poll has always reported, so they
/// can be logged or forwarded as a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ChangeStatus {
    /// Host reports new state, refresh the table
    Changed = 0,
    /// Nothing new
    Unchanged = 1,
    /// No verified answer within the retry budget
    Failed = 2,
}

impl ChangeStatus {
    /// Interpret the verified flag byte of a poll reply
    ///
    /// `0x00` means changed; any other value means unchanged.
    pub fn from_flag(flag: u8) -> Self {
        if flag == 0 {
            ChangeStatus::Changed
        } else {
            ChangeStatus::Unchanged
        }
    }

    /// Get the status as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
