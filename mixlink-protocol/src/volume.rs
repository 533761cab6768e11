//! Mixer state mirrored from the host

use heapless::Vec;

use crate::wire::EntryHeader;

/// pid reserved for the system (master) volume
pub const MASTER_PID: i16 = -1;

/// Volume table capacity
pub const MAX_SESSIONS: usize = 8;

/// Size of a name field, terminator slot included
pub const NAME_FIELD_SIZE: usize = 32;

/// Longest name kept; longer names are cut
pub const MAX_NAME_LEN: usize = NAME_FIELD_SIZE - 1;

/// Fixed-size mirror of the host's audio sessions
pub type VolumeTable = [Option<ProgramVolume>; MAX_SESSIONS];

/// Session name, raw bytes as sent by the host
///
/// Kept as bytes because truncation may split a UTF-8 sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProgramName(Vec<u8, MAX_NAME_LEN>);

impl ProgramName {
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Copy at most [`MAX_NAME_LEN`] bytes of `bytes`
    pub fn truncated(bytes: &[u8]) -> Self {
        let len = bytes.len().min(MAX_NAME_LEN);
        let mut name = Vec::new();
        // Cannot fail, `len` is within capacity
        let _ = name.extend_from_slice(&bytes[..len]);
        Self(name)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The longest valid UTF-8 prefix
    pub fn as_str(&self) -> &str {
        match core::str::from_utf8(&self.0) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&self.0[..e.valid_up_to()]).unwrap_or_default(),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Volume state of one audio session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProgramVolume {
    /// Session process id, [`MASTER_PID`] for the system volume
    pub pid: i16,
    /// Percent, not range-checked
    pub volume: u8,
    pub muted: bool,
    pub name: ProgramName,
}

impl ProgramVolume {
    /// Build an entry from its decoded header and raw name bytes
    pub fn from_entry(header: &EntryHeader, name: &[u8]) -> Self {
        Self {
            pid: header.pid,
            volume: header.volume,
            muted: header.muted,
            name: ProgramName::truncated(name),
        }
    }

    /// Whether this is the system volume rather than an application
    pub fn is_master(&self) -> bool {
        self.pid == MASTER_PID
    }
}
