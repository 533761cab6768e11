//! Mixlink Serial Protocol
//!
//! This crate defines the wire format spoken between the mixer display
//! (requester) and the host computer (responder). Every exchange starts with a
//! one-byte opcode from the display; anything that carries data is sent as a
//! *checksummed unit*:
//! ```text
//! ┌──────────────────┬──────────────────────┐
//! │ PAYLOAD          │ CRC-32/MPEG-2 (LE)   │
//! │ N bytes          │ 4 bytes              │
//! └──────────────────┴──────────────────────┘
//! ```
//!
//! Outcomes are acknowledged with 5-byte sentinel frames (`OK` / `FAIL`),
//! an opcode byte followed by its own checksum.
//!
//! Multi-byte integers are little-endian throughout.

#![no_std]
#![deny(unsafe_code)]

pub mod commands;
pub mod crc;
pub mod volume;
pub mod wire;

pub use commands::{ChangeStatus, Command, Response, RESPONSE_FAIL_FRAME, RESPONSE_OK_FRAME};
pub use crc::crc32_mpeg2;
pub use volume::{
    ProgramName, ProgramVolume, VolumeTable, MASTER_PID, MAX_NAME_LEN, MAX_SESSIONS,
    NAME_FIELD_SIZE,
};
pub use wire::{
    EntryHeader, ImageRequest, MuteFrame, VolumeFrame, WireError, CHECKSUM_LEN, CHUNK_SIZE,
    SCRATCH_SIZE,
};
