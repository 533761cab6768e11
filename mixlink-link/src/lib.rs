//! Transport and exchange engine for the Mixlink serial protocol
//!
//! Two layers sit on top of a [`mixlink_hal::SerialLink`]:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  MixerLink (engine)                          │
//! │  one exchange at a time, CRC-verified reads  │
//! └──────────────────────────────────────────────┘
//!          │ write / flush          ▲ wait_for / read
//!          ▼                        │
//! ┌──────────────────────────────────────────────┐
//! │  Transport                                   │
//! │  TX queue ──▶ flush task ──▶ SerialLink      │
//! │  RX queue ◀── receive() ◀── hardware         │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Both are generic over the raw mutex so firmware can use
//! `CriticalSectionRawMutex` while host tests use the same types with the
//! `std` time driver.

#![no_std]
#![deny(unsafe_code)]

pub mod channel;
pub mod config;
pub mod engine;
pub mod sync;
pub mod transport;

pub use channel::ByteChannel;
pub use config::LinkTiming;
pub use engine::{LinkError, MixerLink};
pub use sync::IsrGuard;
pub use transport::Transport;
