//! Mixlink Hardware Abstraction Layer
//!
//! This crate defines the boundary between the link transport and the
//! chip-specific serial hardware. The transport never touches a peripheral
//! directly; it only sees a [`SerialLink`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  mixlink-link (transport + engine)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  mixlink-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │    IoLink     │       │  board/USB    │
//! │ (embedded-io) │       │  specific     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`serial::SerialLink`] - Transmit primitive plus connection status

#![no_std]
#![deny(unsafe_code)]

pub mod serial;

// Re-export key types at crate root for convenience
pub use serial::{IoLink, SerialLink};
