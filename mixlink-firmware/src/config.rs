//! Build-time configuration
//!
//! Generated from link.toml by the build script.

use mixlink_core::MonitorConfig;
use mixlink_link::LinkTiming;

include!(concat!(env!("OUT_DIR"), "/link_config.rs"));
