//! Core types for the CSP link
//!
//! This module contains the error type, wire constants and the small value
//! types shared by the parser, the adapter and the beacon synchronizer.

pub mod error;
pub mod serde;
pub mod types;

use std::time::Duration;

pub use self::error::{Error, Result};
pub use self::types::{AdapterConfig, Command, Direction};

/// Sync sequence opening every frame
pub const HEADER: [u8; 2] = [b'$', b'C'];

/// Largest payload an outbound message may carry
pub const MAX_PAYLOAD: usize = 110;

/// Largest length byte the parser accepts (one command byte plus the payload)
pub const MAX_LENGTH: u8 = 1 + MAX_PAYLOAD as u8;

/// Frame bytes surrounding the payload: header, direction, length, command, checksum
pub const FRAME_OVERHEAD: usize = 6;

/// Default number of bytes requested per transport read
pub const READ_CHUNK_SIZE: usize = 16;

/// Repeating interval shared by all beacons
pub const BEACON_INTERVAL: Duration = Duration::from_secs(6);
