use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Error, Result};

/// Whether a message is a command to a peer or a reply from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Outbound command
    Request = b'<',
    /// Inbound reply
    Response = b'>',
}

impl Direction {
    /// Wire byte for this direction
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Decodes a direction byte, `None` for anything but the two reserved values
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'<' => Some(Direction::Request),
            b'>' => Some(Direction::Response),
            _ => None,
        }
    }
}

/// Opaque one-byte application command identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Command(pub u8);

impl Command {
    /// Reserved command carried by beacon broadcasts
    pub const BEACON: Command = Command(0x0A);

    /// Returns the raw command byte
    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_beacon(self) -> bool {
        self == Command::BEACON
    }
}

impl From<u8> for Command {
    fn from(value: u8) -> Self {
        Command(value)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Configuration for an [`Adapter`](crate::link::Adapter)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Maximum bytes requested from the transport per read
    pub read_chunk_size: usize,
    /// Idle sleep between polls in `wait` when no data is available
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub poll_interval: Duration,
    /// Length of the repeating beacon schedule
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub beacon_interval: Duration,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig {
            read_chunk_size: super::READ_CHUNK_SIZE,
            poll_interval: Duration::from_millis(1),
            beacon_interval: super::BEACON_INTERVAL,
        }
    }
}

impl AdapterConfig {
    /// Checks that the configuration can drive an adapter
    pub fn validate(&self) -> Result<()> {
        if self.read_chunk_size == 0 {
            return Err(Error::config("read chunk size must be non-zero"));
        }
        if self.beacon_interval.is_zero() {
            return Err(Error::config("beacon interval must be non-zero"));
        }
        Ok(())
    }
}
