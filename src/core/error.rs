use std::io;
use std::time::Duration;
use thiserror::Error;

/// Error types for the CSP link
#[derive(Error, Debug)]
pub enum Error {
    /// The transport has nothing to offer right now; poll again later
    #[error("no data available")]
    NoData,

    #[error("wrong checksum: expected {expected:#04x}, got {actual:#04x}")]
    Checksum {
        /// Checksum accumulated over the received frame
        expected: u8,
        /// Trailing byte actually received
        actual: u8,
    },

    #[error("write failed: {0}")]
    Write(io::Error),

    #[error("write failed to send all bytes: {written} of {expected}")]
    ShortWrite {
        /// Bytes accepted by the transport
        written: usize,
        /// Bytes in the frame
        expected: usize,
    },

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Returns true for the "poll again" condition, which callers usually
    /// do not treat as a failure
    pub fn is_no_data(&self) -> bool {
        matches!(self, Error::NoData)
    }
}
