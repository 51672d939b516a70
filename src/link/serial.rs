use std::time::Duration;

use serde::{Deserialize, Serialize};
use serialport::SerialPort;
use tracing::info;

use crate::core::{Error, Result};

/// Serial device settings for a CSP link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0`
    pub device: String,
    /// Line speed
    pub baud_rate: u32,
    /// Read timeout; kept short so reads report "no data" promptly
    #[serde(serialize_with = "crate::core::serde::serialize_duration")]
    #[serde(deserialize_with = "crate::core::serde::deserialize_duration")]
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            timeout: Duration::from_millis(10),
        }
    }
}

/// Opens the serial device described by `config`
pub fn open(config: &SerialConfig) -> Result<Box<dyn SerialPort>> {
    if config.device.is_empty() {
        return Err(Error::config("serial device path is empty"));
    }
    if config.baud_rate == 0 {
        return Err(Error::config("baud rate must be non-zero"));
    }

    let port = serialport::new(config.device.as_str(), config.baud_rate)
        .timeout(config.timeout)
        .open()
        .map_err(|e| Error::config(format!("Failed to open {}: {}", config.device, e)))?;

    info!("Opened {} at {} baud", config.device, config.baud_rate);
    Ok(port)
}
