//! Opens a serial port, prints every CSP message and the predicted time of
//! the next broadcast for each beacon heard.
//!
//! Usage: `cargo run --example monitor -- /dev/ttyUSB0 115200`

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use csp_link::link::{serial, SerialConfig};
use csp_link::{Adapter, Error};

fn main() -> csp_link::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let mut config = SerialConfig::default();
    if let Some(device) = args.next() {
        config.device = device;
    }
    if let Some(baud) = args.next() {
        config.baud_rate = baud
            .parse()
            .map_err(|e| Error::config(format!("Invalid baud rate {}: {}", baud, e)))?;
    }

    let port = serial::open(&config)?;
    let mut adapter = Adapter::new(port);
    adapter.reset();

    let mut beacons = BTreeSet::new();
    loop {
        match adapter.receive() {
            Ok(message) => {
                println!(
                    "{:?} {} payload={:02X?}",
                    message.direction, message.command, message.payload
                );
                if let Some(id) = message.beacon_id() {
                    beacons.insert(id);
                    for id in &beacons {
                        if let Some(next) = adapter.beacon_time(*id) {
                            let next: DateTime<Utc> = next.into();
                            println!("  beacon {:#04x} next at {}", id, next.format("%H:%M:%S%.3f"));
                        }
                    }
                }
            }
            Err(Error::NoData) => std::thread::sleep(Duration::from_millis(5)),
            Err(e) => eprintln!("Receive error: {}", e),
        }
    }
}
