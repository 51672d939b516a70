//! Beacon clock synchronization module
//!
//! Independent beacon senders share a repeating broadcast schedule. Each
//! receiver anchors that schedule on the lowest-numbered beacon it hears and
//! can then predict when any other beacon will transmit next.

mod beacon;

pub use self::beacon::{beacon_offset, BeaconSync};
