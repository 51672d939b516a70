//! CSP link: a point-to-point serial framing protocol
//!
//! This library implements the `$C` framed command/response protocol used over
//! unreliable byte transports, together with the beacon clock synchronization
//! scheme that lets independent beacon senders agree on a shared broadcast
//! schedule without a common clock.
pub mod core;
pub mod link;
pub mod protocol;
pub mod sync;
mod util;

// Re-export commonly used items
pub use crate::core::{AdapterConfig, Command, Direction, Error, Result};
pub use crate::link::{Adapter, FrameObserver, LinkStats, NoopObserver, TracingObserver};
pub use crate::protocol::{CspCodec, FrameParser, Message};
pub use crate::sync::{beacon_offset, BeaconSync};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
