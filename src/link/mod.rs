//! Link layer module
//!
//! The [`Adapter`] drives the frame parser over a byte transport and exposes
//! the send / receive / wait / reset operations. Diagnostics flow through a
//! [`FrameObserver`] rather than global logging state.

mod adapter;
mod observer;
pub mod serial;

pub use self::adapter::{Adapter, LinkStats};
pub use self::observer::{FrameObserver, NoopObserver, TracingObserver};
pub use self::serial::SerialConfig;
