use std::sync::Arc;

use tracing::{debug, trace};

use crate::util::HexDump;

/// Diagnostic sink notified of link traffic and parser progress.
///
/// Observers see what happens but cannot influence it; every method has an
/// empty default so implementations only pick the events they care about.
pub trait FrameObserver {
    /// A frame is about to be written
    fn on_send(&self, _bytes: &[u8]) {}

    /// Bytes arrived from the transport
    fn on_receive(&self, _bytes: &[u8]) {}

    /// The parser consumed `byte` and moved between states
    fn on_transition(&self, _from: &'static str, _to: &'static str, _byte: u8) {}

    /// A frame completed and its checksum was compared
    fn on_checksum(&self, _expected: u8, _actual: u8) {}
}

/// Observer that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl FrameObserver for NoopObserver {}

/// Observer that reports traffic through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl FrameObserver for TracingObserver {
    fn on_send(&self, bytes: &[u8]) {
        debug!(target: "csp_link::wire", "SEND {}", HexDump(bytes));
    }

    fn on_receive(&self, bytes: &[u8]) {
        trace!(target: "csp_link::wire", "RECV {}", HexDump(bytes));
    }

    fn on_transition(&self, from: &'static str, to: &'static str, byte: u8) {
        if from != to {
            trace!(target: "csp_link::parser", "{} -> {} on {:02X}", from, to, byte);
        }
    }

    fn on_checksum(&self, expected: u8, actual: u8) {
        if expected == actual {
            debug!(target: "csp_link::parser", "CHECKSUM {:02X} ok", actual);
        } else {
            debug!(
                target: "csp_link::parser",
                "CHECKSUM expected {:02X} ?= {:02X} actual", expected, actual
            );
        }
    }
}

impl<O: FrameObserver + ?Sized> FrameObserver for Arc<O> {
    fn on_send(&self, bytes: &[u8]) {
        (**self).on_send(bytes)
    }

    fn on_receive(&self, bytes: &[u8]) {
        (**self).on_receive(bytes)
    }

    fn on_transition(&self, from: &'static str, to: &'static str, byte: u8) {
        (**self).on_transition(from, to, byte)
    }

    fn on_checksum(&self, expected: u8, actual: u8) {
        (**self).on_checksum(expected, actual)
    }
}
