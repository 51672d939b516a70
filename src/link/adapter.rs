use std::io::{Read, Write};
use std::thread;
use std::time::{Instant, SystemTime};

use bytes::{Buf, BytesMut};
use tracing::debug;

use crate::core::{AdapterConfig, Command, Direction, Error, Result, MAX_PAYLOAD};
use crate::protocol::{FrameParser, Message};
use crate::sync::BeaconSync;
use super::observer::{FrameObserver, TracingObserver};

/// Counters describing the traffic an adapter has handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Frames written completely
    pub messages_sent: u64,
    /// Checksum-valid messages received
    pub messages_received: u64,
    /// Frames dropped for a wrong checksum
    pub checksum_errors: u64,
    /// Messages thrown away by `wait` because they did not match
    pub messages_discarded: u64,
    /// Bytes thrown away by `reset`
    pub bytes_drained: u64,
}

/// A CSP session over one duplex byte transport.
///
/// The adapter owns the frame parser and the beacon schedule. It is a
/// single-reader, single-writer object: nothing here blocks beyond what the
/// transport's own `read` and `write` do.
pub struct Adapter<T> {
    wire: T,
    config: AdapterConfig,
    parser: FrameParser,
    /// Bytes read from the wire but not yet fed to the parser
    pending: BytesMut,
    chunk: Vec<u8>,
    beacons: BeaconSync,
    observer: Box<dyn FrameObserver + Send>,
    stats: LinkStats,
}

impl<T: Read + Write> Adapter<T> {
    /// Creates an adapter with the default configuration
    pub fn new(wire: T) -> Self {
        Self::build(wire, AdapterConfig::default(), Box::new(TracingObserver))
    }

    /// Creates an adapter with a custom configuration
    pub fn with_config(wire: T, config: AdapterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(wire, config, Box::new(TracingObserver)))
    }

    /// Creates an adapter reporting diagnostics to `observer`
    pub fn with_observer(
        wire: T,
        config: AdapterConfig,
        observer: impl FrameObserver + Send + 'static,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(wire, config, Box::new(observer)))
    }

    fn build(wire: T, config: AdapterConfig, observer: Box<dyn FrameObserver + Send>) -> Self {
        Adapter {
            wire,
            chunk: vec![0; config.read_chunk_size],
            beacons: BeaconSync::new(config.beacon_interval),
            config,
            parser: FrameParser::new(),
            pending: BytesMut::new(),
            observer,
            stats: LinkStats::default(),
        }
    }

    /// Writes one message to the transport in a single write call
    pub fn send(&mut self, message: &Message) -> Result<()> {
        if message.payload.len() > MAX_PAYLOAD {
            return Err(Error::PayloadTooLarge(message.payload.len()));
        }
        let bytes = message.to_bytes();
        self.observer.on_send(&bytes);

        let written = self.wire.write(&bytes).map_err(Error::Write)?;
        if written != bytes.len() {
            return Err(Error::ShortWrite {
                written,
                expected: bytes.len(),
            });
        }
        self.stats.messages_sent += 1;
        Ok(())
    }

    /// Reads whatever the transport has available and returns the first
    /// complete message.
    ///
    /// Returns [`Error::NoData`] once the transport runs dry without a
    /// complete frame, and [`Error::Checksum`] when a frame arrives corrupted.
    /// Partially received frames are kept for the next call.
    pub fn receive(&mut self) -> Result<Message> {
        loop {
            while self.pending.has_remaining() {
                let byte = self.pending.get_u8();
                match self.parser.feed(byte, self.observer.as_ref()) {
                    Ok(Some(message)) => {
                        self.stats.messages_received += 1;
                        self.beacons.observe(&message, SystemTime::now());
                        return Ok(message);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        self.stats.checksum_errors += 1;
                        return Err(e);
                    }
                }
            }

            let n = match self.wire.read(&mut self.chunk) {
                Ok(0) | Err(_) => return Err(Error::NoData),
                Ok(n) => n,
            };
            self.observer.on_receive(&self.chunk[..n]);
            self.pending.extend_from_slice(&self.chunk[..n]);
        }
    }

    /// Polls [`receive`](Self::receive) until a message with the given
    /// command and direction arrives or `timeout` elapses. Other messages are
    /// discarded.
    pub fn wait(
        &mut self,
        command: Command,
        direction: Direction,
        timeout: std::time::Duration,
    ) -> Result<Message> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            match self.receive() {
                Ok(message) if message.command == command && message.direction == direction => {
                    return Ok(message);
                }
                Ok(message) => {
                    debug!(
                        "Discarding {:?} {} while waiting for {:?} {}",
                        message.direction, message.command, direction, command
                    );
                    self.stats.messages_discarded += 1;
                }
                Err(Error::NoData) => {
                    if !self.config.poll_interval.is_zero() {
                        let remaining = timeout.saturating_sub(start.elapsed());
                        thread::sleep(self.config.poll_interval.min(remaining));
                    }
                }
                Err(_) => {}
            }
        }
        debug!("Timed out after {:?} waiting for {:?} {}", timeout, direction, command);
        Err(Error::Timeout(timeout))
    }

    /// Drops any partial frame and drains the transport until it has no more
    /// data. Beacon synchronization is kept.
    pub fn reset(&mut self) {
        self.parser.reset();
        let mut drained = self.pending.len() as u64;
        self.pending.clear();
        loop {
            match self.wire.read(&mut self.chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => drained += n as u64,
            }
        }
        if drained > 0 {
            debug!("Reset drained {} stale bytes", drained);
        }
        self.stats.bytes_drained += drained;
    }

    /// Next time the beacon `id` is expected to transmit, or `None` before
    /// any beacon was received
    pub fn beacon_time(&self, id: u8) -> Option<SystemTime> {
        self.beacons.next_beacon_time(id, SystemTime::now())
    }
}

impl<T> Adapter<T> {
    /// Lowest beacon identifier seen on this link
    pub fn lowest_beacon_id(&self) -> Option<u8> {
        self.beacons.lowest_id()
    }

    /// Current anchor of the beacon schedule
    pub fn beacon_reference_time(&self) -> Option<SystemTime> {
        self.beacons.reference_time()
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// True when no frame is partially received
    pub fn is_idle(&self) -> bool {
        self.parser.is_idle() && self.pending.is_empty()
    }

    pub fn get_ref(&self) -> &T {
        &self.wire
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.wire
    }

    /// Consumes the adapter, returning the transport
    pub fn into_inner(self) -> T {
        self.wire
    }
}
