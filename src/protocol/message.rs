use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::core::{Command, Direction, Error, Result, FRAME_OVERHEAD, HEADER, MAX_PAYLOAD};

/// One CSP message: direction, command and payload, plus the checksum that
/// travels as the last byte of its frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Request or response
    pub direction: Direction,
    /// Application command identifier
    pub command: Command,
    /// Payload bytes; the wire length byte is always `payload.len()`
    pub payload: Vec<u8>,
    /// XOR of the length byte, the command byte and every payload byte
    pub checksum: u8,
}

impl Message {
    /// Builds an outbound message, computing its checksum
    pub fn new(direction: Direction, command: Command, payload: impl Into<Vec<u8>>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD {
            return Err(Error::PayloadTooLarge(payload.len()));
        }
        let checksum = checksum(payload.len() as u8, command, &payload);
        Ok(Message {
            direction,
            command,
            payload,
            checksum,
        })
    }

    /// Builds a request message
    pub fn request(command: Command, payload: impl Into<Vec<u8>>) -> Result<Self> {
        Self::new(Direction::Request, command, payload)
    }

    /// Builds a response message
    pub fn response(command: Command, payload: impl Into<Vec<u8>>) -> Result<Self> {
        Self::new(Direction::Response, command, payload)
    }

    /// The fixed sync sequence every frame starts with
    pub fn header(&self) -> [u8; 2] {
        HEADER
    }

    /// Value of the wire length byte
    pub fn length(&self) -> u8 {
        self.payload.len() as u8
    }

    /// Beacon identifier, present when this is a beacon with a non-empty payload
    pub fn beacon_id(&self) -> Option<u8> {
        if self.command.is_beacon() {
            self.payload.first().copied()
        } else {
            None
        }
    }

    /// Size of this message on the wire
    pub fn frame_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// Appends the wire frame to `dst`
    pub fn encode_into(&self, dst: &mut BytesMut) {
        let length = self.length();
        dst.reserve(self.frame_len());
        dst.put_slice(&HEADER);
        dst.put_u8(self.direction.as_byte());
        dst.put_u8(length);
        dst.put_u8(self.command.value());
        dst.put_slice(&self.payload);
        dst.put_u8(checksum(length, self.command, &self.payload));
    }

    /// Serializes the message to its wire frame
    pub fn to_bytes(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.frame_len());
        self.encode_into(&mut buf);
        buf
    }
}

/// Running XOR over the length byte, the command byte and the payload
pub fn checksum(length: u8, command: Command, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(length ^ command.value(), |acc, &b| acc ^ b)
}
