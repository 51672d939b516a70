use std::mem;

use crate::core::{Command, Direction, Error, Result, HEADER, MAX_LENGTH};
use crate::link::FrameObserver;
use super::message::Message;

/// Position of the frame parser. Each variant carries only the fields that
/// have been read by the time the parser reaches it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParseState {
    /// Waiting for `$`
    #[default]
    Idle,
    /// Got `$`, waiting for `C`
    Header,
    /// Got the sync sequence, waiting for the direction byte
    Direction,
    /// Waiting for the length byte
    Length {
        direction: Direction,
    },
    /// Waiting for the command byte
    Command {
        direction: Direction,
        length: u8,
    },
    /// Accumulating payload bytes
    Payload {
        direction: Direction,
        length: u8,
        command: Command,
        checksum: u8,
        payload: Vec<u8>,
    },
    /// Payload complete, waiting for the checksum byte
    Checksum {
        direction: Direction,
        command: Command,
        checksum: u8,
        payload: Vec<u8>,
    },
}

impl ParseState {
    /// Short name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ParseState::Idle => "IDLE",
            ParseState::Header => "HEADER",
            ParseState::Direction => "DIRECTION",
            ParseState::Length { .. } => "LENGTH",
            ParseState::Command { .. } => "COMMAND",
            ParseState::Payload { .. } => "PAYLOAD",
            ParseState::Checksum { .. } => "CHECKSUM",
        }
    }
}

/// Incremental byte-at-a-time decoder for CSP frames.
///
/// Any byte that does not fit the frame structure sends the parser back to
/// [`ParseState::Idle`]; decoding resumes at the next `$C` in the stream.
#[derive(Debug, Clone, Default)]
pub struct FrameParser {
    state: ParseState,
}

impl FrameParser {
    /// Creates a parser waiting for a sync sequence
    pub fn new() -> Self {
        FrameParser::default()
    }

    /// Current parser position
    pub fn state(&self) -> &ParseState {
        &self.state
    }

    /// Name of the current parser position
    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    /// True when no frame is partially decoded
    pub fn is_idle(&self) -> bool {
        self.state == ParseState::Idle
    }

    /// Drops any partially decoded frame
    pub fn reset(&mut self) {
        self.state = ParseState::Idle;
    }

    /// Feeds one byte.
    ///
    /// Returns `Ok(Some(message))` once a checksum-valid frame completes,
    /// `Ok(None)` while more bytes are needed, and [`Error::Checksum`] when the
    /// trailing byte does not match. The parser is back at idle after either
    /// of the last two outcomes.
    pub fn feed(&mut self, byte: u8, observer: &dyn FrameObserver) -> Result<Option<Message>> {
        let from = self.state.name();
        let (next, outcome) = Self::step(mem::take(&mut self.state), byte);
        if let Some(Err(Error::Checksum { expected, actual })) = &outcome {
            observer.on_checksum(*expected, *actual);
        } else if let Some(Ok(message)) = &outcome {
            observer.on_checksum(message.checksum, message.checksum);
        }
        observer.on_transition(from, next.name(), byte);
        self.state = next;
        outcome.transpose()
    }

    fn step(state: ParseState, byte: u8) -> (ParseState, Option<Result<Message>>) {
        let next = match state {
            ParseState::Idle if byte == HEADER[0] => ParseState::Header,
            ParseState::Idle => ParseState::Idle,
            ParseState::Header if byte == HEADER[1] => ParseState::Direction,
            ParseState::Header => ParseState::Idle,
            ParseState::Direction => match Direction::from_byte(byte) {
                Some(direction) => ParseState::Length { direction },
                None => ParseState::Idle,
            },
            ParseState::Length { direction } => {
                if byte > MAX_LENGTH {
                    ParseState::Idle
                } else {
                    ParseState::Command {
                        direction,
                        length: byte,
                    }
                }
            }
            ParseState::Command { direction, length } => {
                let command = Command(byte);
                let checksum = length ^ byte;
                if length == 0 {
                    ParseState::Checksum {
                        direction,
                        command,
                        checksum,
                        payload: Vec::new(),
                    }
                } else {
                    ParseState::Payload {
                        direction,
                        length,
                        command,
                        checksum,
                        payload: Vec::with_capacity(length as usize),
                    }
                }
            }
            ParseState::Payload {
                direction,
                length,
                command,
                checksum,
                mut payload,
            } => {
                payload.push(byte);
                let checksum = checksum ^ byte;
                if payload.len() == length as usize {
                    ParseState::Checksum {
                        direction,
                        command,
                        checksum,
                        payload,
                    }
                } else {
                    ParseState::Payload {
                        direction,
                        length,
                        command,
                        checksum,
                        payload,
                    }
                }
            }
            ParseState::Checksum {
                direction,
                command,
                checksum,
                payload,
            } => {
                let outcome = if checksum == byte {
                    Ok(Message {
                        direction,
                        command,
                        payload,
                        checksum,
                    })
                } else {
                    Err(Error::Checksum {
                        expected: checksum,
                        actual: byte,
                    })
                };
                return (ParseState::Idle, Some(outcome));
            }
        };
        (next, None)
    }
}
