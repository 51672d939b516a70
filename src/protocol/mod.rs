//! Protocol implementation module
//!
//! This module defines the CSP message, its wire encoding, and the
//! incremental frame parser that reconstructs messages from a byte stream.

pub mod codec;
pub mod message;
pub mod state;

pub use self::codec::CspCodec;
pub use self::message::{checksum, Message};
pub use self::state::{FrameParser, ParseState};
