use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::core::{Error, MAX_PAYLOAD};
use crate::link::{FrameObserver, TracingObserver};
use super::message::Message;
use super::state::FrameParser;

/// Codec for driving CSP framing over async byte streams
pub struct CspCodec {
    parser: FrameParser,
    observer: Box<dyn FrameObserver + Send>,
}

impl CspCodec {
    /// Creates a codec that traces through `tracing`
    pub fn new() -> Self {
        Self::with_observer(TracingObserver)
    }

    /// Creates a codec reporting to the given observer
    pub fn with_observer(observer: impl FrameObserver + Send + 'static) -> Self {
        CspCodec {
            parser: FrameParser::new(),
            observer: Box::new(observer),
        }
    }

    /// Parser state, for inspecting a partially received frame
    pub fn parser(&self) -> &FrameParser {
        &self.parser
    }
}

impl Default for CspCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for CspCodec {
    type Item = Message;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while src.has_remaining() {
            let byte = src.get_u8();
            self.observer.on_receive(&[byte]);
            match self.parser.feed(byte, self.observer.as_ref()) {
                Ok(Some(message)) => return Ok(Some(message)),
                Ok(None) => {}
                // The observer has seen the mismatch; the parser is idle again,
                // so the stream keeps going with the next frame.
                Err(Error::Checksum { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // A frame cut off by end of stream is dropped rather than reported.
        let message = self.decode(src)?;
        if message.is_none() {
            self.parser.reset();
        }
        Ok(message)
    }
}

impl Encoder<Message> for CspCodec {
    type Error = Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.payload.len() > MAX_PAYLOAD {
            return Err(Error::PayloadTooLarge(item.payload.len()));
        }
        let start = dst.len();
        item.encode_into(dst);
        self.observer.on_send(&dst[start..]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Command, Direction};
    use crate::link::NoopObserver;
    use futures::StreamExt;
    use tokio_util::codec::FramedRead;

    #[test]
    fn test_codec_round_trip() {
        let mut codec = CspCodec::with_observer(NoopObserver);
        let mut bytes = BytesMut::new();

        let message = Message::request(Command(0x21), vec![0x01, 0x02, 0x03]).unwrap();
        codec.encode(message.clone(), &mut bytes).unwrap();
        assert_eq!(bytes.len(), message.frame_len());

        let decoded = codec.decode(&mut bytes).unwrap().unwrap();
        assert_eq!(decoded, message);
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_codec_partial_frame() {
        let mut codec = CspCodec::with_observer(NoopObserver);
        let frame = Message::response(Command(0x05), vec![0xEE; 4]).unwrap().to_bytes();

        let mut first = BytesMut::from(&frame[..5]);
        assert!(codec.decode(&mut first).unwrap().is_none());
        assert!(!codec.parser().is_idle());

        let mut rest = BytesMut::from(&frame[5..]);
        let decoded = codec.decode(&mut rest).unwrap().unwrap();
        assert_eq!(decoded.payload, vec![0xEE; 4]);
    }

    #[test]
    fn test_codec_leaves_following_frame() {
        let mut codec = CspCodec::with_observer(NoopObserver);
        let mut bytes = BytesMut::new();
        Message::request(Command(0x01), Vec::new()).unwrap().encode_into(&mut bytes);
        Message::request(Command(0x02), Vec::new()).unwrap().encode_into(&mut bytes);

        assert_eq!(codec.decode(&mut bytes).unwrap().unwrap().command, Command(0x01));
        assert_eq!(bytes.len(), 6);
        assert_eq!(codec.decode(&mut bytes).unwrap().unwrap().command, Command(0x02));
    }

    #[test]
    fn test_codec_rejects_oversized_message() {
        let mut codec = CspCodec::with_observer(NoopObserver);
        let message = Message {
            direction: Direction::Request,
            command: Command(0x01),
            payload: vec![0; MAX_PAYLOAD + 1],
            checksum: 0,
        };
        let mut bytes = BytesMut::new();
        assert!(matches!(
            codec.encode(message, &mut bytes),
            Err(Error::PayloadTooLarge(111))
        ));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_codec_skips_corrupted_frame() {
        let mut codec = CspCodec::with_observer(NoopObserver);
        let mut bytes = BytesMut::new();
        let mut bad = Message::request(Command(0x01), Vec::new()).unwrap().to_bytes();
        bad[5] ^= 0xFF;
        bytes.extend_from_slice(&bad);
        let good = Message::request(Command(0x02), vec![0x33]).unwrap();
        good.encode_into(&mut bytes);

        assert_eq!(codec.decode(&mut bytes).unwrap().unwrap(), good);
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_framed_read_continues_after_checksum_error() {
        let mut bad = Message::request(Command(0x01), Vec::new()).unwrap().to_bytes();
        bad[5] ^= 0xFF;
        let good = Message::response(Command(0x02), vec![0x44, 0x55]).unwrap();

        let stream = tokio_test::io::Builder::new()
            .read(&bad)
            .read(&good.to_bytes())
            .build();

        let mut framed = FramedRead::new(stream, CspCodec::with_observer(NoopObserver));
        assert_eq!(framed.next().await.unwrap().unwrap(), good);
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn test_framed_read_over_stream() {
        let first = Message::request(Command(0x01), vec![0x10]).unwrap();
        let second = Message::response(Command(0x01), vec![0x20, 0x21]).unwrap();

        let mut noisy = vec![0xFF, b'$', 0x00];
        noisy.extend_from_slice(&first.to_bytes());
        let second_bytes = second.to_bytes();

        let stream = tokio_test::io::Builder::new()
            .read(&noisy)
            .read(&second_bytes[..3])
            .read(&second_bytes[3..])
            .build();

        let mut framed = FramedRead::new(stream, CspCodec::with_observer(NoopObserver));
        assert_eq!(framed.next().await.unwrap().unwrap(), first);
        assert_eq!(framed.next().await.unwrap().unwrap(), second);
        assert!(framed.next().await.is_none());
    }
}
