//! Line framing codec for tokio.
//!
//! One transport read may carry zero, one, or several newline-terminated
//! lines, and may end mid-line; this codec owns that reassembly so the
//! parser above it always sees exactly one complete line. Outbound
//! [`Message`]s are serialized with a CRLF terminator.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtoError;
use crate::message::Message;

/// IRC standard line limit (including CRLF).
const MAX_LINE_LEN: usize = 512;

/// Newline-framed codec. Decodes to trimmed line strings, encodes
/// [`Message`]s with CRLF appended.
#[derive(Debug)]
pub struct LineCodec {
    /// Index of the next byte to check for a newline.
    next_index: usize,
    /// Maximum line length, 512 unless overridden.
    max_len: usize,
}

impl LineCodec {
    /// Create a codec with the standard 512-byte limit.
    pub fn new() -> Self {
        LineCodec {
            next_index: 0,
            max_len: MAX_LINE_LEN,
        }
    }

    /// Create a codec with a custom line limit.
    pub fn with_max_len(max_len: usize) -> Self {
        LineCodec {
            next_index: 0,
            max_len,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtoError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtoError> {
        // Resume the newline scan where the previous call stopped
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(ProtoError::LineTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            let text = std::str::from_utf8(&line).map_err(|e| ProtoError::InvalidUtf8 {
                byte_pos: e.valid_up_to(),
            })?;

            Ok(Some(text.trim_end_matches(['\r', '\n']).to_owned()))
        } else {
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(ProtoError::LineTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

impl Encoder<Message> for LineCodec {
    type Error = ProtoError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), ProtoError> {
        let line = msg.to_string();
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_complete_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :test\r\n");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some("PING :test".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_partial_then_rest() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :te");

        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"st\r\n:x!y@z JOIN #c\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :test".into()));
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(":x!y@z JOIN #c".into())
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_merged_lines() {
        // One read carrying several protocol lines
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("A\r\nB\r\nC\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("A".into()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("B".into()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("C".into()));
    }

    #[test]
    fn test_decode_too_long() {
        let mut codec = LineCodec::with_max_len(10);
        let mut buf = BytesMut::from("this line is way too long\n");

        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtoError::LineTooLong { .. })
        ));
    }

    #[test]
    fn test_encode_appends_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec.encode(Message::pong("test"), &mut buf).unwrap();
        assert_eq!(&buf[..], b"PONG :test\r\n");
    }
}
