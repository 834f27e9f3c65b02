//! Line decoder for client input
//!
//! Splits on `\n` and strips a trailing `\r`. Bytes are decoded lossily, so
//! a line in another encoding still arrives as text. A line longer than the
//! limit is dropped up to its newline and reported as `Inbound::Oversized`
//! instead of an error, which would end the stream.

use std::cmp;
use std::io;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

/// One decoded unit of client input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Line(String),
    /// A line over the limit was thrown away
    Oversized,
}

#[derive(Debug, Clone)]
pub struct ChatLineCodec {
    max_length: usize,
    /// Where to resume the newline search
    next_index: usize,
    /// Inside an oversized line, dropping bytes until the next newline
    discarding: bool,
}

impl ChatLineCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

impl Decoder for ChatLineCodec {
    type Item = Inbound;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Inbound>, io::Error> {
        loop {
            let read_to = cmp::min(self.max_length.saturating_add(1), buf.len());
            let newline = buf[self.next_index..read_to]
                .iter()
                .position(|b| *b == b'\n');

            match (self.discarding, newline) {
                (true, Some(offset)) => {
                    buf.advance(self.next_index + offset + 1);
                    self.discarding = false;
                    self.next_index = 0;
                    return Ok(Some(Inbound::Oversized));
                }
                (true, None) => {
                    buf.advance(read_to);
                    self.next_index = 0;
                    if buf.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(offset)) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let line = buf.split_to(end + 1);
                    return Ok(Some(Inbound::Line(decode_line(&line[..end]))));
                }
                (false, None) if buf.len() > self.max_length => {
                    self.discarding = true;
                    self.next_index = 0;
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Inbound>, io::Error> {
        if let Some(item) = self.decode(buf)? {
            return Ok(Some(item));
        }
        self.next_index = 0;
        if self.discarding {
            self.discarding = false;
            buf.clear();
            return Ok(Some(Inbound::Oversized));
        }
        if buf.is_empty() {
            return Ok(None);
        }
        // Last line without a newline
        let line = buf.split_to(buf.len());
        Ok(Some(Inbound::Line(decode_line(&line))))
    }
}
