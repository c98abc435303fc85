//! Frame formats and the raw byte buffer they are decoded from.
//!
//! Responsibilities:
//! - Name the three wire encodings (`avr`, `beast`, `dump1090`)
//! - Own the not-yet-framed bytes between reads (`RawBuffer`)
//! - Dispatch a buffer to the decoder selected by the format

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{DecodedMessage, FramingError};
use crate::{avr, beast, dump1090};

// ---------------------------------------------------------------------------
// FrameFormat
// ---------------------------------------------------------------------------

/// Wire encoding of the incoming stream. Fixed for the lifetime of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    /// ASCII `*<hex>;` lines (dump1090 port 30002).
    Avr,
    /// Binary escaped frames (port 30005).
    Beast,
    /// ASCII `@<mlat><hex>;` lines, newline terminated.
    Dump1090,
}

impl FrameFormat {
    pub const ALL: [FrameFormat; 3] = [FrameFormat::Avr, FrameFormat::Beast, FrameFormat::Dump1090];

    pub fn as_str(self) -> &'static str {
        match self {
            FrameFormat::Avr => "avr",
            FrameFormat::Beast => "beast",
            FrameFormat::Dump1090 => "dump1090",
        }
    }

    /// Decode everything decodable in `buf`, leaving the residual behind.
    pub fn decode(self, buf: &mut RawBuffer) -> Vec<DecodedMessage> {
        match self {
            FrameFormat::Avr => avr::decode(buf),
            FrameFormat::Beast => beast::decode(buf),
            FrameFormat::Dump1090 => dump1090::decode(buf),
        }
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameFormat {
    type Err = FramingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        FrameFormat::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| FramingError::UnknownFormat(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// RawBuffer
// ---------------------------------------------------------------------------

/// Bytes read from the socket that have not been framed yet.
///
/// Grows by `extend` after every read and shrinks only when a decoder
/// consumes bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBuffer {
    bytes: Vec<u8>,
}

impl RawBuffer {
    pub fn new() -> Self {
        RawBuffer::default()
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Drop the first `n` bytes.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.bytes.len());
        self.bytes.drain(..n);
    }

    /// Take all bytes out, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    /// Replace the contents with `residual`.
    pub fn replace(&mut self, residual: Vec<u8>) {
        self.bytes = residual;
    }
}

impl From<&[u8]> for RawBuffer {
    fn from(data: &[u8]) -> Self {
        RawBuffer {
            bytes: data.to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
