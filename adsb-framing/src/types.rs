//! Shared types, error enum, and decoded message type for adsb-framing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;

/// All errors produced by adsb-framing.
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("unknown frame format {0:?} (expected avr, beast or dump1090)")]
    UnknownFormat(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FramingError>;

// ---------------------------------------------------------------------------
// Message length classes
// ---------------------------------------------------------------------------

/// Hex length of a 56-bit Mode S reply.
pub const SHORT_HEX_LEN: usize = 14;

/// Hex length of a 112-bit Mode S reply.
pub const LONG_HEX_LEN: usize = 28;

/// Mode S message length, by hex character count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthClass {
    /// 56 bits, 14 hex chars.
    Short,
    /// 112 bits, 28 hex chars.
    Long,
}

impl LengthClass {
    /// Classify a payload by its hex length. `None` if it is neither.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            SHORT_HEX_LEN => Some(LengthClass::Short),
            LONG_HEX_LEN => Some(LengthClass::Long),
            _ => None,
        }
    }

    pub fn hex_len(self) -> usize {
        match self {
            LengthClass::Short => SHORT_HEX_LEN,
            LengthClass::Long => LONG_HEX_LEN,
        }
    }
}

// ---------------------------------------------------------------------------
// Decoded message
// ---------------------------------------------------------------------------

/// One framed message, ready for the consumer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedMessage {
    /// Hex-encoded Mode S payload.
    pub payload: String,
    /// Unix timestamp taken when the message was extracted from the buffer.
    pub timestamp: f64,
    /// Beast only: RSSI byte reported by the receiver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_level: Option<u8>,
    /// Beast only: 48-bit MLAT counter embedded in the frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mlat_ticks: Option<u64>,
}

impl DecodedMessage {
    pub fn new(payload: String, timestamp: f64) -> Self {
        DecodedMessage {
            payload,
            timestamp,
            signal_level: None,
            mlat_ticks: None,
        }
    }

    /// Short or long, derived from the payload length.
    pub fn length_class(&self) -> Option<LengthClass> {
        LengthClass::from_hex_len(self.payload.len())
    }
}

// ---------------------------------------------------------------------------
// Hex and clock helpers
// ---------------------------------------------------------------------------

/// Encode bytes as uppercase hex string.
pub fn hex_encode(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for &b in data {
        s.push(HEX_CHARS[(b >> 4) as usize] as char);
        s.push(HEX_CHARS[(b & 0x0F) as usize] as char);
    }
    s
}

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

/// Current wall-clock time as fractional seconds since the Unix epoch.
pub fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
