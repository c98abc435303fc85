//! AVR text framing: `*<hex>;` messages in an ASCII stream.
//!
//! The whole buffer is consumed on every call. A message cut by a read
//! boundary is lost; the scan resynchronises on the next `*`.

use tracing::debug;

use crate::frame::RawBuffer;
use crate::types::{now, DecodedMessage};

/// Start-of-message marker.
pub const START: u8 = b'*';

/// End-of-message marker.
pub const STOP: u8 = b';';

/// Decode every complete `*...;` span in `buf` and clear it.
pub fn decode(buf: &mut RawBuffer) -> Vec<DecodedMessage> {
    let mut messages = Vec::new();
    // None while between a `;` (or the start of the buffer) and the next `*`
    let mut current: Option<String> = None;

    for &b in buf.as_slice() {
        match b {
            START => current = Some(String::new()),
            STOP => {
                if let Some(payload) = current.take() {
                    messages.push(DecodedMessage::new(payload, now()));
                }
            }
            b if b.is_ascii_hexdigit() => {
                if let Some(payload) = current.as_mut() {
                    payload.push(b as char);
                }
            }
            _ => {}
        }
    }

    if let Some(partial) = current {
        debug!(len = partial.len(), "dropping unterminated AVR message");
    }

    buf.clear();
    messages
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
