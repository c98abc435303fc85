//! dump1090 raw text framing: newline-terminated `@<mlat><hex>;` lines.
//!
//! Each line carries a 13-byte prefix (`@` plus a 12-digit hex MLAT
//! counter) and a trailing `;`. The payload is what lies between them.

use tracing::debug;

use crate::frame::RawBuffer;
use crate::types::{now, DecodedMessage};

/// Bytes stripped from the front of every line.
pub const PREFIX_LEN: usize = 13;

/// Bytes stripped from the end of every line.
pub const SUFFIX_LEN: usize = 1;

/// Decode every complete line in `buf`. A trailing partial line is kept.
pub fn decode(buf: &mut RawBuffer) -> Vec<DecodedMessage> {
    if buf.is_empty() {
        return Vec::new();
    }

    let ts = now();
    let data = buf.take();
    let mut lines: Vec<&[u8]> = data.split(|&b| b == b'\n').collect();

    // Either the unterminated tail or the empty slice after the final '\n'
    if let Some(residual) = lines.pop() {
        buf.replace(residual.to_vec());
    }

    lines
        .into_iter()
        .filter_map(|line| match extract_payload(line) {
            Some(payload) => Some(DecodedMessage::new(payload, ts)),
            None => {
                debug!(len = line.len(), "dropping short dump1090 line");
                None
            }
        })
        .collect()
}

/// `line[13..len-1]`, mapping each byte to one char. `None` if empty.
fn extract_payload(line: &[u8]) -> Option<String> {
    if line.len() <= PREFIX_LEN + SUFFIX_LEN {
        return None;
    }
    let inner = &line[PREFIX_LEN..line.len() - SUFFIX_LEN];
    Some(inner.iter().map(|&b| b as char).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
