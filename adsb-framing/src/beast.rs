//! Beast binary framing.
//!
//! ```text
//! <esc> "1" : 6 byte MLAT timestamp, 1 byte signal level, 2 byte Mode-AC
//! <esc> "2" : 6 byte MLAT timestamp, 1 byte signal level, 7 byte Mode-S short
//! <esc> "3" : 6 byte MLAT timestamp, 1 byte signal level, 14 byte Mode-S long
//! <esc> "4" : 6 byte MLAT timestamp, status data, DIP switch settings
//! <esc><esc>: literal 0x1A
//! ```
//!
//! A single `<esc>` ends the frame in progress and opens the next one, so a
//! frame is only complete once the marker of the following frame has been
//! seen. An `<esc>` that is the last byte of the buffer may be the first
//! half of a stuffed pair and is left for the next read.
//!
//! The residual kept between calls is the raw, still-stuffed input from the
//! marker of the unterminated frame onward. Re-scanning it together with
//! the next read gives the same parse as if both had arrived at once.

use tracing::debug;

use crate::frame::RawBuffer;
use crate::types::{hex_encode, now, DecodedMessage};

pub const ESCAPE: u8 = 0x1A;

pub const MODE_AC: u8 = 0x31;
pub const MODE_S_SHORT: u8 = 0x32;
pub const MODE_S_LONG: u8 = 0x33;
pub const STATUS: u8 = 0x34;

/// Type byte + 6 byte MLAT counter + 1 byte signal level.
pub const HEADER_LEN: usize = 8;

/// Unstuffed frames longer than this are treated as line noise.
pub const MAX_FRAME_LEN: usize = 64;

/// Decode every closed frame in `buf`, keeping the unterminated tail.
pub fn decode(buf: &mut RawBuffer) -> Vec<DecodedMessage> {
    let (frames, consumed) = split_frames(buf.as_slice());
    buf.consume(consumed);

    frames
        .iter()
        .filter_map(|frame| {
            let msg = extract_message(frame, now());
            if msg.is_none() {
                debug!(
                    kind = frame.first().copied().unwrap_or_default(),
                    len = frame.len(),
                    "skipping beast frame"
                );
            }
            msg
        })
        .collect()
}

/// Split a stuffed byte stream into unstuffed frames.
///
/// Returns the closed frames (each starting with its type byte) and the
/// number of leading bytes of `data` that no longer need to be kept.
pub fn split_frames(data: &[u8]) -> (Vec<Vec<u8>>, usize) {
    let mut frames = Vec::new();
    // None until the first frame marker, or after discarding an oversized frame
    let mut current: Option<Vec<u8>> = None;
    let mut keep_from = data.len();
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];

        if byte == ESCAPE {
            match data.get(i + 1) {
                Some(&ESCAPE) => {
                    push_byte(&mut current, ESCAPE, &mut keep_from, data.len());
                    i += 2;
                }
                Some(_) => {
                    if let Some(frame) = current.take() {
                        if !frame.is_empty() {
                            frames.push(frame);
                        }
                    }
                    current = Some(Vec::new());
                    keep_from = i;
                    i += 1;
                }
                None => {
                    // Unpaired escape at the very end: wait for the next byte.
                    if current.is_none() {
                        keep_from = i;
                    }
                    break;
                }
            }
        } else {
            push_byte(&mut current, byte, &mut keep_from, data.len());
            i += 1;
        }
    }

    (frames, keep_from)
}

fn push_byte(current: &mut Option<Vec<u8>>, byte: u8, keep_from: &mut usize, end: usize) {
    if let Some(frame) = current.as_mut() {
        frame.push(byte);
        if frame.len() > MAX_FRAME_LEN {
            debug!(len = frame.len(), "discarding oversized beast frame");
            *current = None;
            *keep_from = end;
        }
    }
}

/// Turn one unstuffed frame into a message. Only Mode-S frames are kept.
pub fn extract_message(frame: &[u8], timestamp: f64) -> Option<DecodedMessage> {
    let payload_len = match *frame.first()? {
        MODE_S_SHORT => 7,
        MODE_S_LONG => 14,
        _ => return None,
    };

    let payload = frame.get(HEADER_LEN..HEADER_LEN + payload_len)?;

    Some(DecodedMessage {
        payload: hex_encode(payload),
        timestamp,
        signal_level: Some(frame[HEADER_LEN - 1]),
        mlat_ticks: Some(mlat_ticks(&frame[1..HEADER_LEN - 1])),
    })
}

/// 48-bit big-endian counter.
fn mlat_ticks(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LengthClass;

    const LONG: [u8; 14] = [
        0x8D, 0x48, 0x40, 0xD6, 0x20, 0x2C, 0xC3, 0x71, 0xC3, 0x2C, 0xE0, 0x57, 0x60, 0x98,
    ];
    const SHORT: [u8; 7] = [0x02, 0xE1, 0x97, 0xC8, 0x45, 0xAC, 0x82];

    /// Build a stuffed frame: marker, type, MLAT, signal, payload.
    fn frame(kind: u8, mlat: [u8; 6], signal: u8, payload: &[u8]) -> Vec<u8> {
        let mut body = vec![kind];
        body.extend_from_slice(&mlat);
        body.push(signal);
        body.extend_from_slice(payload);

        let mut out = vec![ESCAPE];
        for b in body {
            out.push(b);
            if b == ESCAPE {
                out.push(ESCAPE);
            }
        }
        out
    }

    fn stream() -> Vec<u8> {
        let mut data = frame(MODE_S_LONG, [0, 0, 0, 0, 0x01, 0x00], 0x80, &LONG);
        data.extend(frame(MODE_S_SHORT, [0, 0, 0, 0, 0x02, 0x00], 0x40, &SHORT));
        // Start of a Mode-AC frame closes the short one
        data.extend(frame(MODE_AC, [0; 6], 0x10, &[0x12, 0x34]));
        data
    }

    fn payloads(msgs: &[DecodedMessage]) -> Vec<String> {
        msgs.iter().map(|m| m.payload.clone()).collect()
    }

    #[test]
    fn test_decode_single_chunk() {
        let mut buf = RawBuffer::from(&stream()[..]);
        let msgs = decode(&mut buf);
        assert_eq!(
            payloads(&msgs),
            vec!["8D4840D6202CC371C32CE0576098", "02E197C845AC82"]
        );
        assert_eq!(msgs[0].length_class(), Some(LengthClass::Long));
        assert_eq!(msgs[1].length_class(), Some(LengthClass::Short));
        // Mode-AC frame is still open
        assert_eq!(buf.as_slice()[0], ESCAPE);
        assert_eq!(buf.as_slice()[1], MODE_AC);
    }

    #[test]
    fn test_metadata() {
        let mut buf = RawBuffer::from(&stream()[..]);
        let msgs = decode(&mut buf);
        assert_eq!(msgs[0].signal_level, Some(0x80));
        assert_eq!(msgs[0].mlat_ticks, Some(0x0100));
        assert_eq!(msgs[1].signal_level, Some(0x40));
        assert_eq!(msgs[1].mlat_ticks, Some(0x0200));
    }

    #[test]
    fn test_chunk_boundary_independence() {
        let data = stream();
        let mut whole = RawBuffer::from(&data[..]);
        let expected = payloads(&decode(&mut whole));

        for split in 0..=data.len() {
            let mut buf = RawBuffer::new();
            buf.extend(&data[..split]);
            let mut got = payloads(&decode(&mut buf));
            buf.extend(&data[split..]);
            got.extend(payloads(&decode(&mut buf)));
            assert_eq!(got, expected, "split at {split}");
            assert_eq!(buf, whole, "residual after split at {split}");
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let data = stream();
        let mut buf = RawBuffer::new();
        let mut got = Vec::new();
        for b in &data {
            buf.extend(&[*b]);
            got.extend(payloads(&decode(&mut buf)));
        }
        assert_eq!(got, vec!["8D4840D6202CC371C32CE0576098", "02E197C845AC82"]);
    }

    #[test]
    fn test_stuffed_escape_in_payload() {
        let mut payload = LONG;
        payload[3] = ESCAPE;
        payload[4] = ESCAPE;
        let mut data = frame(MODE_S_LONG, [0x1A, 0, 0, 0, 0, 0x1A], ESCAPE, &payload);
        data.extend(frame(STATUS, [0; 6], 0, &[]));

        let mut buf = RawBuffer::from(&data[..]);
        let msgs = decode(&mut buf);
        assert_eq!(payloads(&msgs), vec!["8D48401A1A2CC371C32CE0576098"]);
        assert_eq!(msgs[0].signal_level, Some(ESCAPE));
        assert_eq!(msgs[0].mlat_ticks, Some(0x1A00_0000_001A));
    }

    #[test]
    fn test_stuffed_escape_split_between_reads() {
        let mut payload = SHORT;
        payload[6] = ESCAPE;
        let mut data = frame(MODE_S_SHORT, [0; 6], 0, &payload);
        let pair_at = data.len() - 2;
        assert_eq!(&data[pair_at..], &[ESCAPE, ESCAPE]);
        data.extend(frame(MODE_AC, [0; 6], 0, &[0, 0]));

        let mut buf = RawBuffer::new();
        buf.extend(&data[..pair_at + 1]);
        assert!(decode(&mut buf).is_empty());
        assert_eq!(*buf.as_slice().last().unwrap(), ESCAPE);

        buf.extend(&data[pair_at + 1..]);
        let msgs = decode(&mut buf);
        assert_eq!(payloads(&msgs), vec!["02E197C845AC1A"]);
    }

    #[test]
    fn test_trailing_escape_is_held() {
        let mut data = frame(MODE_S_LONG, [0; 6], 0, &LONG);
        data.push(ESCAPE);

        let mut buf = RawBuffer::from(&data[..]);
        assert!(decode(&mut buf).is_empty());
        assert_eq!(buf.as_slice(), &data[..]);

        buf.extend(&[MODE_S_SHORT]);
        let msgs = decode(&mut buf);
        assert_eq!(payloads(&msgs), vec!["8D4840D6202CC371C32CE0576098"]);
        assert_eq!(buf.as_slice(), &[ESCAPE, MODE_S_SHORT]);
    }

    #[test]
    fn test_leading_garbage_is_dropped() {
        let mut data = vec![0x00, 0x33, 0xFF];
        data.extend(frame(MODE_S_SHORT, [0; 6], 0, &SHORT));
        data.push(ESCAPE);
        data.push(MODE_AC);

        let mut buf = RawBuffer::from(&data[..3]);
        assert!(decode(&mut buf).is_empty());
        assert!(buf.is_empty());

        let mut buf = RawBuffer::from(&data[..]);
        assert_eq!(payloads(&decode(&mut buf)), vec!["02E197C845AC82"]);
    }

    #[test]
    fn test_other_types_are_dropped() {
        let mut data = frame(MODE_AC, [0; 6], 0, &[0x12, 0x34]);
        data.extend(frame(STATUS, [0; 6], 0, &[0x01; 14]));
        data.extend(frame(0x35, [0; 6], 0, &LONG));
        data.push(ESCAPE);
        data.push(MODE_AC);

        let mut buf = RawBuffer::from(&data[..]);
        assert!(decode(&mut buf).is_empty());
        assert_eq!(buf.as_slice(), &[ESCAPE, MODE_AC]);
    }

    #[test]
    fn test_truncated_frames_are_dropped() {
        // 6 and 13 payload bytes would give 12 and 26 hex chars
        let mut data = frame(MODE_S_SHORT, [0; 6], 0, &SHORT[..6]);
        data.extend(frame(MODE_S_LONG, [0; 6], 0, &LONG[..13]));
        data.extend(frame(MODE_S_LONG, [0; 6], 0, &LONG));
        data.push(ESCAPE);
        data.push(MODE_AC);

        let mut buf = RawBuffer::from(&data[..]);
        let msgs = decode(&mut buf);
        assert_eq!(payloads(&msgs), vec!["8D4840D6202CC371C32CE0576098"]);
    }

    #[test]
    fn test_oversized_frame_resyncs() {
        let mut data = vec![ESCAPE, MODE_S_LONG];
        data.extend(std::iter::repeat(0x55).take(MAX_FRAME_LEN + 10));
        let noise_end = data.len();
        data.extend(frame(MODE_S_SHORT, [0; 6], 0, &SHORT));
        data.push(ESCAPE);
        data.push(MODE_AC);

        let mut buf = RawBuffer::from(&data[..noise_end]);
        assert!(decode(&mut buf).is_empty());
        assert!(buf.is_empty());

        let mut buf = RawBuffer::from(&data[..]);
        assert_eq!(payloads(&decode(&mut buf)), vec!["02E197C845AC82"]);
    }

    #[test]
    fn test_split_frames_consumed_count() {
        let data = [ESCAPE, 0x31, 0x01, ESCAPE, 0x32, 0x02];
        let (frames, consumed) = split_frames(&data);
        assert_eq!(frames, vec![vec![0x31, 0x01]]);
        assert_eq!(consumed, 3);
    }

    #[test]
    fn test_extract_message_bounds() {
        assert!(extract_message(&[], 0.0).is_none());
        assert!(extract_message(&[MODE_S_SHORT], 0.0).is_none());

        let mut long = vec![MODE_S_LONG, 0, 0, 0, 0, 0, 0, 0];
        long.extend_from_slice(&LONG);
        long.push(0xEE); // extra bytes past the payload are ignored
        let msg = extract_message(&long, 42.0).unwrap();
        assert_eq!(msg.payload, "8D4840D6202CC371C32CE0576098");
        assert_eq!(msg.timestamp, 42.0);
    }

    #[test]
    fn test_empty_buffer() {
        let mut buf = RawBuffer::new();
        assert!(decode(&mut buf).is_empty());
        assert!(buf.is_empty());
    }
}
