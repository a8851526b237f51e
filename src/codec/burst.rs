// Burst encoder: one input window to one fixed-width hex string.
//
// Layout (B = burst length in bytes, 2*B hex chars):
//
//   byte i of the window  ->  chars [2*(B-1-i), 2*(B-1-i)+1]
//
// so the last byte read comes first and the first byte read comes last.
// Positions are always computed against the full burst length; a short
// window leaves the leading chars as `'0'` padding.
//
// The terminal burst may additionally carry an end marker: the low nibble
// of the padding byte just before the real data is set to `'a'`, giving a
// `0x0a` byte.

use super::hex::byte_to_hex;

/// Low nibble of the end-marker byte (`0x0a`).
pub const END_MARKER_NIBBLE: u8 = b'a';

/// One emitted burst: its address and the reversed hex payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBurst {
    /// Window start offset plus the configured address offset.
    pub address: u32,
    /// Exactly `2 * burst_length` chars from `0-9a-f`.
    pub hex: String,
    /// Set only on the final, padded burst of a stream.
    pub terminal: bool,
}

/// Char index of the end-marker nibble for a terminal window of
/// `real_len` bytes.
///
/// When the window fills the whole burst there is no padding and the index
/// lands on the low nibble of the last real byte.
#[inline]
pub fn end_marker_position(real_len: usize, burst_length: usize) -> usize {
    2 * (burst_length - real_len).saturating_sub(1) + 1
}

fn encode_into(window: &[u8], burst_length: usize) -> Vec<u8> {
    assert!(
        window.len() <= burst_length,
        "window of {} bytes exceeds burst length {burst_length}",
        window.len()
    );
    let total = 2 * burst_length;
    let mut out = vec![b'0'; total];
    for (i, &byte) in window.iter().enumerate() {
        let pos = total - 2 * (i + 1);
        out[pos..pos + 2].copy_from_slice(&byte_to_hex(byte));
    }
    out
}

fn into_string(chars: Vec<u8>) -> String {
    // Only ASCII hex digits are ever written.
    String::from_utf8(chars).unwrap_or_else(|_| unreachable!("non-ASCII hex output"))
}

/// Encode a window without an end marker.
///
/// A full window yields its exact byte-reversed rendering.
pub fn encode_window(window: &[u8], burst_length: usize) -> String {
    into_string(encode_into(window, burst_length))
}

/// Encode the terminal window, zero-padded, optionally with the end marker.
pub fn encode_terminal(window: &[u8], burst_length: usize, end_marker: bool) -> String {
    let mut chars = encode_into(window, burst_length);
    if end_marker {
        if window.len() == burst_length {
            log::warn!(
                "terminal window fills the {burst_length}-byte burst; end marker overwrites the last data nibble"
            );
        }
        chars[end_marker_position(window.len(), burst_length)] = END_MARKER_NIBBLE;
    }
    into_string(chars)
}
