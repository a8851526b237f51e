// Byte to lowercase ASCII hex.
//
// Only `0-9` and `a-f` are ever produced; every byte value is valid input.

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// ASCII digit for a single nibble.
///
/// Panics if `nibble > 0xF`; callers only pass masked or shifted bytes.
#[inline]
pub fn nibble_to_hex(nibble: u8) -> u8 {
    assert!(nibble < 0x10, "nibble out of range: {nibble:#x}");
    HEX_DIGITS[nibble as usize]
}

/// Two ASCII digits for `byte`: high nibble first, low nibble second.
#[inline]
pub fn byte_to_hex(byte: u8) -> [u8; 2] {
    [nibble_to_hex(byte >> 4), nibble_to_hex(byte & 0x0F)]
}
