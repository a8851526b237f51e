// Window offset to emitted address, plus the optional address hole.
//
// Addresses are 32-bit and wrap silently; `AddressMapper::fits` lets a
// caller detect that ahead of time.

/// Half-open address interval `[begin, end)` excluded from the transcript.
///
/// Inactive unless `begin < end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressHole {
    pub begin: u32,
    pub end: u32,
}

impl AddressHole {
    pub const fn new(begin: u32, end: u32) -> Self {
        Self { begin, end }
    }

    #[inline]
    pub const fn is_active(&self) -> bool {
        self.begin < self.end
    }

    #[inline]
    pub const fn contains(&self, address: u32) -> bool {
        self.is_active() && self.begin <= address && address < self.end
    }
}

/// Maps a window's byte offset in the input to the address it is emitted at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressMapper {
    offset: u32,
    hole: AddressHole,
}

impl AddressMapper {
    pub const fn new(offset: u32, hole: AddressHole) -> Self {
        Self { offset, hole }
    }

    pub const fn offset(&self) -> u32 {
        self.offset
    }

    pub const fn hole(&self) -> AddressHole {
        self.hole
    }

    /// `window_start + offset`, truncated and wrapped to 32 bits.
    #[inline]
    pub fn address(&self, window_start: u64) -> u32 {
        (window_start as u32).wrapping_add(self.offset)
    }

    /// Whether a full burst at `address` is dropped.
    ///
    /// Never consulted for the terminal burst.
    #[inline]
    pub fn suppresses(&self, address: u32) -> bool {
        self.hole.contains(address)
    }

    /// Whether every window start in an input of `input_len` bytes maps to
    /// an address without wrapping.
    pub fn fits(&self, input_len: u64) -> bool {
        u64::from(self.offset) + input_len <= u64::from(u32::MAX)
    }
}
