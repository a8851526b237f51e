// Conversion configuration.
//
// `ConvertOptions` is resolved once (by the CLI or a library caller) and
// never mutated while a conversion runs. Validation happens before any
// input is read or any output is created.

use thiserror::Error;

use crate::codec::address::AddressHole;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Largest supported burst, in bytes.
pub const MAX_BURST_LENGTH: usize = 0x400;

/// Burst lengths must be a multiple of this many bytes.
pub const BURST_ALIGNMENT: usize = 0x10;

/// Burst length used when none is given.
pub const DEFAULT_BURST_LENGTH: usize = MAX_BURST_LENGTH;

/// Default transcript path.
pub const DEFAULT_OUTPUT: &str = "data.txt";

/// Default write-transaction script path.
pub const DEFAULT_SCRIPT: &str = "data.tcl";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Invalid configuration. Always fatal; reported before any output exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Burst length of zero bytes.
    #[error("burst length must be non-zero")]
    EmptyBurst,

    /// Burst length above [`MAX_BURST_LENGTH`].
    #[error("burst length {len} exceeds max {max}")]
    BurstTooLong { len: usize, max: usize },

    /// Burst length not a multiple of [`BURST_ALIGNMENT`].
    #[error("burst length {len} is not a multiple of {alignment}")]
    BurstMisaligned { len: usize, alignment: usize },
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Resolved configuration for one conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Bytes per burst (16..=1024, multiple of 16).
    pub burst_length: usize,
    /// Added to every window offset to form the emitted address.
    pub address_offset: u32,
    /// Full bursts whose address falls inside are not emitted.
    pub hole: AddressHole,
    /// Write the `0a` sentinel into the terminal burst's padding.
    pub end_marker: bool,
    /// Also render the write-transaction script.
    pub script: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            burst_length: DEFAULT_BURST_LENGTH,
            address_offset: 0,
            hole: AddressHole::default(),
            end_marker: true,
            script: false,
        }
    }
}

impl ConvertOptions {
    pub fn with_burst_length(mut self, burst_length: usize) -> Self {
        self.burst_length = burst_length;
        self
    }

    pub fn with_address_offset(mut self, offset: u32) -> Self {
        self.address_offset = offset;
        self
    }

    pub fn with_hole(mut self, begin: u32, end: u32) -> Self {
        self.hole = AddressHole::new(begin, end);
        self
    }

    pub fn with_end_marker(mut self, end_marker: bool) -> Self {
        self.end_marker = end_marker;
        self
    }

    pub fn with_script(mut self, script: bool) -> Self {
        self.script = script;
        self
    }

    /// Check the burst length against the supported range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let len = self.burst_length;
        if len == 0 {
            return Err(ConfigError::EmptyBurst);
        }
        if len > MAX_BURST_LENGTH {
            return Err(ConfigError::BurstTooLong {
                len,
                max: MAX_BURST_LENGTH,
            });
        }
        if !len.is_multiple_of(BURST_ALIGNMENT) {
            return Err(ConfigError::BurstMisaligned {
                len,
                alignment: BURST_ALIGNMENT,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
