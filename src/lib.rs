//! bin2fpgadata: binary images to burst-chunked hex transcripts.
//!
//! The input is read in fixed-size bursts. Each burst becomes an address
//! line and a hex line whose bytes appear in reverse read order, the layout
//! expected by AXI write transactions issued from a hardware debug core.
//! The final burst is always present, zero-padded, and by default carries a
//! `0a` end marker.
//!
//! The crate provides:
//! - Pure encoding primitives (`codec`)
//! - The burst stream driver (`stream`)
//! - Transcript and tcl script rendering (`transcript`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use bin2fpgadata::config::ConvertOptions;
//! use bin2fpgadata::transcript::convert_to_strings;
//!
//! let opts = ConvertOptions::default().with_burst_length(16);
//! let (text, _script, _stats) = convert_to_strings(&[0x11; 20], &opts).unwrap();
//! let mut lines = text.lines();
//! assert_eq!(lines.next(), Some("0"));
//! assert_eq!(lines.next(), Some("11".repeat(16).as_str()));
//! assert_eq!(lines.next(), Some("10"));
//! ```

pub mod codec;
pub mod config;
pub mod io;
pub mod stream;
pub mod transcript;

#[cfg(feature = "cli")]
pub mod cli;

pub use codec::EncodedBurst;
pub use config::{ConfigError, ConvertOptions};
pub use stream::{BurstStream, ConvertError, ConvertStats};
