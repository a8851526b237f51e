// Pure encoding primitives: hex digits, burst layout, address mapping.
//
// Nothing here performs I/O; the stream driver in `crate::stream` feeds
// windows through these functions.

pub mod address;
pub mod burst;
pub mod hex;

pub use address::{AddressHole, AddressMapper};
pub use burst::{EncodedBurst, encode_terminal, encode_window};
