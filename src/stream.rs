// Stream driver.
//
// BurstStream pulls the input in burst-sized windows and yields encoded
// bursts in input order:
//   - Main:  every full window is encoded and addressed; windows whose
//            address lies in the hole are dropped
//   - Final: the remaining 0..B-1 bytes are encoded once as the terminal
//            burst, padded and optionally marked, never hole-checked
//   - Done:  nothing further
//
// Input size is never needed upfront: a short (or empty) read marks the
// transition to the terminal burst.

use std::io::{self, Read};
use std::iter::FusedIterator;

use thiserror::Error;

use crate::codec::{AddressMapper, EncodedBurst, encode_terminal, encode_window};
use crate::config::{ConfigError, ConvertOptions};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Rejected configuration; nothing was read or written.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Reading the input image failed.
    #[error("input read error: {0}")]
    Read(#[source] io::Error),

    /// Writing the transcript failed.
    #[error("output write error: {0}")]
    WriteTranscript(#[source] io::Error),

    /// Writing the write-transaction script failed.
    #[error("script write error: {0}")]
    WriteScript(#[source] io::Error),
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Counters gathered while a stream runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertStats {
    /// Bytes per burst.
    pub burst_length: usize,
    /// Input bytes consumed so far.
    pub input_size: u64,
    /// Bursts yielded, terminal burst included.
    pub bursts_emitted: u64,
    /// Full bursts dropped because their address was inside the hole.
    pub bursts_suppressed: u64,
    /// Whether the terminal burst carries the `0a` end marker.
    pub end_marker: bool,
}

// ---------------------------------------------------------------------------
// BurstStream
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Main,
    Final,
    Done,
}

/// Iterator over the encoded bursts of a byte stream.
///
/// Always yields exactly one terminal burst after the last full one, even
/// for empty input or input that is an exact multiple of the burst length.
///
/// # Example
/// ```
/// use bin2fpgadata::config::ConvertOptions;
/// use bin2fpgadata::stream::BurstStream;
///
/// let input = [0x11u8; 20];
/// let opts = ConvertOptions::default().with_burst_length(16);
/// let bursts: Vec<_> = BurstStream::new(&input[..], &opts)
///     .unwrap()
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(bursts.len(), 2);
/// assert_eq!(bursts[1].address, 16);
/// ```
pub struct BurstStream<R: Read> {
    reader: R,
    burst_length: usize,
    end_marker: bool,
    mapper: AddressMapper,
    /// Byte offset of the next window in the input.
    position: u64,
    window: Vec<u8>,
    state: State,
    stats: ConvertStats,
}

impl<R: Read> BurstStream<R> {
    /// Validate `opts` and prepare to read from `reader`. Nothing is read yet.
    pub fn new(reader: R, opts: &ConvertOptions) -> Result<Self, ConvertError> {
        opts.validate()?;
        Ok(Self {
            reader,
            burst_length: opts.burst_length,
            end_marker: opts.end_marker,
            mapper: AddressMapper::new(opts.address_offset, opts.hole),
            position: 0,
            window: Vec::with_capacity(opts.burst_length),
            state: State::Main,
            stats: ConvertStats {
                burst_length: opts.burst_length,
                end_marker: opts.end_marker,
                ..Default::default()
            },
        })
    }

    pub fn stats(&self) -> &ConvertStats {
        &self.stats
    }

    pub fn into_stats(self) -> ConvertStats {
        self.stats
    }

    /// Read up to one burst into the (zeroed) window, retrying short reads.
    fn fill_window(&mut self) -> io::Result<usize> {
        self.window.clear();
        self.window.resize(self.burst_length, 0);
        let mut filled = 0;
        while filled < self.burst_length {
            match self.reader.read(&mut self.window[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.window.truncate(filled);
        Ok(filled)
    }

    fn next_full(&mut self) -> Option<Result<EncodedBurst, ConvertError>> {
        loop {
            let filled = match self.fill_window() {
                Ok(n) => n,
                Err(e) => {
                    self.state = State::Done;
                    return Some(Err(ConvertError::Read(e)));
                }
            };
            self.stats.input_size += filled as u64;
            if filled < self.burst_length {
                self.state = State::Final;
                return None;
            }

            let address = self.mapper.address(self.position);
            self.position += self.burst_length as u64;
            if self.mapper.suppresses(address) {
                log::debug!("burst {address:#x}: inside hole, skipped");
                self.stats.bursts_suppressed += 1;
                continue;
            }

            log::debug!("burst {address:#x}");
            self.stats.bursts_emitted += 1;
            return Some(Ok(EncodedBurst {
                address,
                hex: encode_window(&self.window, self.burst_length),
                terminal: false,
            }));
        }
    }

    fn terminal(&mut self) -> EncodedBurst {
        self.state = State::Done;
        let address = self.mapper.address(self.position);
        if self.end_marker {
            log::debug!("burst {address:#x}: end marker 0a");
        }
        log::debug!(
            "burst {address:#x}: terminal, {} data bytes",
            self.window.len()
        );
        self.stats.bursts_emitted += 1;
        EncodedBurst {
            address,
            hex: encode_terminal(&self.window, self.burst_length, self.end_marker),
            terminal: true,
        }
    }
}

impl<R: Read> Iterator for BurstStream<R> {
    type Item = Result<EncodedBurst, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::Main {
            if let Some(item) = self.next_full() {
                return Some(item);
            }
        }
        match self.state {
            State::Final => Some(Ok(self.terminal())),
            State::Main | State::Done => None,
        }
    }
}

impl<R: Read> FusedIterator for BurstStream<R> {}

impl<R: Read> std::fmt::Debug for BurstStream<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BurstStream")
            .field("burst_length", &self.burst_length)
            .field("address_offset", &self.mapper.offset())
            .field("hole", &self.mapper.hole())
            .field("position", &self.position)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Convenience
// ---------------------------------------------------------------------------

/// Encode an in-memory image into its bursts.
pub fn encode_all(input: &[u8], opts: &ConvertOptions) -> Result<Vec<EncodedBurst>, ConvertError> {
    BurstStream::new(input, opts)?.collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(burst: usize) -> ConvertOptions {
        ConvertOptions::default().with_burst_length(burst)
    }

    /// Reader that hands out at most `chunk` bytes per call and interrupts
    /// every other call.
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
        interrupt: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "again"));
            }
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn uniform_twenty_bytes() {
        let bursts = encode_all(&[0x11; 20], &opts(16)).unwrap();
        assert_eq!(bursts.len(), 2);
        assert_eq!(bursts[0].address, 0);
        assert_eq!(bursts[0].hex, "11".repeat(16));
        assert!(!bursts[0].terminal);
        assert_eq!(bursts[1].address, 16);
        assert_eq!(
            bursts[1].hex,
            format!("{}0a{}", "00".repeat(11), "11".repeat(4))
        );
        assert!(bursts[1].terminal);
    }

    #[test]
    fn empty_input_yields_one_terminal() {
        let bursts = encode_all(&[], &opts(16)).unwrap();
        assert_eq!(bursts.len(), 1);
        assert_eq!(bursts[0].address, 0);
        assert_eq!(bursts[0].hex, format!("{}0a", "00".repeat(15)));
    }

    #[test]
    fn exact_multiple_appends_padding_burst() {
        let input: Vec<u8> = (0..64).map(|i| i as u8).collect();
        let bursts = encode_all(&input, &opts(32)).unwrap();
        assert_eq!(bursts.len(), 3);
        assert_eq!(bursts[2].address, 64);
        assert!(bursts[2].terminal);
        assert_eq!(bursts[2].hex, format!("{}0a", "00".repeat(31)));
    }

    #[test]
    fn offset_applies_to_every_burst() {
        let o = opts(16).with_address_offset(0x4000_0000);
        let bursts = encode_all(&[0u8; 40], &o).unwrap();
        let addrs: Vec<u32> = bursts.iter().map(|b| b.address).collect();
        assert_eq!(addrs, vec![0x4000_0000, 0x4000_0010, 0x4000_0020]);
    }

    #[test]
    fn hole_drops_full_bursts_only() {
        let o = opts(16).with_hole(0x10, 0x30);
        let mut stream = BurstStream::new(&[0u8; 56][..], &o).unwrap();
        let addrs: Vec<u32> = stream.by_ref().map(|b| b.unwrap().address).collect();
        assert_eq!(addrs, vec![0x00, 0x30]);
        assert_eq!(stream.stats().bursts_suppressed, 2);
        assert_eq!(stream.stats().bursts_emitted, 2);
        assert_eq!(stream.stats().input_size, 56);
    }

    #[test]
    fn terminal_burst_ignores_hole() {
        let o = opts(16).with_hole(0x10, 0x20);
        let bursts = encode_all(&[0u8; 20], &o).unwrap();
        let addrs: Vec<u32> = bursts.iter().map(|b| b.address).collect();
        assert_eq!(addrs, vec![0x00, 0x10]);
        assert!(bursts[1].terminal);
    }

    #[test]
    fn no_end_marker() {
        let o = opts(16).with_end_marker(false);
        let bursts = encode_all(&[0x11; 20], &o).unwrap();
        assert_eq!(
            bursts[1].hex,
            format!("{}{}", "00".repeat(12), "11".repeat(4))
        );
        assert!(!bursts[0].terminal);
    }

    #[test]
    fn short_reads_are_reassembled() {
        let input: Vec<u8> = (0..100).map(|i| (i * 7) as u8).collect();
        let reader = Trickle {
            data: &input,
            chunk: 3,
            interrupt: false,
        };
        let trickled: Vec<_> = BurstStream::new(reader, &opts(16))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(trickled, encode_all(&input, &opts(16)).unwrap());
    }

    #[test]
    fn read_error_ends_stream() {
        let mut stream = BurstStream::new(Broken, &opts(16)).unwrap();
        assert!(matches!(stream.next(), Some(Err(ConvertError::Read(_)))));
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
    }

    #[test]
    fn invalid_config_rejected_before_reading() {
        let err = BurstStream::new(Broken, &opts(20)).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Config(ConfigError::BurstMisaligned { len: 20, .. })
        ));
    }

    #[test]
    fn stream_is_fused() {
        let mut stream = BurstStream::new(&[1u8; 3][..], &opts(16)).unwrap();
        assert!(stream.next().is_some());
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
        assert_eq!(stream.into_stats().bursts_emitted, 1);
    }

    #[test]
    fn debug_shows_address_layout() {
        let stream = BurstStream::new(
            &[0u8; 0][..],
            &opts(16).with_address_offset(0x40).with_hole(0x10, 0x20),
        )
        .unwrap();
        let dbg = format!("{stream:?}");
        assert!(dbg.contains("address_offset: 64"), "{dbg}");
        assert!(dbg.contains("hole: AddressHole { begin: 16, end: 32 }"), "{dbg}");
    }
}
