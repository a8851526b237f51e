// Transcript and script rendering.
//
// Each emitted burst becomes:
//   - two transcript lines: `<address-hex>\n<burst-hex>\n`
//   - optionally one script line: a `create_hw_axi_txn` write command
//
// Addresses are lowercase hex without prefix or zero-padding.

use std::io::{self, Read, Write};

use crate::codec::EncodedBurst;
use crate::config::ConvertOptions;
use crate::stream::{BurstStream, ConvertError, ConvertStats};

/// Fixed `-len` argument of every script command.
pub const SCRIPT_TXN_LEN: u32 = 256;

/// Fixed `-size` argument of every script command.
pub const SCRIPT_TXN_SIZE: u32 = 32;

// ---------------------------------------------------------------------------
// Sink trait
// ---------------------------------------------------------------------------

/// Destination for encoded bursts.
pub trait BurstSink {
    /// Underlying writer handed back by [`BurstSink::finish`].
    type Inner;

    /// Render one burst.
    fn emit(&mut self, burst: &EncodedBurst) -> io::Result<()>;

    /// Flush and release the sink.
    fn finish(self) -> io::Result<Self::Inner>;
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Writes `<address>\n<hex>\n` per burst.
#[derive(Debug)]
pub struct TranscriptWriter<W: Write> {
    out: W,
}

impl<W: Write> TranscriptWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> BurstSink for TranscriptWriter<W> {
    type Inner = W;

    fn emit(&mut self, burst: &EncodedBurst) -> io::Result<()> {
        writeln!(self.out, "{:x}", burst.address)?;
        writeln!(self.out, "{}", burst.hex)
    }

    fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// Writes one AXI write-transaction command per burst.
#[derive(Debug)]
pub struct ScriptWriter<W: Write> {
    out: W,
}

impl<W: Write> ScriptWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> BurstSink for ScriptWriter<W> {
    type Inner = W;

    fn emit(&mut self, burst: &EncodedBurst) -> io::Result<()> {
        writeln!(
            self.out,
            "create_hw_axi_txn wr_txn [get_hw_axis hw_axi_1] -address {:x} -data {} \
             -len {SCRIPT_TXN_LEN} -burst INCR -size {SCRIPT_TXN_SIZE} -type write",
            burst.address, burst.hex
        )
    }

    fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

// ---------------------------------------------------------------------------
// Driver glue
// ---------------------------------------------------------------------------

/// Convert `input` into `transcript`, and into `script` when `opts.script` is
/// set.
///
/// A script sink passed with `opts.script` unset is dropped untouched. The
/// script sink is finished right after the terminal burst, before the
/// transcript sink.
pub fn convert<R, T, S>(
    input: R,
    transcript: T,
    script: Option<S>,
    opts: &ConvertOptions,
) -> Result<ConvertStats, ConvertError>
where
    R: Read,
    T: BurstSink,
    S: BurstSink,
{
    let mut stream = BurstStream::new(input, opts)?;
    let mut transcript = transcript;
    let mut script = script.filter(|_| opts.script);

    for burst in stream.by_ref() {
        let burst = burst?;
        transcript
            .emit(&burst)
            .map_err(ConvertError::WriteTranscript)?;
        if let Some(sink) = script.as_mut() {
            sink.emit(&burst).map_err(ConvertError::WriteScript)?;
        }
    }

    if let Some(sink) = script {
        sink.finish().map_err(ConvertError::WriteScript)?;
        log::debug!("script finished");
    }
    transcript.finish().map_err(ConvertError::WriteTranscript)?;

    Ok(stream.into_stats())
}

/// In-memory conversion. Returns the transcript and, when `opts.script` is
/// set, the script text.
pub fn convert_to_strings(
    input: &[u8],
    opts: &ConvertOptions,
) -> Result<(String, Option<String>, ConvertStats), ConvertError> {
    let script = opts.script.then(|| ScriptWriter::new(Vec::new()));
    let mut transcript_buf = Vec::new();
    let mut script_buf = None;

    let stats = {
        let transcript = TranscriptWriter::new(&mut transcript_buf);
        let script = script.map(|w| CaptureScript {
            inner: w,
            slot: &mut script_buf,
        });
        convert(input, transcript, script, opts)?
    };

    Ok((
        into_text(transcript_buf),
        script_buf.map(into_text),
        stats,
    ))
}

/// Script sink that parks its finished buffer in `slot`.
struct CaptureScript<'a> {
    inner: ScriptWriter<Vec<u8>>,
    slot: &'a mut Option<Vec<u8>>,
}

impl BurstSink for CaptureScript<'_> {
    type Inner = ();

    fn emit(&mut self, burst: &EncodedBurst) -> io::Result<()> {
        self.inner.emit(burst)
    }

    fn finish(self) -> io::Result<()> {
        *self.slot = Some(self.inner.finish()?);
        Ok(())
    }
}

fn into_text(buf: Vec<u8>) -> String {
    // Sinks only ever write ASCII.
    String::from_utf8_lossy(&buf).into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
