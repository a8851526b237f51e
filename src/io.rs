// File-level conversion helper.
//
// Provides `convert_file()`, which opens the input image, the transcript and
// (optionally) the script with buffered I/O, runs the stream driver, and
// reports sizes. Each stream fails with its own error variant. Optionally
// computes a streaming SHA-256 of the input (feature-gated behind `file-io`).

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[cfg(feature = "file-io")]
use sha2::Digest;
#[cfg(feature = "file-io")]
use std::io::Read;

use thiserror::Error;

use crate::codec::{AddressMapper, EncodedBurst};
use crate::config::{ConvertOptions, DEFAULT_SCRIPT};
use crate::stream::{ConvertError, ConvertStats};
use crate::transcript::{self, BurstSink, ScriptWriter, TranscriptWriter};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `convert_file()`.
#[derive(Debug, Clone)]
pub struct FileStats {
    /// Counters from the stream driver.
    pub convert: ConvertStats,
    /// Transcript file size in bytes.
    pub transcript_size: u64,
    /// Script file size in bytes, if a script was written.
    pub script_size: Option<u64>,
    /// SHA-256 of the input image (if `file-io` feature is enabled).
    pub input_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file conversion.
#[derive(Debug, Error)]
pub enum IoError {
    /// Input image could not be opened.
    #[error("invalid input file {}: {source}", path.display())]
    OpenInput { path: PathBuf, source: io::Error },

    /// Transcript could not be created.
    #[error("invalid output file {}: {source}", path.display())]
    CreateOutput { path: PathBuf, source: io::Error },

    /// Script could not be created.
    #[error("invalid script file {}: {source}", path.display())]
    CreateScript { path: PathBuf, source: io::Error },

    /// Conversion failed after the files were opened.
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

// ---------------------------------------------------------------------------
// Default buffer size
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// convert_file
// ---------------------------------------------------------------------------

/// Convert `input_path` into a transcript at `output_path`.
///
/// A script is written only when `opts.script` is set, to `script_path` or
/// to [`DEFAULT_SCRIPT`] when no path is given.
///
/// The configuration is validated before any file is touched, so a
/// configuration error never leaves a truncated output behind.
pub fn convert_file(
    input_path: &Path,
    output_path: &Path,
    script_path: Option<&Path>,
    opts: &ConvertOptions,
) -> Result<FileStats, IoError> {
    opts.validate().map_err(ConvertError::from)?;

    let input_file = File::open(input_path).map_err(|source| IoError::OpenInput {
        path: input_path.to_path_buf(),
        source,
    })?;
    let input_size = input_file
        .metadata()
        .map_err(|source| IoError::OpenInput {
            path: input_path.to_path_buf(),
            source,
        })?
        .len();

    let output_file = File::create(output_path).map_err(|source| IoError::CreateOutput {
        path: output_path.to_path_buf(),
        source,
    })?;

    let script_path = opts
        .script
        .then(|| script_path.unwrap_or(Path::new(DEFAULT_SCRIPT)));
    let script_file = script_path
        .map(|path| {
            File::create(path).map_err(|source| IoError::CreateScript {
                path: path.to_path_buf(),
                source,
            })
        })
        .transpose()?;

    if !AddressMapper::new(opts.address_offset, opts.hole).fits(input_size) {
        log::warn!(
            "offset {:#x} + input size {input_size} exceeds 32 bits; addresses will wrap",
            opts.address_offset
        );
    }

    let reader = BufReader::with_capacity(BUF_SIZE, input_file);

    #[cfg(feature = "file-io")]
    let mut input_hasher = sha2::Sha256::new();

    #[cfg(feature = "file-io")]
    let reader = HashingReader {
        inner: reader,
        hasher: &mut input_hasher,
    };

    let transcript_sink = TranscriptWriter::new(BufWriter::with_capacity(BUF_SIZE, output_file));
    let script_sink = script_file.map(|f| ScriptWriter::new(BufWriter::with_capacity(BUF_SIZE, f)));
    let convert = transcript::convert(
        reader,
        TrackedSink(transcript_sink),
        script_sink.map(TrackedSink),
        opts,
    )?;

    #[cfg(feature = "file-io")]
    let input_sha256 = Some(input_hasher.finalize().into());
    #[cfg(not(feature = "file-io"))]
    let input_sha256: Option<[u8; 32]> = None;

    let transcript_size = file_size(output_path).map_err(ConvertError::WriteTranscript)?;
    let script_size = script_path
        .map(file_size)
        .transpose()
        .map_err(ConvertError::WriteScript)?;

    Ok(FileStats {
        convert,
        transcript_size,
        script_size,
        input_sha256,
    })
}

fn file_size(path: &Path) -> io::Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}

/// Unwraps the `BufWriter` on finish so a failed final flush is reported.
struct TrackedSink<S>(S);

impl<S> BurstSink for TrackedSink<S>
where
    S: BurstSink<Inner = BufWriter<File>>,
{
    type Inner = File;

    fn emit(&mut self, burst: &EncodedBurst) -> io::Result<()> {
        self.0.emit(burst)
    }

    fn finish(self) -> io::Result<File> {
        self.0.finish()?.into_inner().map_err(|e| e.into_error())
    }
}

// ---------------------------------------------------------------------------
// Hashing reader (used with file-io feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "file-io")]
struct HashingReader<'a, R: Read> {
    inner: R,
    hasher: &'a mut sha2::Sha256,
}

#[cfg(feature = "file-io")]
impl<R: Read> Read for HashingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
