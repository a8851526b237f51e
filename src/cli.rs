// Command-line front end for bin2fpgadata.
//
// Resolves arguments into a `ConvertOptions` plus file paths, sets up
// logging, runs `io::convert_file`, and maps the outcome to an exit code.

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, ValueHint};

use crate::config::{ConvertOptions, DEFAULT_BURST_LENGTH, DEFAULT_OUTPUT, DEFAULT_SCRIPT};
use crate::io::{self, FileStats};

// ---------------------------------------------------------------------------
// Number parsing (decimal, 0x hex, K suffix)
// ---------------------------------------------------------------------------

fn parse_u64(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty number".into());
    }
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{s}': {e}"))
}

fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') if !s.starts_with("0x") && !s.starts_with("0X") => {
            (&s[..s.len() - 1], 1024u64)
        }
        _ => (s, 1u64),
    };
    parse_u64(num_part)?
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

fn parse_address(s: &str) -> Result<u32, String> {
    let value = parse_u64(s)?;
    u32::try_from(value).map_err(|_| format!("address '{s}' does not fit in 32 bits"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Convert a binary file into FPGA burst data text.
#[derive(Parser, Debug)]
#[command(
    name = "bin2fpgadata",
    version,
    about = "Convert a binary file into burst-chunked FPGA data text",
    arg_required_else_help = true
)]
struct Cli {
    /// Input binary file.
    #[arg(short = 'i', long = "in", value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output data text file.
    #[arg(short = 'o', long = "out", value_hint = ValueHint::FilePath, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Burst length in bytes (multiple of 16, at most 1024; supports 0x and K).
    #[arg(short = 'b', long = "burst", value_parser = parse_byte_size, default_value_t = DEFAULT_BURST_LENGTH as u64)]
    burst: u64,

    /// Disable the end-of-file char 0a.
    #[arg(long = "noeof")]
    no_eof: bool,

    /// Generate a write-transaction tcl script.
    #[arg(long)]
    tcl: bool,

    /// Path of the generated tcl script.
    #[arg(long = "tcl-out", value_hint = ValueHint::FilePath, default_value = DEFAULT_SCRIPT)]
    tcl_out: PathBuf,

    /// Address offset added to every burst.
    #[arg(long, value_parser = parse_address, default_value_t = 0)]
    offset: u32,

    /// Address hole begin (inclusive).
    #[arg(long = "hole-begin", value_parser = parse_address, default_value_t = 0)]
    hole_begin: u32,

    /// Address hole end (exclusive).
    #[arg(long = "hole-end", value_parser = parse_address, default_value_t = 0)]
    hole_end: u32,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json")]
    json_output: bool,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    input_file: PathBuf,
    output_file: PathBuf,
    script_file: Option<PathBuf>,
    convert: ConvertOptions,
    quiet: bool,
    verbose: u8,
    json_output: bool,
}

fn resolve_options(cli: Cli) -> Options {
    // Out-of-range values are left for `ConvertOptions::validate` to reject.
    let burst_length = usize::try_from(cli.burst).unwrap_or(usize::MAX);
    let convert = ConvertOptions::default()
        .with_burst_length(burst_length)
        .with_address_offset(cli.offset)
        .with_hole(cli.hole_begin, cli.hole_end)
        .with_end_marker(!cli.no_eof)
        .with_script(cli.tcl);

    Options {
        input_file: cli.input,
        output_file: cli.output,
        script_file: cli.tcl.then_some(cli.tcl_out),
        convert,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
    }
}

fn log_filter(opts: &Options) -> &'static str {
    match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("bin2fpgadata".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let opts = resolve_options(cli);
        let _ = opts.convert.validate();
    }
}

// ---------------------------------------------------------------------------
// Convert command
// ---------------------------------------------------------------------------

#[cfg(feature = "file-io")]
fn digest_hex(digest: &[u8; 32]) -> String {
    digest
        .iter()
        .flat_map(|&b| crate::codec::hex::byte_to_hex(b))
        .map(char::from)
        .collect()
}

fn stats_json(opts: &Options, stats: &FileStats) -> serde_json::Value {
    let mut json = serde_json::json!({
        "input": opts.input_file.display().to_string(),
        "output": opts.output_file.display().to_string(),
        "burst_length": stats.convert.burst_length,
        "input_size": stats.convert.input_size,
        "bursts_emitted": stats.convert.bursts_emitted,
        "bursts_suppressed": stats.convert.bursts_suppressed,
        "end_marker": stats.convert.end_marker,
        "transcript_size": stats.transcript_size,
        "script": opts.script_file.as_ref().map(|p| p.display().to_string()),
        "script_size": stats.script_size,
    });
    #[cfg(feature = "file-io")]
    {
        if let Some(digest) = &stats.input_sha256 {
            json["input_sha256"] = serde_json::Value::String(digest_hex(digest));
        }
    }
    json
}

fn cmd_convert(opts: &Options) -> i32 {
    if !opts.quiet {
        eprintln!("Convert binary file to fpga data txt:");
        eprintln!("input file: {}", opts.input_file.display());
        eprintln!("output file: {}", opts.output_file.display());
        eprintln!("data burst length: {}", opts.convert.burst_length);
        let hole = opts.convert.hole;
        if opts.convert.address_offset > 0 {
            eprintln!("add offset {:#x} to all addresses", opts.convert.address_offset);
        }
        if hole.is_active() {
            eprintln!("add address hole [{:#x} - {:#x})", hole.begin, hole.end);
        }
        if opts.convert.end_marker {
            eprintln!("add eof char: '0a'");
        }
    }

    let stats = match io::convert_file(
        &opts.input_file,
        &opts.output_file,
        opts.script_file.as_deref(),
        &opts.convert,
    ) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("bin2fpgadata: {e}");
            return 1;
        }
    };

    if !opts.quiet {
        eprintln!("input size: {}", stats.convert.input_size);
        if let Some(path) = &opts.script_file {
            eprintln!("tcl script generated: {}", path.display());
        }
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "bin2fpgadata: bursts emitted: {}, suppressed: {}, transcript size: {}",
            stats.convert.bursts_emitted, stats.convert.bursts_suppressed, stats.transcript_size
        );
    }

    if opts.json_output {
        let json = stats_json(opts, &stats);
        match serde_json::to_string_pretty(&json) {
            Ok(text) => eprintln!("{text}"),
            Err(e) => {
                eprintln!("bin2fpgadata: json: {e}");
                return 1;
            }
        }
    }

    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap and runs the conversion.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(&opts)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Reject bad burst lengths before any file is opened.
    if let Err(e) = opts.convert.validate() {
        eprintln!("bin2fpgadata: -b: {e}");
        process::exit(1);
    }

    process::exit(cmd_convert(&opts));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::AddressHole;

    fn parse_opts(args: &[&str]) -> Options {
        let argv: Vec<String> = std::iter::once("bin2fpgadata".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        let cli = Cli::try_parse_from(argv).expect("cli parse failed");
        resolve_options(cli)
    }

    #[test]
    fn parse_numbers() {
        assert_eq!(parse_u64("16").unwrap(), 16);
        assert_eq!(parse_u64("0x400").unwrap(), 1024);
        assert_eq!(parse_u64("0XfF").unwrap(), 255);
        assert!(parse_u64("").is_err());
        assert!(parse_u64("0xzz").is_err());
    }

    #[test]
    fn parse_byte_size_suffixes() {
        assert_eq!(parse_byte_size("1K").unwrap(), 1024);
        assert_eq!(parse_byte_size("512").unwrap(), 512);
        assert_eq!(parse_byte_size("0x100").unwrap(), 256);
        assert!(parse_byte_size("k").is_err());
    }

    #[test]
    fn parse_address_range() {
        assert_eq!(parse_address("0xffffffff").unwrap(), u32::MAX);
        assert!(parse_address("0x100000000").is_err());
    }

    #[test]
    fn defaults() {
        let opts = parse_opts(&["-i", "image.bin"]);
        assert_eq!(opts.input_file, PathBuf::from("image.bin"));
        assert_eq!(opts.output_file, PathBuf::from("data.txt"));
        assert_eq!(opts.script_file, None);
        assert_eq!(opts.convert, ConvertOptions::default());
        assert!(!opts.quiet);
        assert_eq!(opts.verbose, 0);
    }

    #[test]
    fn all_flags_map() {
        let opts = parse_opts(&[
            "--in",
            "image.bin",
            "--out",
            "out.txt",
            "--burst",
            "256",
            "--noeof",
            "--tcl",
            "--offset",
            "0x80000000",
            "--hole-begin",
            "0x80000100",
            "--hole-end",
            "0x80000200",
        ]);
        assert_eq!(opts.output_file, PathBuf::from("out.txt"));
        assert_eq!(opts.script_file, Some(PathBuf::from("data.tcl")));
        assert_eq!(opts.convert.burst_length, 256);
        assert!(!opts.convert.end_marker);
        assert!(opts.convert.script);
        assert_eq!(opts.convert.address_offset, 0x8000_0000);
        assert_eq!(
            opts.convert.hole,
            AddressHole::new(0x8000_0100, 0x8000_0200)
        );
    }

    #[test]
    fn tcl_out_only_used_with_tcl() {
        let without = parse_opts(&["-i", "a", "--tcl-out", "x.tcl"]);
        assert_eq!(without.script_file, None);
        let with = parse_opts(&["-i", "a", "--tcl", "--tcl-out", "x.tcl"]);
        assert_eq!(with.script_file, Some(PathBuf::from("x.tcl")));
    }

    #[test]
    fn invalid_burst_survives_parsing() {
        let opts = parse_opts(&["-i", "a", "-b", "2K"]);
        assert_eq!(opts.convert.burst_length, 2048);
        assert!(opts.convert.validate().is_err());
    }

    #[test]
    fn input_is_required() {
        let argv = ["bin2fpgadata", "-o", "out.txt"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn verbose_is_capped() {
        let opts = parse_opts(&["-vvv", "-i", "a"]);
        assert_eq!(opts.verbose, 2);
        assert_eq!(log_filter(&opts), "debug");
    }

    #[test]
    fn quiet_filters_to_errors() {
        let opts = parse_opts(&["-q", "-i", "a"]);
        assert_eq!(log_filter(&opts), "error");
        assert_eq!(log_filter(&parse_opts(&["-i", "a"])), "warn");
        assert_eq!(log_filter(&parse_opts(&["-v", "-i", "a"])), "info");
    }

    #[test]
    fn fuzz_parse_never_panics_on_garbage() {
        fuzz_try_parse_args(&["--burst".to_string(), "0x".to_string()]);
        fuzz_try_parse_args(&["-i".to_string()]);
    }

    #[cfg(feature = "file-io")]
    #[test]
    fn digest_is_lowercase_hex() {
        let mut digest = [0u8; 32];
        digest[0] = 0xab;
        digest[31] = 0x0c;
        let hex = digest_hex(&digest);
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("ab"));
        assert!(hex.ends_with("0c"));
    }
}
