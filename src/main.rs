fn main() {
    #[cfg(feature = "cli")]
    bin2fpgadata::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("bin2fpgadata: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
