//! Diagnostic logging setup.
//!
//! Logs go to stderr; stdout is reserved for command output. `RUST_LOG`
//! overrides the level chosen from the `-v`/`-q` flags.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "srag=info,scheme_rag=info,scheme_rag_core=warn";

/// Filter directive for the given verbosity flags.
pub fn filter_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "warn";
    }
    match verbose {
        0 => DEFAULT_FILTER,
        1 => "srag=debug,scheme_rag=debug,scheme_rag_core=debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(verbose: u8, quiet: bool) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(env) if !env.trim().is_empty() => EnvFilter::new(env),
        _ => EnvFilter::new(filter_directive(verbose, quiet)),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}
