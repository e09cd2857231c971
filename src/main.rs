//! cairndb CLI entry point
//!
//! Installs the log subscriber (stderr, filtered by `CAIRNDB_LOG`, default
//! `warn`) and delegates everything else to the CLI module. Errors are
//! written to stdout as a JSON error object and exit non-zero.

use cairndb::cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn setup_logging() {
    let filter = EnvFilter::try_from_env("CAIRNDB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

fn main() {
    setup_logging();

    if let Err(e) = cli::run() {
        if cli::write_error(e.code_str(), e.message()).is_err() {
            eprintln!("{}", e);
        }
        std::process::exit(1);
    }
}
