//! CLI module for cairndb
//!
//! Thin operator surface over the engine API. Every command opens the
//! engine, runs one operation and prints one JSON object:
//!
//! - `{"status":"ok","data":...}` on success
//! - `{"status":"error","code":...,"message":...}` with a non-zero exit

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{execute, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_json_arg, write_error, write_response};
