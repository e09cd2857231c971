//! CLI argument definitions using clap
//!
//! Commands:
//! - cairndb insert <json>
//! - cairndb find [<filter>] [--limit N]
//! - cairndb count [<filter>]
//! - cairndb update <filter> <patch> [--one]
//! - cairndb delete <filter> [--one]
//! - cairndb create-index <field> / drop-index <field> / indexes
//! - cairndb explain <filter>
//! - cairndb stats / checkpoint
//! - cairndb save <path> / load <path>
//!
//! JSON arguments may be `-` to read them from stdin.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cairndb - An embedded, durable document store
#[derive(Parser, Debug)]
#[command(name = "cairndb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory (overrides the configuration file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Insert a document, or each document of a JSON array
    Insert {
        /// Document JSON
        document: String,
    },

    /// Print matching documents
    Find {
        /// Filter JSON (default: match everything)
        filter: Option<String>,

        /// Maximum number of documents to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Count matching documents
    Count {
        /// Filter JSON (default: the whole collection)
        filter: Option<String>,
    },

    /// Merge a patch into matching documents
    Update {
        filter: String,
        patch: String,

        /// Update only the first match
        #[arg(long)]
        one: bool,
    },

    /// Delete matching documents
    Delete {
        filter: String,

        /// Delete only the first match
        #[arg(long)]
        one: bool,
    },

    /// Create (or rebuild) an index on a field path
    CreateIndex { field: String },

    /// Drop an index
    DropIndex { field: String },

    /// List indexes
    Indexes,

    /// Show the plan chosen for a filter without running it
    Explain { filter: String },

    /// Print engine statistics
    Stats,

    /// Write a snapshot and truncate the WAL
    Checkpoint,

    /// Save all documents to a snapshot file
    Save { path: PathBuf },

    /// Replace all documents with a snapshot file's contents
    Load { path: PathBuf },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update() {
        let cli = Cli::try_parse_from([
            "cairndb",
            "--data-dir",
            "/tmp/db",
            "update",
            r#"{"age": {"$gt": 25}}"#,
            r#"{"status": "senior"}"#,
            "--one",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/db")));
        assert_eq!(
            cli.command,
            Command::Update {
                filter: r#"{"age": {"$gt": 25}}"#.into(),
                patch: r#"{"status": "senior"}"#.into(),
                one: true,
            }
        );
    }

    #[test]
    fn test_parse_global_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["cairndb", "find", "--config", "db.json", "--limit", "2"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("db.json")));
        assert_eq!(
            cli.command,
            Command::Find {
                filter: None,
                limit: Some(2)
            }
        );
    }

    #[test]
    fn test_create_index_name() {
        let cli = Cli::try_parse_from(["cairndb", "create-index", "address.city"]).unwrap();
        assert_eq!(
            cli.command,
            Command::CreateIndex {
                field: "address.city".into()
            }
        );
    }
}
