//! CLI command implementations
//!
//! Each invocation opens the engine (running recovery), executes one
//! command, closes the engine and prints one JSON object.

use std::path::PathBuf;

use serde_json::{json, Value as Json};

use crate::config::EngineConfig;
use crate::engine::{Engine, EngineError};
use crate::planner::Filter;
use crate::value::Document;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_json_arg, write_response};

/// Main CLI entry point
///
/// Parses arguments, runs the command and writes the success response.
/// Errors are returned for `main` to report.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let data = run_command(cli.config, cli.data_dir, &cli.command)?;
    write_response(data)
}

/// Resolves the configuration, opens the engine and executes `command`.
pub fn run_command(
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    command: &Command,
) -> CliResult<Json> {
    let config = resolve_config(config_path, data_dir)?;
    let mut engine = Engine::open(config)?;
    let data = execute(&mut engine, command)?;
    engine.close()?;
    Ok(data)
}

fn resolve_config(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> CliResult<EngineConfig> {
    let mut config = match config_path {
        Some(path) => EngineConfig::load(&path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = data_dir {
        config.data_dir = Some(dir);
    }
    if config.data_dir.is_none() {
        return Err(CliError::config_error(
            "no data directory: pass --data-dir or a --config file with data_dir",
        ));
    }
    config.validate()?;
    Ok(config)
}

/// Executes one command against an open engine and returns its `data`.
pub fn execute(engine: &mut Engine, command: &Command) -> CliResult<Json> {
    match command {
        Command::Insert { document } => insert(engine, document),
        Command::Find { filter, limit } => {
            let filter = parse_optional_filter(filter.as_deref())?;
            let (docs, _, _) = engine.query_with_stats(&filter, *limit)?;
            Ok(Json::Array(docs.iter().map(Document::to_json).collect()))
        }
        Command::Count { filter } => {
            let count = match filter {
                Some(text) => engine.count(Some(&parse_filter(text)?))?,
                None => engine.count(None)?,
            };
            Ok(json!({ "count": count }))
        }
        Command::Update { filter, patch, one } => {
            let filter = parse_filter(filter)?;
            let patch = parse_document("patch", patch)?;
            if *one {
                Ok(json!({ "updated": engine.update_one(&filter, &patch)? }))
            } else {
                Ok(json!({ "updated": engine.update(&filter, &patch)? }))
            }
        }
        Command::Delete { filter, one } => {
            let filter = parse_filter(filter)?;
            if *one {
                Ok(json!({ "deleted": engine.delete_one(&filter)? }))
            } else {
                Ok(json!({ "deleted": engine.delete(&filter)? }))
            }
        }
        Command::CreateIndex { field } => to_json(&engine.create_index(field)?),
        Command::DropIndex { field } => Ok(json!({ "dropped": engine.drop_index(field) })),
        Command::Indexes => to_json(&engine.index_info()),
        Command::Explain { filter } => {
            let plan = engine.explain(&parse_filter(filter)?)?;
            let mut data = to_json(&plan)?;
            if let Json::Object(map) = &mut data {
                map.insert("description".into(), Json::String(plan.describe()));
            }
            Ok(data)
        }
        Command::Stats => to_json(&engine.stats()),
        Command::Checkpoint => to_json(&engine.checkpoint()?),
        Command::Save { path } => to_json(&engine.save_to_file(path)?),
        Command::Load { path } => Ok(json!({ "loaded": engine.load_from_file(path)? })),
    }
}

fn insert(engine: &mut Engine, text: &str) -> CliResult<Json> {
    match read_json_arg("document", text)? {
        Json::Array(items) => {
            let docs = items
                .into_iter()
                .map(|item| {
                    Document::from_json(item)
                        .map_err(|e| CliError::invalid_argument(format!("document: {}", e)))
                })
                .collect::<CliResult<Vec<_>>>()?;

            let results = engine
                .insert_many(docs)
                .into_iter()
                .map(|result| match result {
                    Ok(doc) => doc.to_json(),
                    Err(e) => json!({ "error": { "code": e.code(), "message": e.to_string() } }),
                })
                .collect();
            Ok(Json::Array(results))
        }
        other => {
            let doc = Document::from_json(other)
                .map_err(|e| CliError::invalid_argument(format!("document: {}", e)))?;
            Ok(engine.insert(doc)?.to_json())
        }
    }
}

fn parse_filter(text: &str) -> CliResult<Filter> {
    let json = read_json_arg("filter", text)?;
    Ok(Filter::from_json(&json).map_err(EngineError::from)?)
}

fn parse_optional_filter(text: Option<&str>) -> CliResult<Filter> {
    match text {
        Some(text) => parse_filter(text),
        None => Ok(Filter::all()),
    }
}

fn parse_document(what: &str, text: &str) -> CliResult<Document> {
    Document::from_json(read_json_arg(what, text)?)
        .map_err(|e| CliError::invalid_argument(format!("{}: {}", what, e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> CliResult<Json> {
    Ok(serde_json::to_value(value)?)
}
