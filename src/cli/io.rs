//! JSON I/O handling for CLI
//!
//! - Arguments: JSON text, or `-` to read it from stdin
//! - Output: a single JSON object on stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Parses a JSON argument, reading stdin when the argument is `-`.
pub fn read_json_arg(what: &str, arg: &str) -> CliResult<Value> {
    let text = if arg == "-" {
        let mut buf = String::new();
        io::stdin().lock().read_to_string(&mut buf)?;
        buf
    } else {
        arg.to_string()
    };

    if text.trim().is_empty() {
        return Err(CliError::invalid_argument(format!("{} is empty", what)));
    }
    serde_json::from_str(&text)
        .map_err(|e| CliError::invalid_argument(format!("{} is not valid JSON: {}", what, e)))
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_line(&response)
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    write_line(&response)
}

fn write_line(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_json_arg() {
        assert_eq!(read_json_arg("filter", r#"{"a": 1}"#).unwrap(), serde_json::json!({"a": 1}));

        let err = read_json_arg("filter", "{a: 1}").unwrap_err();
        assert_eq!(err.code_str(), "CAIRN_CLI_INVALID_ARGUMENT");
        assert!(read_json_arg("patch", "   ").is_err());
    }
}
