//! JSON output for CLI commands
//!
//! - One JSON object per line
//! - UTF-8 only

use std::io::Write;

use serde_json::Value;

use super::errors::CliResult;

/// Write a success response
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_json(out, &response)
}

/// Write an error response
pub fn write_error<W: Write>(out: &mut W, code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    write_json(out, &response)
}

/// Write a single JSON value followed by a newline
pub fn write_json<W: Write>(out: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliError;

    #[test]
    fn test_write_error_carries_code_and_message() {
        let err = CliError::config_error("journal_path must not be empty");
        let mut out = Vec::new();
        write_error(&mut out, err.code_str(), err.message()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        let value: Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], "REPLAY_CLI_CONFIG_ERROR");
        assert_eq!(value["message"], "journal_path must not be empty");
    }

    #[test]
    fn test_write_response_wraps_data() {
        let mut out = Vec::new();
        write_response(&mut out, serde_json::json!({ "records": 3 })).unwrap();

        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["data"]["records"], 3);
    }
}
