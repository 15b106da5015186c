//! Line-delimited JSON scoring server (`podium serve`).
//!
//! Each input line is one request object:
//!
//! ```json
//! {"id": "intro-1", "transcript": "Hello everyone...", "durationSeconds": 42.5}
//! ```
//!
//! and produces exactly one output line, either `{"id", "report"}` or
//! `{"id", "error": {"kind", "message"}}`. `id` is echoed back verbatim when present.
//! The engine, and with it the rubric, is shared read-only by every request.

use crate::analyzer::RubricEngine;
use crate::{ScoreRequest, ScoringError};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

/// Error categories reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// The line was not valid JSON
    InvalidJson,
    /// The request was JSON but not a valid scoring request
    InvalidInput,
    /// The rubric was rejected
    InvalidRubric,
}

/// Counters for one server session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeStats {
    pub requests: usize,
    pub errors: usize,
}

/// Handle a single request line and return the response object.
/// Extracted from [`serve`] for testability.
pub fn handle_request(engine: &RubricEngine, line: &str) -> Value {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return error_response(None, ErrorKind::InvalidJson, e.to_string()),
    };
    let id = value.get("id").cloned();

    let request = match ScoreRequest::from_json(&value) {
        Ok(r) => r,
        Err(e) => return error_response(id, ErrorKind::InvalidInput, e.to_string()),
    };

    match engine.score(&request) {
        Ok(report) => {
            let mut response = serde_json::Map::new();
            if let Some(id) = id {
                response.insert("id".to_string(), id);
            }
            match serde_json::to_value(&report) {
                Ok(report) => {
                    response.insert("report".to_string(), report);
                    Value::Object(response)
                }
                Err(e) => error_response(
                    response.remove("id"),
                    ErrorKind::InvalidInput,
                    e.to_string(),
                ),
            }
        }
        Err(ScoringError::Input(e)) => error_response(id, ErrorKind::InvalidInput, e.to_string()),
        Err(ScoringError::Config(e)) => {
            error_response(id, ErrorKind::InvalidRubric, e.to_string())
        }
    }
}

fn error_response(id: Option<Value>, kind: ErrorKind, message: String) -> Value {
    let error = json!({ "kind": kind, "message": message });
    match id {
        Some(id) => json!({ "id": id, "error": error }),
        None => json!({ "error": error }),
    }
}

/// Read requests from `reader` until EOF, writing one response line per request.
/// Blank lines are ignored.
pub fn serve<R: BufRead, W: Write>(
    engine: &RubricEngine,
    reader: R,
    mut writer: W,
) -> io::Result<ServeStats> {
    let mut stats = ServeStats::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_request(engine, &line);
        stats.requests += 1;
        if response.get("error").is_some() {
            stats.errors += 1;
            tracing::debug!(response = %response, "request rejected");
        }

        writeln!(writer, "{}", response)?;
        writer.flush()?;
    }

    tracing::debug!(requests = stats.requests, errors = stats.errors, "server stopped");
    Ok(stats)
}

/// Serve on stdin/stdout
pub fn run_server(engine: &RubricEngine) -> io::Result<ServeStats> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(engine, stdin.lock(), stdout.lock())
}
