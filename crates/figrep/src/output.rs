//! Command results on stdout, errors on stderr
//!
//! With `--json` every command prints one envelope:
//! `{"schema_version":1,"ok":true,"data":{..}}` on success, or
//! `{"schema_version":1,"ok":false,"error":{..}}` on stderr when it fails.
//! Without it each result prints its own short summary.

use libfigrep_core::FigrepError;
use serde::Serialize;

use crate::cli::Cli;

const SCHEMA_VERSION: u32 = 1;

/// Result of a command: JSON-serializable with a terminal rendering
pub trait CommandOutput: Serialize {
    fn human(&self) -> String;
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: u32,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    exit_code: i32,
    message: String,
    /// File the failure belongs to, for fetch errors
    #[serde(skip_serializing_if = "Option::is_none")]
    file_key: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    suggestions: Vec<&'static str>,
}

impl ErrorBody {
    fn new(err: &FigrepError) -> Self {
        let file_key = match err {
            FigrepError::Fetch { file_key, .. } | FigrepError::TreeTooDeep { file_key, .. } => Some(file_key.clone()),
            _ => None,
        };
        Self {
            code: err.error_code(),
            exit_code: err.exit_code(),
            message: err.to_string(),
            file_key,
            suggestions: err.suggestions(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"schema_version\":{},\"ok\":false,\"error\":{{\"message\":\"{}\"}}}}", SCHEMA_VERSION, e))
}

/// Print a command result (nothing in quiet mode unless --json)
pub fn emit<T: CommandOutput>(cli: &Cli, output: &T) {
    if cli.json {
        println!(
            "{}",
            to_json(&Envelope {
                schema_version: SCHEMA_VERSION,
                ok: true,
                data: Some(output),
                error: None,
            })
        );
    } else if !cli.quiet {
        println!("{}", output.human());
    }
}

/// Print a failure to stderr
pub fn emit_error(cli: &Cli, err: &FigrepError) {
    let body = ErrorBody::new(err);
    if cli.json {
        let envelope: Envelope<'_, ()> = Envelope {
            schema_version: SCHEMA_VERSION,
            ok: false,
            data: None,
            error: Some(body),
        };
        eprintln!("{}", to_json(&envelope));
        return;
    }

    eprintln!("error: {}", body.message);
    if !body.suggestions.is_empty() {
        eprintln!();
        for suggestion in body.suggestions {
            eprintln!("hint: {}", suggestion);
        }
    }
}

/// Print free-form terminal output (ignored in quiet and JSON mode)
pub fn print_human(cli: &Cli, msg: &str) {
    if !cli.json && !cli.quiet {
        println!("{}", msg);
    }
}
