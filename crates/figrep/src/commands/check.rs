//! Check command - config validation without network access

use chrono::Local;
use libfigrep_core::FigrepError;
use serde::Serialize;
use tracing::warn;

use crate::cli::Cli;
use crate::context::ReporterContext;
use crate::output::{emit, CommandOutput};
use crate::scheduler::{next_fire, parse_schedule};

#[derive(Serialize)]
struct CheckOutput {
    config: String,
    files: usize,
    mode: String,
    format: String,
    columns: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unknown_fields: Vec<String>,
    email: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_run: Option<String>,
}

impl CommandOutput for CheckOutput {
    fn human(&self) -> String {
        let mut lines = vec![
            format!("{}: ok", self.config),
            format!("  files:   {}", self.files),
            format!("  report:  {} mode, {}", self.mode, self.format),
            format!("  columns: {}", self.columns.join(", ")),
        ];
        if !self.unknown_fields.is_empty() {
            lines.push(format!("  unknown fields (empty columns): {}", self.unknown_fields.join(", ")));
        }
        lines.push(format!("  email:   {}", if self.email { "configured" } else { "not configured" }));
        if let Some(next) = &self.next_run {
            lines.push(format!("  next scheduled run: {}", next));
        }
        lines.join("\n")
    }
}

pub fn run(cli: &Cli) -> Result<(), FigrepError> {
    let ctx = ReporterContext::load(cli)?;
    let config = &ctx.config;

    let mut problems = config.problems();
    let mut next_run = None;
    if let Some(expr) = &config.schedule {
        match parse_schedule(expr) {
            Ok(schedule) => next_run = next_fire(&schedule, &Local::now()).map(|t| t.to_rfc3339()),
            Err(e) => problems.push(e.to_string()),
        }
    }
    if !problems.is_empty() {
        return Err(FigrepError::InvalidConfig(problems.join("; ")));
    }

    let projector = config.report.projector();
    let unknown_fields: Vec<String> = projector.unknown_fields().into_iter().map(str::to_string).collect();
    for name in &unknown_fields {
        warn!(field = %name, "unknown field, column will be empty");
    }

    emit(cli, &CheckOutput {
        config: ctx.config_path.to_string_lossy().to_string(),
        files: config.files.len(),
        mode: config.report.mode.as_str().to_string(),
        format: config.report.format.as_str().to_string(),
        columns: projector.header(),
        unknown_fields,
        email: config.email.is_some(),
        next_run,
    });
    Ok(())
}
