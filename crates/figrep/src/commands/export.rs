use libfigrep_core::{FigrepError, RowBuffer, RowSink, RunSummary, TableWriter};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::cli::{Cli, ExportFormat};
use crate::context::{ensure_complete, ReporterContext};
use crate::output::{emit, print_human, CommandOutput};

#[derive(Serialize)]
struct ExportOutput {
    format: String,
    output_path: String,
    bytes: usize,
    #[serde(flatten)]
    summary: RunSummary,
}

impl CommandOutput for ExportOutput {
    fn human(&self) -> String {
        let mut out = format!(
            "Wrote {} rows from {}/{} files to {} ({}, {} bytes)",
            self.summary.rows,
            self.summary.files_reported,
            self.summary.files_total,
            self.output_path,
            self.format,
            self.bytes
        );
        out.push_str(&skipped_lines(&self.summary));
        out
    }
}

#[derive(Serialize)]
struct PreviewOutput {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    #[serde(flatten)]
    summary: RunSummary,
}

impl CommandOutput for PreviewOutput {
    fn human(&self) -> String {
        let mut out = format!(
            "{} rows from {}/{} files",
            self.summary.rows, self.summary.files_reported, self.summary.files_total
        );
        out.push_str(&skipped_lines(&self.summary));
        out
    }
}

fn skipped_lines(summary: &RunSummary) -> String {
    summary
        .skipped
        .iter()
        .map(|s| format!("\n  skipped {}: {}", s.file_key, s.reason))
        .collect()
}

pub fn run(cli: &Cli, output: Option<PathBuf>, format: Option<ExportFormat>, strict: bool) -> Result<(), FigrepError> {
    let ctx = ReporterContext::resolve(cli)?;

    let artifact_format = match format {
        Some(f) => match f.artifact() {
            Some(artifact_format) => artifact_format,
            None => return preview(cli, &ctx, strict),
        },
        None => ctx.config.report.format,
    };

    let artifact = ctx.build_artifact(artifact_format)?;
    let output_path = output.unwrap_or_else(|| ctx.config.report.output.clone());
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output_path, &artifact.bytes)?;
    info!(path = %output_path.display(), bytes = artifact.bytes.len(), "report written");

    let result = ExportOutput {
        format: artifact.format.as_str().to_string(),
        output_path: output_path.to_string_lossy().to_string(),
        bytes: artifact.bytes.len(),
        summary: artifact.summary,
    };
    emit(cli, &result);

    if strict {
        ensure_complete(&result.summary)?;
    }
    Ok(())
}

/// Rows in a terminal table; with --json the rows go into the envelope instead
fn preview(cli: &Cli, ctx: &ReporterContext, strict: bool) -> Result<(), FigrepError> {
    let mut buffer = RowBuffer::default();
    let summary = ctx.run_report(&mut buffer)?;
    let header = buffer.header.unwrap_or_default();

    if !cli.json {
        let mut table = TableWriter::new();
        table.write_header(&header)?;
        for row in &buffer.rows {
            table.write_row(row)?;
        }
        print_human(cli, &table.render());
    }

    let result = PreviewOutput {
        header,
        rows: buffer.rows,
        summary,
    };
    emit(cli, &result);

    if strict {
        ensure_complete(&result.summary)?;
    }
    Ok(())
}
