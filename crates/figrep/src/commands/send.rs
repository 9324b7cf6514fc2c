use libfigrep_core::FigrepError;
use serde::Serialize;

use crate::cli::Cli;
use crate::context::{ensure_complete, ReporterContext};
use crate::mailer::send_report;
use crate::output::{emit, CommandOutput};

#[derive(Serialize)]
pub struct SendOutput {
    pub recipients: Vec<String>,
    pub attachment: String,
    pub bytes: usize,
    pub rows: usize,
    pub files_reported: usize,
    pub skipped: Vec<String>,
}

impl CommandOutput for SendOutput {
    fn human(&self) -> String {
        let mut out = format!(
            "Sent {} ({} rows, {} bytes) to {}",
            self.attachment,
            self.rows,
            self.bytes,
            self.recipients.join(", ")
        );
        if !self.skipped.is_empty() {
            out.push_str(&format!("\n  missing files: {}", self.skipped.join(", ")));
        }
        out
    }
}

pub fn run(cli: &Cli, strict: bool) -> Result<(), FigrepError> {
    let ctx = ReporterContext::resolve(cli)?;
    let result = deliver(&ctx, strict)?;
    emit(cli, &result);
    Ok(())
}

/// Build the configured artifact and mail it; with `strict`, nothing is sent
/// when a file had to be skipped
pub fn deliver(ctx: &ReporterContext, strict: bool) -> Result<SendOutput, FigrepError> {
    let email = ctx.config.email()?;
    let format = ctx.config.report.format;

    let artifact = ctx.build_artifact(format)?;
    if strict {
        ensure_complete(&artifact.summary)?;
    }
    send_report(email, &artifact)?;

    Ok(SendOutput {
        recipients: email.to.clone(),
        attachment: email.attachment_name(format),
        bytes: artifact.bytes.len(),
        rows: artifact.summary.rows,
        files_reported: artifact.summary.files_reported,
        skipped: artifact.summary.skipped.iter().map(|s| s.file_key.clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lists_missing_files() {
        let output = SendOutput {
            recipients: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            attachment: "figma_comments.csv".to_string(),
            bytes: 120,
            rows: 4,
            files_reported: 1,
            skipped: vec!["AAA".to_string()],
        };
        let text = output.human();
        assert!(text.starts_with("Sent figma_comments.csv (4 rows, 120 bytes) to a@example.com, b@example.com"));
        assert!(text.contains("missing files: AAA"));
    }
}
