use std::path::PathBuf;

use libfigrep_api::FigmaClient;
use libfigrep_core::{
    config::DEFAULT_CONFIG_FILE, load_config, ArtifactWriter, FigrepError, ReportFormat, ReporterConfig, RowSink,
    RunSummary,
};
use tracing::info;

use crate::cli::Cli;

/// A finished report artifact and the run that produced it
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub format: ReportFormat,
    pub summary: RunSummary,
}

/// Resolved context for a figrep command
pub struct ReporterContext {
    pub config_path: PathBuf,
    pub config: ReporterConfig,
}

impl ReporterContext {
    /// Load the config and apply command-line overrides, without validating
    pub fn load(cli: &Cli) -> Result<Self, FigrepError> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = load_config(&config_path)?;

        if let Some(token) = cli.token.as_deref().filter(|t| !t.trim().is_empty()) {
            config.api.token = Some(token.to_string());
        }

        Ok(Self { config_path, config })
    }

    /// Load and validate; every defect is reported before any network call
    pub fn resolve(cli: &Cli) -> Result<Self, FigrepError> {
        let ctx = Self::load(cli)?;
        ctx.config.validate()?;
        for name in ctx.config.report.projector().unknown_fields() {
            tracing::warn!(field = name, "unknown field, column will be empty");
        }
        Ok(ctx)
    }

    pub fn client(&self) -> Result<FigmaClient, FigrepError> {
        Ok(FigmaClient::new(&self.config.api.base_url, self.config.token()?))
    }

    /// One full run over the configured files into `sink`
    pub fn run_report(&self, sink: &mut dyn RowSink) -> Result<RunSummary, FigrepError> {
        let client = self.client()?;
        let targets = self.config.targets();
        let summary = self.config.report.assembler().run(&client, &targets, sink)?;
        info!(
            files = summary.files_total,
            reported = summary.files_reported,
            skipped = summary.skipped.len(),
            rows = summary.rows,
            "report assembled"
        );
        Ok(summary)
    }

    /// One full run serialized as `format`
    pub fn build_artifact(&self, format: ReportFormat) -> Result<Artifact, FigrepError> {
        let report = &self.config.report;
        let mut writer = ArtifactWriter::new(format, report.delimiter, &report.sheet_name)?;
        let summary = self.run_report(&mut writer)?;
        Ok(Artifact {
            bytes: writer.finish()?,
            format,
            summary,
        })
    }
}

/// Turn skipped files into an error, for `--strict`
pub fn ensure_complete(summary: &RunSummary) -> Result<(), FigrepError> {
    match summary.skipped.first() {
        None => Ok(()),
        Some(first) => Err(FigrepError::Fetch {
            file_key: first.file_key.clone(),
            message: format!("{} ({} of {} files skipped)", first.reason, summary.skipped.len(), summary.files_total),
        }),
    }
}
