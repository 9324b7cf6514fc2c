use clap::{Parser, Subcommand, ValueEnum};
use libfigrep_core::ReportFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "figrep", about = "Figma comment reports", version)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress human-readable output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Config file (default: figrep.toml in the working directory)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Personal access token, overrides api.token
    #[arg(long, global = true, env = "FIGMA_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the report once and write it to disk
    Export {
        /// Output path, overrides report.output
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Output format, overrides report.format
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Fail if any file had to be skipped
        #[arg(long)]
        strict: bool,
    },

    /// Build the report once and mail it
    Send {
        /// Fail (and send nothing) if any file had to be skipped
        #[arg(long)]
        strict: bool,
    },

    /// Build and mail the report on the configured cron schedule
    Schedule {
        /// Run once immediately and exit
        #[arg(long)]
        once: bool,
    },

    /// Validate the config without contacting any server
    Check,

    /// List the field names usable in report.fields
    Fields,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    /// Print a table to the terminal instead of writing a file
    Table,
}

impl ExportFormat {
    /// Artifact format, or None for the terminal preview
    pub fn artifact(self) -> Option<ReportFormat> {
        match self {
            ExportFormat::Csv => Some(ReportFormat::Csv),
            ExportFormat::Xlsx => Some(ReportFormat::Xlsx),
            ExportFormat::Table => None,
        }
    }
}
