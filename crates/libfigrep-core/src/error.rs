use thiserror::Error;

/// Main error type for figrep operations
#[derive(Debug, Error)]
pub enum FigrepError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("fetch failed for file {file_key}: {message}")]
    Fetch { file_key: String, message: String },

    #[error("node tree of file {file_key} exceeds max depth {limit}")]
    TreeTooDeep { file_key: String, limit: usize },

    #[error("export error: {0}")]
    Export(String),

    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("schedule error: {0}")]
    Schedule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl FigrepError {
    /// Get the error code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            FigrepError::InvalidConfig(_) => "invalid_config",
            FigrepError::InvalidArgs(_) => "invalid_args",
            FigrepError::NotFound(_) => "not_found",
            FigrepError::Fetch { .. } => "fetch_failed",
            FigrepError::TreeTooDeep { .. } => "tree_too_deep",
            FigrepError::Export(_) => "export_error",
            FigrepError::Delivery(_) => "delivery_error",
            FigrepError::Schedule(_) => "invalid_config",
            FigrepError::Io(_) => "io_error",
            FigrepError::TomlParse(_) => "invalid_config",
            FigrepError::Csv(_) => "export_error",
            FigrepError::Xlsx(_) => "export_error",
            FigrepError::Internal(_) => "internal_error",
        }
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            FigrepError::InvalidConfig(_) => 2,
            FigrepError::InvalidArgs(_) => 2,
            FigrepError::Schedule(_) => 2,
            FigrepError::TomlParse(_) => 2,
            FigrepError::NotFound(_) => 3,
            FigrepError::Fetch { .. } => 4,
            FigrepError::TreeTooDeep { .. } => 4,
            FigrepError::Io(_) => 5,
            FigrepError::Csv(_) => 5,
            FigrepError::Xlsx(_) => 5,
            FigrepError::Export(_) => 5,
            FigrepError::Delivery(_) => 6,
            _ => 1,
        }
    }

    /// Get actionable suggestions for fixing the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            FigrepError::InvalidConfig(_) | FigrepError::TomlParse(_) => vec![
                "Run 'figrep check' to list every configuration problem",
            ],
            FigrepError::NotFound(msg) if msg.contains("config") => vec![
                "Pass --config <path> or create figrep.toml in the working directory",
            ],
            FigrepError::Fetch { message, .. } if message.contains("403") => vec![
                "Check that the API token is valid and has access to the file",
                "Tokens can be supplied with --token or the FIGMA_TOKEN variable",
            ],
            FigrepError::Fetch { .. } => vec!["Check the file key and network connectivity"],
            FigrepError::TreeTooDeep { .. } => vec![
                "Raise report.max_tree_depth or switch report.mode to \"flat\"",
            ],
            FigrepError::Delivery(_) => vec![
                "Verify the [email] section: host, port, security and credentials",
            ],
            _ => vec![],
        }
    }

    /// Create a Fetch error for a file with a displayable cause
    pub fn fetch(file_key: &str, cause: impl std::fmt::Display) -> Self {
        FigrepError::Fetch {
            file_key: file_key.to_string(),
            message: cause.to_string(),
        }
    }

    /// True for errors that only invalidate a single file of a run
    pub fn is_file_scoped(&self) -> bool {
        matches!(self, FigrepError::Fetch { .. } | FigrepError::TreeTooDeep { .. })
    }
}
