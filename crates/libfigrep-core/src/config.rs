use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::FigrepError;
use crate::export::{ReportFormat, DEFAULT_DELIMITER, DEFAULT_SHEET_NAME};
use crate::matcher::DEFAULT_MAX_TREE_DEPTH;
use crate::projection::{is_valid_time_format, Projector, DEFAULT_LINK_HOST};
use crate::report::{FileTarget, MissingNodePolicy, ReportAssembler, ResolveMode};
use crate::types::{default_fields, FieldDescriptor};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "figrep.toml";

/// Default API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.figma.com";

/// Top-level configuration (figrep.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Cron expression for `figrep schedule`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default)]
    pub api: ApiConfig,
    /// Files to report on, in output order
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailConfig>,
}

/// API access
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Personal access token; may instead come from the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// A file entry: either a bare key or a table with a display-name override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileEntry {
    Key(String),
    Detailed {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl FileEntry {
    pub fn key(&self) -> &str {
        match self {
            FileEntry::Key(key) => key,
            FileEntry::Detailed { key, .. } => key,
        }
    }

    pub fn to_target(&self) -> FileTarget {
        match self {
            FileEntry::Key(key) => FileTarget::new(key),
            FileEntry::Detailed { key, name } => FileTarget {
                key: key.clone(),
                name: name.clone(),
            },
        }
    }
}

/// Report shape and output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub mode: ResolveMode,
    pub format: ReportFormat,
    /// Where `figrep export` writes the artifact
    pub output: PathBuf,
    pub delimiter: char,
    pub sheet_name: String,
    pub link_host: String,
    pub missing_nodes: MissingNodePolicy,
    pub max_tree_depth: usize,
    /// Columns in order; empty means the default layout
    pub fields: Vec<FieldDescriptor>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            mode: ResolveMode::default(),
            format: ReportFormat::default(),
            output: PathBuf::from("figma_comments.csv"),
            delimiter: DEFAULT_DELIMITER,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            link_host: DEFAULT_LINK_HOST.to_string(),
            missing_nodes: MissingNodePolicy::default(),
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            fields: Vec::new(),
        }
    }
}

impl ReportSettings {
    /// Configured fields, or the default layout when none are listed
    pub fn active_fields(&self) -> Vec<FieldDescriptor> {
        if self.fields.is_empty() {
            default_fields()
        } else {
            self.fields.clone()
        }
    }

    pub fn projector(&self) -> Projector {
        Projector::new(self.active_fields()).with_link_host(&self.link_host)
    }

    pub fn assembler(&self) -> ReportAssembler {
        ReportAssembler::new(self.projector())
            .with_mode(self.mode)
            .with_missing_nodes(self.missing_nodes)
            .with_max_tree_depth(self.max_tree_depth)
    }
}

/// SMTP connection security
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Implicit TLS (usually port 465)
    #[default]
    Tls,
    /// Plain connection upgraded with STARTTLS (usually port 587)
    Starttls,
    /// Unencrypted, for local relays only
    None,
}

/// Mail delivery of the report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub security: SmtpSecurity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    /// Attachment file name; derived from the report format when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_name: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: 465,
            security: SmtpSecurity::default(),
            username: None,
            password: None,
            from: String::new(),
            to: Vec::new(),
            subject: "Figma comments report".to_string(),
            body: String::new(),
            attachment_name: None,
        }
    }
}

impl EmailConfig {
    pub fn attachment_name(&self, format: ReportFormat) -> String {
        self.attachment_name
            .clone()
            .unwrap_or_else(|| format!("figma_comments.{}", format.extension()))
    }

    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.smtp_host.trim().is_empty() {
            problems.push("email.smtp_host is empty".to_string());
        }
        if self.smtp_port == 0 {
            problems.push("email.smtp_port must be non-zero".to_string());
        }
        if self.from.trim().is_empty() {
            problems.push("email.from is empty".to_string());
        }
        if self.to.is_empty() {
            problems.push("email.to lists no recipients".to_string());
        }
        if self.username.is_some() != self.password.is_some() {
            problems.push("email.username and email.password must be set together".to_string());
        }
        problems
    }
}

impl ReporterConfig {
    /// Ordered report targets
    pub fn targets(&self) -> Vec<FileTarget> {
        self.files.iter().map(FileEntry::to_target).collect()
    }

    /// Token, or an error naming where it can be supplied
    pub fn token(&self) -> Result<&str, FigrepError> {
        self.api
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| FigrepError::InvalidConfig("api.token is not set (use --token or FIGMA_TOKEN)".to_string()))
    }

    /// Every defect that prevents a run, collected in one pass
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.token().is_err() {
            problems.push("api.token is not set (use --token or FIGMA_TOKEN)".to_string());
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            problems.push(format!("api.base_url must be an http(s) URL, got {:?}", self.api.base_url));
        }

        if self.files.is_empty() {
            problems.push("files is empty".to_string());
        }
        for (i, entry) in self.files.iter().enumerate() {
            let key = entry.key();
            if key.trim().is_empty() {
                problems.push(format!("files[{}] has an empty key", i));
            } else if key.contains('/') || key.contains(char::is_whitespace) {
                problems.push(format!("files[{}] key {:?} is not a file key", i, key));
            }
        }

        let report = &self.report;
        if !report.delimiter.is_ascii() || report.delimiter == '"' || report.delimiter == '\n' {
            problems.push(format!("report.delimiter {:?} is not usable", report.delimiter));
        }
        if let Some(reason) = sheet_name_problem(&report.sheet_name) {
            problems.push(format!("report.sheet_name {:?} {}", report.sheet_name, reason));
        }
        if report.link_host.trim().is_empty() || report.link_host.contains('/') {
            problems.push(format!("report.link_host {:?} must be a bare host name", report.link_host));
        }
        if report.max_tree_depth == 0 {
            problems.push("report.max_tree_depth must be at least 1".to_string());
        }
        for field in &report.fields {
            if field.name.trim().is_empty() {
                problems.push("report.fields contains an entry without a name".to_string());
            }
            if let Some(format) = &field.format {
                if !is_valid_time_format(format) {
                    problems.push(format!("report.fields {:?} has an invalid time format {:?}", field.name, format));
                }
            }
        }

        if let Some(email) = &self.email {
            problems.extend(email.problems());
        }

        problems
    }

    /// Fail with one `InvalidConfig` listing all problems
    pub fn validate(&self) -> Result<(), FigrepError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(FigrepError::InvalidConfig(problems.join("; ")))
        }
    }

    /// Email section, required for delivery
    pub fn email(&self) -> Result<&EmailConfig, FigrepError> {
        self.email
            .as_ref()
            .ok_or_else(|| FigrepError::InvalidConfig("[email] section is missing".to_string()))
    }
}

fn sheet_name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("is empty")
    } else if name.chars().count() > 31 {
        Some("is longer than 31 characters")
    } else if name.contains(['[', ']', ':', '*', '?', '/', '\\']) {
        Some("contains one of []:*?/\\")
    } else if name.starts_with('\'') || name.ends_with('\'') {
        Some("starts or ends with an apostrophe")
    } else {
        None
    }
}

/// Parse a config from TOML text
pub fn parse_config(content: &str) -> Result<ReporterConfig, FigrepError> {
    Ok(toml::from_str(content)?)
}

/// Load a config file
pub fn load_config(path: &Path) -> Result<ReporterConfig, FigrepError> {
    if !path.exists() {
        return Err(FigrepError::NotFound(format!("config file {}", path.display())));
    }
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const FULL: &str = r#"
schedule = "0 9 * * Mon-Fri"
files = ["AAA", { key = "BBB", name = "Checkout" }]

[api]
token = "secret"

[report]
mode = "tree"
format = "xlsx"
sheet_name = "Review"
missing_nodes = "warn"

[[report.fields]]
name = "created_at"
display = "Created"
format = "%Y-%m-%d"

[[report.fields]]
name = "link"
display = "Link"

[email]
smtp_host = "smtp.example.com"
smtp_port = 587
security = "starttls"
username = "bot"
password = "pw"
from = "bot@example.com"
to = ["team@example.com"]
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(FULL).unwrap();
        config.validate().unwrap();

        assert_eq!(config.schedule.as_deref(), Some("0 9 * * Mon-Fri"));
        assert_eq!(config.targets(), vec![FileTarget::new("AAA"), FileTarget::named("BBB", "Checkout")]);
        assert_eq!(config.report.mode, ResolveMode::Tree);
        assert_eq!(config.report.format, ReportFormat::Xlsx);
        assert_eq!(config.report.missing_nodes, MissingNodePolicy::Warn);
        assert_eq!(config.report.delimiter, ';');
        assert_eq!(config.report.active_fields().len(), 2);
        assert_eq!(config.report.active_fields()[0].format.as_deref(), Some("%Y-%m-%d"));

        let email = config.email().unwrap();
        assert_eq!(email.security, SmtpSecurity::Starttls);
        assert_eq!(email.attachment_name(config.report.format), "figma_comments.xlsx");
    }

    #[test]
    fn test_files_below_api_table_are_not_top_level() {
        let config = parse_config("[api]\ntoken = \"t\"\nfiles = [\"AAA\"]\n").unwrap();
        assert!(config.files.is_empty());
        assert!(config.problems().iter().any(|p| p == "files is empty"));

        let config = parse_config("files = [\"AAA\"]\n[api]\ntoken = \"t\"\n").unwrap();
        assert_eq!(config.targets(), vec![FileTarget::new("AAA")]);
        assert!(config.problems().is_empty());
    }

    #[test]
    fn test_defaults_apply() {
        let config = parse_config("files = [\"AAA\"]\n[api]\ntoken = \"t\"\n").unwrap();
        config.validate().unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.report.active_fields(), default_fields());
        assert_eq!(config.report.sheet_name, "Comments");
        assert!(config.email.is_none());
        assert!(config.email().is_err());
    }

    #[test]
    fn test_validate_collects_all_problems() {
        let config = parse_config(
            r#"
files = []

[report]
sheet_name = "a/b"
max_tree_depth = 0

[[report.fields]]
name = "created_at"
display = "Created"
format = "%Q"
"#,
        )
        .unwrap();

        let problems = config.problems();
        assert_eq!(problems.len(), 5, "{:?}", problems);
        assert!(problems.iter().any(|p| p.contains("api.token")));
        assert!(problems.iter().any(|p| p.contains("files is empty")));
        assert!(problems.iter().any(|p| p.contains("sheet_name")));
        assert!(problems.iter().any(|p| p.contains("max_tree_depth")));
        assert!(problems.iter().any(|p| p.contains("%Q")));

        match config.validate() {
            Err(FigrepError::InvalidConfig(msg)) => assert!(msg.contains("files is empty")),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_incomplete_email_is_rejected() {
        let config = parse_config(
            "files = [\"A\"]\n[api]\ntoken = \"t\"\n[email]\nsmtp_host = \"h\"\nusername = \"u\"\n",
        )
        .unwrap();
        let problems = config.problems();
        assert!(problems.iter().any(|p| p.contains("email.from")));
        assert!(problems.iter().any(|p| p.contains("email.to")));
        assert!(problems.iter().any(|p| p.contains("together")));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_config(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, FULL).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.files.len(), 2);
    }

    #[test]
    fn test_sheet_name_rules() {
        assert!(sheet_name_problem("Comments").is_none());
        assert!(sheet_name_problem("").is_some());
        assert!(sheet_name_problem(&"x".repeat(32)).is_some());
        assert!(sheet_name_problem("'quoted").is_some());
    }
}
