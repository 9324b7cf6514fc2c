use serde::{Deserialize, Serialize};

/// One report column: semantic field name, header label and optional format hint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub display: String,
    /// strftime pattern, only read by timestamp fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: &str, display: &str) -> Self {
        Self {
            name: name.to_string(),
            display: display.to_string(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }
}

/// Row values aligned 1:1 with the active field list
pub type OutputRow = Vec<String>;

/// Column layout used when the config lists no fields
pub fn default_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("file_name", "File"),
        FieldDescriptor::new("file_id", "File ID"),
        FieldDescriptor::new("node_name", "Frame"),
        FieldDescriptor::new("node_id", "Frame ID"),
        FieldDescriptor::new("message", "Comment"),
        FieldDescriptor::new("author", "Author"),
        FieldDescriptor::new("created_at", "Created"),
        FieldDescriptor::new("status", "Status"),
        FieldDescriptor::new("resolved_at", "Resolved"),
        FieldDescriptor::new("link", "Link"),
    ]
}
