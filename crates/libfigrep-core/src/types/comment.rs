use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position a comment was pinned to on the canvas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Node the comment is attached to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl Anchor {
    pub fn node(node_id: &str) -> Self {
        Self {
            node_id: Some(node_id.to_string()),
            ..Self::default()
        }
    }
}

/// A comment snapshot as fetched from the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Present once the thread was resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub author: String,
    pub message: String,
    /// Empty or absent for top-level comments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub anchor: Anchor,
}

impl Comment {
    /// A comment is top-level when it has no (non-empty) parent
    pub fn is_top_level(&self) -> bool {
        self.parent_id.as_deref().map_or(true, str::is_empty)
    }

    /// The referenced node id, ignoring empty strings
    pub fn node_id(&self) -> Option<&str> {
        self.anchor.node_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn status(&self) -> CommentStatus {
        if self.resolved_at.is_some() {
            CommentStatus::Resolved
        } else {
            CommentStatus::Open
        }
    }
}

/// Resolution status, derived only from `resolved_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Open,
    Resolved,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Open => "open",
            CommentStatus::Resolved => "resolved",
        }
    }
}
