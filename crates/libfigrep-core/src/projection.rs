//! Field projection: turns a resolved (comment, node, file) tuple into a report row
//!
//! Every column is looked up by name in [`FIELD_REGISTRY`]. Names the registry
//! does not know resolve to an empty string so a config written for a newer
//! release still exports.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::{Comment, FieldDescriptor, Node, OutputRow};

/// Host used for deep links unless the report overrides it
pub const DEFAULT_LINK_HOST: &str = "www.figma.com";

/// Everything a field resolver may read
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub comment: &'a Comment,
    pub node: &'a Node,
    pub file_key: &'a str,
    pub file_name: &'a str,
    pub link_host: &'a str,
}

/// Resolves one field; the second argument is the descriptor's format hint
pub type FieldResolver = fn(&RowContext<'_>, Option<&str>) -> String;

/// A registered field: name, resolver and a short description for `figrep fields`
pub struct FieldSpec {
    pub name: &'static str,
    pub resolve: FieldResolver,
    pub description: &'static str,
}

pub static FIELD_REGISTRY: &[FieldSpec] = &[
    FieldSpec { name: "file_name", resolve: resolve_file_name, description: "display name of the file" },
    FieldSpec { name: "file_id", resolve: resolve_file_id, description: "file key" },
    FieldSpec { name: "node_name", resolve: resolve_node_name, description: "name of the node the comment is pinned to" },
    FieldSpec { name: "node_id", resolve: resolve_node_id, description: "id of the node the comment is pinned to" },
    FieldSpec { name: "node_type", resolve: resolve_node_type, description: "type of the node (FRAME, GROUP, ...)" },
    FieldSpec { name: "comment_id", resolve: resolve_comment_id, description: "comment id" },
    FieldSpec { name: "message", resolve: resolve_message, description: "comment text" },
    FieldSpec { name: "author", resolve: resolve_author, description: "author handle" },
    FieldSpec { name: "created_at", resolve: resolve_created_at, description: "creation time (format hint applies)" },
    FieldSpec { name: "status", resolve: resolve_status, description: "\"open\" or \"resolved\"" },
    FieldSpec { name: "resolved_at", resolve: resolve_resolved_at, description: "resolution time, empty while open (format hint applies)" },
    FieldSpec { name: "x", resolve: resolve_x, description: "horizontal pin offset" },
    FieldSpec { name: "y", resolve: resolve_y, description: "vertical pin offset" },
    FieldSpec { name: "link", resolve: resolve_link, description: "deep link (/design/ URL, node id with '-')" },
    FieldSpec { name: "legacy_link", resolve: resolve_legacy_link, description: "deep link (/file/ URL, raw node id)" },
];

/// Look up a field resolver by name
pub fn lookup_field(name: &str) -> Option<FieldResolver> {
    FIELD_REGISTRY.iter().find(|spec| spec.name == name).map(|spec| spec.resolve)
}

fn resolve_file_name(ctx: &RowContext<'_>, _: Option<&str>) -> String {
    ctx.file_name.to_string()
}

fn resolve_file_id(ctx: &RowContext<'_>, _: Option<&str>) -> String {
    ctx.file_key.to_string()
}

fn resolve_node_name(ctx: &RowContext<'_>, _: Option<&str>) -> String {
    ctx.node.name.clone()
}

fn resolve_node_id(ctx: &RowContext<'_>, _: Option<&str>) -> String {
    ctx.node.id.clone()
}

fn resolve_node_type(ctx: &RowContext<'_>, _: Option<&str>) -> String {
    ctx.node.node_type.clone()
}

fn resolve_comment_id(ctx: &RowContext<'_>, _: Option<&str>) -> String {
    ctx.comment.id.clone()
}

fn resolve_message(ctx: &RowContext<'_>, _: Option<&str>) -> String {
    ctx.comment.message.clone()
}

fn resolve_author(ctx: &RowContext<'_>, _: Option<&str>) -> String {
    ctx.comment.author.clone()
}

fn resolve_status(ctx: &RowContext<'_>, _: Option<&str>) -> String {
    ctx.comment.status().as_str().to_string()
}

fn resolve_x(ctx: &RowContext<'_>, _: Option<&str>) -> String {
    coordinate(ctx.comment.anchor.x)
}

fn resolve_y(ctx: &RowContext<'_>, _: Option<&str>) -> String {
    coordinate(ctx.comment.anchor.y)
}

fn resolve_created_at(ctx: &RowContext<'_>, format: Option<&str>) -> String {
    format_timestamp(&ctx.comment.created_at, format)
}

fn resolve_resolved_at(ctx: &RowContext<'_>, format: Option<&str>) -> String {
    ctx.comment
        .resolved_at
        .as_ref()
        .map(|ts| format_timestamp(ts, format))
        .unwrap_or_default()
}

fn resolve_link(ctx: &RowContext<'_>, _: Option<&str>) -> String {
    design_link(ctx.link_host, ctx.file_key, &ctx.node.id, &ctx.comment.id)
}

fn resolve_legacy_link(ctx: &RowContext<'_>, _: Option<&str>) -> String {
    legacy_link(ctx.link_host, ctx.file_key, &ctx.node.id, &ctx.comment.id)
}

fn coordinate(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Format a timestamp with a strftime hint, RFC 3339 (whole seconds, `Z`) otherwise.
///
/// Hints chrono cannot render fall back to the default instead of panicking.
pub fn format_timestamp(ts: &DateTime<Utc>, format: Option<&str>) -> String {
    if let Some(pattern) = format.filter(|p| !p.is_empty()) {
        let mut out = String::new();
        if write!(out, "{}", ts.format(pattern)).is_ok() {
            return out;
        }
    }
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// True if chrono can render every item of a strftime pattern
pub fn is_valid_time_format(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// `/design/` deep link; only the first ':' of the node id becomes '-'
pub fn design_link(host: &str, file_key: &str, node_id: &str, comment_id: &str) -> String {
    format!(
        "https://{}/design/{}?node-id={}#{}",
        host,
        file_key,
        node_id.replacen(':', "-", 1),
        comment_id
    )
}

/// Older `/file/` deep link with the node id left untouched
pub fn legacy_link(host: &str, file_key: &str, node_id: &str, comment_id: &str) -> String {
    format!("https://{}/file/{}/?node-id={}#{}", host, file_key, node_id, comment_id)
}

/// Projects rows for a fixed, ordered field list
#[derive(Debug, Clone)]
pub struct Projector {
    fields: Vec<FieldDescriptor>,
    link_host: String,
}

impl Projector {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self {
            fields,
            link_host: DEFAULT_LINK_HOST.to_string(),
        }
    }

    pub fn with_link_host(mut self, host: &str) -> Self {
        self.link_host = host.to_string();
        self
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Header labels in column order
    pub fn header(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.display.clone()).collect()
    }

    /// Field names that will always project to an empty string
    pub fn unknown_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| lookup_field(&f.name).is_none())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Build one row; always `fields().len()` values long
    pub fn project(&self, comment: &Comment, node: &Node, file_key: &str, file_name: &str) -> OutputRow {
        let ctx = RowContext {
            comment,
            node,
            file_key,
            file_name,
            link_host: &self.link_host,
        };

        self.fields
            .iter()
            .map(|field| match lookup_field(&field.name) {
                Some(resolve) => resolve(&ctx, field.format.as_deref()),
                None => String::new(),
            })
            .collect()
    }
}
