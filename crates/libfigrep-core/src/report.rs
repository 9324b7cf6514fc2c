//! Report assembly: filter, resolve, project and stream rows for a list of files
//!
//! The assembler has no knowledge of HTTP, files or the console. Comments and
//! nodes come from a [`CommentSource`], rows go to a [`RowSink`].

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::FigrepError;
use crate::export::RowSink;
use crate::filter::{filter_top_level, FilteredComments};
use crate::matcher::{group_by_node, match_tree, DEFAULT_MAX_TREE_DEPTH};
use crate::projection::Projector;
use crate::types::{Comment, FileNodes, FileTree, OutputRow};

/// Remote API as seen by the assembler. One call per file and kind; no retries.
pub trait CommentSource {
    /// All comments of a file, in API order
    fn fetch_comments(&self, file_key: &str) -> Result<Vec<Comment>, FigrepError>;

    /// Flat lookup of node metadata; the result may omit requested ids
    fn fetch_nodes(&self, file_key: &str, node_ids: &BTreeSet<String>) -> Result<FileNodes, FigrepError>;

    /// Document subtree containing the requested ids
    fn fetch_subtree(&self, file_key: &str, node_ids: &BTreeSet<String>) -> Result<FileTree, FigrepError>;
}

/// A file to report on, with an optional display-name override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTarget {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FileTarget {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            name: None,
        }
    }

    pub fn named(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: Some(name.to_string()),
        }
    }

    fn display_name<'a>(&'a self, fetched: &'a str) -> &'a str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(fetched)
    }
}

/// How comment anchors are resolved to nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMode {
    /// id → node map from the nodes endpoint
    #[default]
    Flat,
    /// walk of the document subtree
    Tree,
}

impl ResolveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveMode::Flat => "flat",
            ResolveMode::Tree => "tree",
        }
    }
}

/// What to do with a comment whose node could not be resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingNodePolicy {
    /// Drop quietly (debug log only)
    #[default]
    Drop,
    /// Drop and log a warning per comment
    Warn,
}

/// A file left out of the report and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub file_key: String,
    pub reason: String,
}

/// Outcome of one assembler run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files_total: usize,
    pub files_reported: usize,
    pub skipped: Vec<SkippedFile>,
    pub rows: usize,
    /// Top-level comments dropped because their node did not resolve
    pub unresolved_comments: usize,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Rows produced for one file
struct FileRows {
    rows: Vec<OutputRow>,
    unresolved: usize,
}

/// Drives filter → resolve → project over a list of files
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    projector: Projector,
    mode: ResolveMode,
    missing_nodes: MissingNodePolicy,
    max_tree_depth: usize,
}

impl ReportAssembler {
    pub fn new(projector: Projector) -> Self {
        Self {
            projector,
            mode: ResolveMode::Flat,
            missing_nodes: MissingNodePolicy::Drop,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
        }
    }

    pub fn with_mode(mut self, mode: ResolveMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_missing_nodes(mut self, policy: MissingNodePolicy) -> Self {
        self.missing_nodes = policy;
        self
    }

    pub fn with_max_tree_depth(mut self, depth: usize) -> Self {
        self.max_tree_depth = depth;
        self
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    /// Write the header, then every file's rows in order.
    ///
    /// Fetch failures skip the file and are recorded in the summary. Sink
    /// errors abort the run.
    pub fn run(
        &self,
        source: &dyn CommentSource,
        files: &[FileTarget],
        sink: &mut dyn RowSink,
    ) -> Result<RunSummary, FigrepError> {
        sink.write_header(&self.projector.header())?;

        let mut summary = RunSummary {
            files_total: files.len(),
            ..RunSummary::default()
        };

        for target in files {
            info!(file_key = %target.key, mode = self.mode.as_str(), "Processing file");

            match self.collect_file(source, target) {
                Ok(file_rows) => {
                    for row in &file_rows.rows {
                        sink.write_row(row)?;
                    }
                    info!(file_key = %target.key, rows = file_rows.rows.len(), "File done");
                    summary.files_reported += 1;
                    summary.rows += file_rows.rows.len();
                    summary.unresolved_comments += file_rows.unresolved;
                }
                Err(e) if e.is_file_scoped() => {
                    warn!(file_key = %target.key, error = %e, "Skipping file");
                    summary.skipped.push(SkippedFile {
                        file_key: target.key.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(summary)
    }

    fn collect_file(&self, source: &dyn CommentSource, target: &FileTarget) -> Result<FileRows, FigrepError> {
        let comments = source.fetch_comments(&target.key)?;
        let filtered = filter_top_level(&comments);
        debug!(
            file_key = %target.key,
            fetched = comments.len(),
            anchored = filtered.comments.len(),
            nodes = filtered.node_ids.len(),
            "Filtered comments"
        );

        if filtered.is_empty() {
            return Ok(FileRows { rows: Vec::new(), unresolved: 0 });
        }

        match self.mode {
            ResolveMode::Flat => self.collect_flat(source, target, &filtered),
            ResolveMode::Tree => self.collect_tree(source, target, &filtered),
        }
    }

    fn collect_flat(
        &self,
        source: &dyn CommentSource,
        target: &FileTarget,
        filtered: &FilteredComments<'_>,
    ) -> Result<FileRows, FigrepError> {
        let resolved = source.fetch_nodes(&target.key, &filtered.node_ids)?;
        let file_name = target.display_name(&resolved.name);

        let mut rows = Vec::with_capacity(filtered.comments.len());
        let mut unresolved = 0;
        for &comment in &filtered.comments {
            let node = comment.node_id().and_then(|id| resolved.nodes.get(id));
            match node {
                Some(node) => rows.push(self.projector.project(comment, node, &target.key, file_name)),
                None => {
                    unresolved += 1;
                    self.report_missing(target, comment);
                }
            }
        }

        Ok(FileRows { rows, unresolved })
    }

    fn collect_tree(
        &self,
        source: &dyn CommentSource,
        target: &FileTarget,
        filtered: &FilteredComments<'_>,
    ) -> Result<FileRows, FigrepError> {
        let tree = source.fetch_subtree(&target.key, &filtered.node_ids)?;
        let file_name = target.display_name(&tree.name);
        let groups = group_by_node(&filtered.comments);

        let matches = match_tree(&tree.document.children, &groups, self.max_tree_depth).map_err(|e| {
            FigrepError::TreeTooDeep {
                file_key: target.key.clone(),
                limit: e.limit,
            }
        })?;

        let matched: HashSet<&str> = matches.iter().map(|m| m.node.id.as_str()).collect();
        let mut unresolved = 0;
        for &comment in &filtered.comments {
            if comment.node_id().map_or(true, |id| !matched.contains(id)) {
                unresolved += 1;
                self.report_missing(target, comment);
            }
        }

        let rows = matches
            .iter()
            .map(|m| self.projector.project(m.comment, m.node, &target.key, file_name))
            .collect();

        Ok(FileRows { rows, unresolved })
    }

    fn report_missing(&self, target: &FileTarget, comment: &Comment) {
        let node_id = comment.node_id().unwrap_or_default();
        match self.missing_nodes {
            MissingNodePolicy::Drop => {
                debug!(file_key = %target.key, comment_id = %comment.id, node_id, "Node not resolved, comment dropped");
            }
            MissingNodePolicy::Warn => {
                warn!(file_key = %target.key, comment_id = %comment.id, node_id, "Node not resolved, comment dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::RowBuffer;
    use crate::types::{Anchor, FieldDescriptor, Node};
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn comment(id: &str, parent: Option<&str>, node_id: &str) -> Comment {
        Comment {
            id: id.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 4, 1, 8, 30, 0).unwrap(),
            resolved_at: None,
            author: "ann".to_string(),
            message: format!("message {}", id),
            parent_id: parent.map(str::to_string),
            anchor: Anchor::node(node_id),
        }
    }

    /// Single-file source that counts calls
    struct OneFile {
        comments: Vec<Comment>,
        nodes: FileNodes,
        tree: FileTree,
        calls: std::cell::RefCell<Vec<String>>,
    }

    impl OneFile {
        fn new(comments: Vec<Comment>) -> Self {
            let mut nodes = HashMap::new();
            nodes.insert("1:1".to_string(), Node::new("1:1", "Frame", "FRAME"));
            Self {
                comments,
                nodes: FileNodes { name: "Design".to_string(), nodes },
                tree: FileTree {
                    name: "Design".to_string(),
                    document: Node::new("0:0", "Document", "DOCUMENT").with_children(vec![
                        Node::new("0:1", "Page", "CANVAS").with_children(vec![Node::new("1:1", "Frame", "FRAME")]),
                    ]),
                },
                calls: std::cell::RefCell::new(Vec::new()),
            }
        }
    }

    impl CommentSource for OneFile {
        fn fetch_comments(&self, file_key: &str) -> Result<Vec<Comment>, FigrepError> {
            self.calls.borrow_mut().push(format!("comments:{}", file_key));
            Ok(self.comments.clone())
        }

        fn fetch_nodes(&self, file_key: &str, node_ids: &BTreeSet<String>) -> Result<FileNodes, FigrepError> {
            self.calls.borrow_mut().push(format!("nodes:{}:{}", file_key, node_ids.len()));
            Ok(self.nodes.clone())
        }

        fn fetch_subtree(&self, file_key: &str, _: &BTreeSet<String>) -> Result<FileTree, FigrepError> {
            self.calls.borrow_mut().push(format!("tree:{}", file_key));
            Ok(self.tree.clone())
        }
    }

    fn assembler() -> ReportAssembler {
        ReportAssembler::new(Projector::new(vec![
            FieldDescriptor::new("file_name", "File"),
            FieldDescriptor::new("comment_id", "ID"),
            FieldDescriptor::new("node_name", "Frame"),
        ]))
    }

    #[test]
    fn test_flat_mode_drops_replies_and_missing_nodes() {
        let source = OneFile::new(vec![
            comment("1", Some("9"), "1:1"),
            comment("2", None, "7:7"),
            comment("3", None, "1:1"),
        ]);
        let mut sink = RowBuffer::default();

        let summary = assembler().run(&source, &[FileTarget::new("F")], &mut sink).unwrap();

        assert_eq!(sink.rows, vec![vec!["Design", "3", "Frame"]]);
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.unresolved_comments, 1);
        assert!(summary.is_complete());
    }

    #[test]
    fn test_tree_mode_uses_subtree() {
        let source = OneFile::new(vec![comment("1", None, "1:1"), comment("2", None, "7:7")]);
        let mut sink = RowBuffer::default();

        let summary = assembler()
            .with_mode(ResolveMode::Tree)
            .with_missing_nodes(MissingNodePolicy::Warn)
            .run(&source, &[FileTarget::named("F", "Renamed")], &mut sink)
            .unwrap();

        assert_eq!(sink.rows, vec![vec!["Renamed", "1", "Frame"]]);
        assert_eq!(summary.unresolved_comments, 1);
        assert_eq!(*source.calls.borrow(), vec!["comments:F", "tree:F"]);
    }

    #[test]
    fn test_tree_depth_violation_skips_file() {
        let source = OneFile::new(vec![comment("1", None, "1:1")]);
        let mut sink = RowBuffer::default();

        let summary = assembler()
            .with_mode(ResolveMode::Tree)
            .with_max_tree_depth(1)
            .run(&source, &[FileTarget::new("F")], &mut sink)
            .unwrap();

        assert!(sink.rows.is_empty());
        assert_eq!(summary.skipped.len(), 1);
        assert!(summary.skipped[0].reason.contains("max depth 1"));
    }

    #[test]
    fn test_no_anchored_comments_skips_node_fetch() {
        let source = OneFile::new(vec![comment("1", Some("0"), "1:1")]);
        let mut sink = RowBuffer::default();

        let summary = assembler().run(&source, &[FileTarget::new("F")], &mut sink).unwrap();

        assert_eq!(*source.calls.borrow(), vec!["comments:F"]);
        assert_eq!(sink.header.as_ref().map(Vec::len), Some(3));
        assert_eq!(summary.files_reported, 1);
    }

    #[test]
    fn test_zero_files_writes_header_only() {
        let source = OneFile::new(Vec::new());
        let mut sink = RowBuffer::default();

        let summary = assembler().run(&source, &[], &mut sink).unwrap();

        assert_eq!(sink.header, Some(vec!["File".to_string(), "ID".to_string(), "Frame".to_string()]));
        assert!(sink.rows.is_empty());
        assert_eq!(summary, RunSummary::default());
    }
}
