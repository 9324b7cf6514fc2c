use std::collections::BTreeSet;
use crate::types::Comment;

/// Top-level, node-anchored comments of one file
#[derive(Debug, Default)]
pub struct FilteredComments<'a> {
    /// Qualifying comments in their original order
    pub comments: Vec<&'a Comment>,
    /// Distinct node ids referenced by `comments`
    pub node_ids: BTreeSet<String>,
}

impl FilteredComments<'_> {
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

/// Keep comments that start a thread and point at a node.
///
/// Replies carry no anchor of their own and un-anchored comments have no node
/// to report against, so both are dropped without error.
pub fn filter_top_level(comments: &[Comment]) -> FilteredComments<'_> {
    let mut filtered = FilteredComments::default();

    for comment in comments {
        if !comment.is_top_level() {
            continue;
        }
        if let Some(node_id) = comment.node_id() {
            filtered.comments.push(comment);
            filtered.node_ids.insert(node_id.to_string());
        }
    }

    filtered
}
