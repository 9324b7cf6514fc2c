//! Tree matching: pairs comments with the nodes of a fetched document subtree
//!
//! The walk uses an explicit stack, so deep trees cost heap instead of call
//! stack. Design files are shallow (a few dozen levels at most); the depth
//! limit only guards against pathological payloads.

use std::collections::HashMap;

use crate::types::{Comment, Node};

/// Default maximum nesting depth accepted by [`walk_preorder`]
pub const DEFAULT_MAX_TREE_DEPTH: usize = 256;

/// A node deeper than the configured limit was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthExceeded {
    pub limit: usize,
}

/// One (node, comment) pair found by [`match_tree`]
#[derive(Debug, Clone, Copy)]
pub struct TreeMatch<'a> {
    pub node: &'a Node,
    pub comment: &'a Comment,
}

/// Group comments by the node they are anchored to, keeping original order per group
pub fn group_by_node<'a>(comments: &[&'a Comment]) -> HashMap<&'a str, Vec<&'a Comment>> {
    let mut groups: HashMap<&'a str, Vec<&'a Comment>> = HashMap::new();
    for &comment in comments {
        if let Some(node_id) = comment.node_id() {
            groups.entry(node_id).or_default().push(comment);
        }
    }
    groups
}

/// Visit every node depth-first, pre-order, in input child order.
///
/// `roots` sit at depth 1. Fails as soon as a node deeper than `max_depth`
/// would be visited.
pub fn walk_preorder<'a, F>(roots: &'a [Node], max_depth: usize, mut visit: F) -> Result<(), DepthExceeded>
where
    F: FnMut(&'a Node, usize),
{
    let mut stack: Vec<(&'a Node, usize)> = roots.iter().rev().map(|n| (n, 1)).collect();

    while let Some((node, depth)) = stack.pop() {
        if depth > max_depth {
            return Err(DepthExceeded { limit: max_depth });
        }
        visit(node, depth);
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }

    Ok(())
}

/// Emit one match per comment in the group of every visited node.
///
/// Groups whose id never appears in the tree contribute nothing. A node id
/// that occurs twice in the tree matches its group twice.
pub fn match_tree<'a>(
    roots: &'a [Node],
    groups: &HashMap<&str, Vec<&'a Comment>>,
    max_depth: usize,
) -> Result<Vec<TreeMatch<'a>>, DepthExceeded> {
    let mut matches = Vec::new();

    walk_preorder(roots, max_depth, |node, _| {
        if let Some(comments) = groups.get(node.id.as_str()) {
            matches.extend(comments.iter().map(|&comment| TreeMatch { node, comment }));
        }
    })?;

    Ok(matches)
}
