//! JSON shapes returned by the REST API and their conversion to domain types

use std::collections::HashMap;
use std::io::Read;

use chrono::{DateTime, Utc};
use libfigrep_core::{Anchor, Comment, FileNodes, FileTree, Node};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Decode a response body with no nesting limit.
///
/// Every node level costs two JSON levels (object and `children` array), so
/// serde_json's default limit of 128 would reject documents ~64 nodes deep.
/// The stack grows on demand while parsing; tree depth is bounded later by
/// `report.max_tree_depth`.
pub fn decode<T: DeserializeOwned, R: Read>(reader: R) -> Result<T, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_reader(reader);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// `GET /v1/files/:key/comments`
#[derive(Debug, Deserialize)]
pub struct CommentsResponse {
    #[serde(default)]
    pub comments: Vec<WireComment>,
}

#[derive(Debug, Deserialize)]
pub struct WireComment {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: WireUser,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub client_meta: Option<ClientMeta>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireUser {
    #[serde(default)]
    pub handle: String,
}

/// Pin position. Canvas pins carry `x`/`y`; frame pins carry `node_id` plus
/// `node_offset`. Region variants add extra fields we ignore.
#[derive(Debug, Default, Deserialize)]
pub struct ClientMeta {
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub node_offset: Option<Vector>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl From<ClientMeta> for Anchor {
    fn from(meta: ClientMeta) -> Self {
        let (x, y) = match meta.node_offset {
            Some(offset) => (Some(offset.x), Some(offset.y)),
            None => (meta.x, meta.y),
        };
        Anchor {
            node_id: meta.node_id.filter(|id| !id.is_empty()),
            x,
            y,
        }
    }
}

impl From<WireComment> for Comment {
    fn from(wire: WireComment) -> Self {
        Comment {
            id: wire.id,
            created_at: wire.created_at,
            resolved_at: wire.resolved_at,
            author: wire.user.handle,
            message: wire.message,
            parent_id: wire.parent_id,
            anchor: wire.client_meta.map(Anchor::from).unwrap_or_default(),
        }
    }
}

impl CommentsResponse {
    pub fn into_comments(self) -> Vec<Comment> {
        self.comments.into_iter().map(Comment::from).collect()
    }
}

/// `GET /v1/files/:key/nodes?ids=...`
#[derive(Debug, Deserialize)]
pub struct NodesResponse {
    #[serde(default)]
    pub name: String,
    /// Unknown or deleted ids come back as `null`
    #[serde(default)]
    pub nodes: HashMap<String, Option<NodeEnvelope>>,
}

#[derive(Debug, Deserialize)]
pub struct NodeEnvelope {
    pub document: Node,
}

impl From<NodesResponse> for FileNodes {
    fn from(wire: NodesResponse) -> Self {
        let nodes = wire
            .nodes
            .into_iter()
            .filter_map(|(id, envelope)| envelope.map(|e| (id, e.document)))
            .collect();
        FileNodes { name: wire.name, nodes }
    }
}

/// `GET /v1/files/:key?ids=...`
#[derive(Debug, Deserialize)]
pub struct FileResponse {
    #[serde(default)]
    pub name: String,
    pub document: Node,
}

impl From<FileResponse> for FileTree {
    fn from(wire: FileResponse) -> Self {
        FileTree {
            name: wire.name,
            document: wire.document,
        }
    }
}
