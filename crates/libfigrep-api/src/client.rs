//! Blocking REST client

use std::collections::BTreeSet;
use std::io::BufReader;
use std::time::Duration;

use libfigrep_core::{Comment, CommentSource, FigrepError, FileNodes, FileTree};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::wire::{decode, CommentsResponse, FileResponse, NodesResponse};

/// Header carrying the personal access token
pub const TOKEN_HEADER: &str = "X-FIGMA-TOKEN";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the file, node and comment endpoints.
///
/// One request per call, no retries or pagination.
pub struct FigmaClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl FigmaClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            agent: build_agent(DEFAULT_TIMEOUT),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn comments(&self, file_key: &str) -> Result<Vec<Comment>, ApiError> {
        let response: CommentsResponse = self.get(&comments_path(file_key), &[])?;
        Ok(response.into_comments())
    }

    /// Flat metadata for `ids`, children not included
    pub fn nodes(&self, file_key: &str, ids: &BTreeSet<String>) -> Result<FileNodes, ApiError> {
        let ids = join_ids(ids);
        let response: NodesResponse = self.get(&nodes_path(file_key), &[("ids", ids.as_str()), ("depth", "1")])?;
        Ok(response.into())
    }

    /// Document tree restricted to the pages containing `ids`
    pub fn subtree(&self, file_key: &str, ids: &BTreeSet<String>) -> Result<FileTree, ApiError> {
        let ids = join_ids(ids);
        let response: FileResponse = self.get(&file_path(file_key), &[("ids", ids.as_str())])?;
        Ok(response.into())
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET");

        let mut request = self.agent.get(&url).set(TOKEN_HEADER, &self.token);
        for (key, value) in query {
            request = request.query(key, value);
        }
        let response = request.call()?;

        // into_string caps bodies at 10 MB, whole-file documents can be larger
        decode(BufReader::new(response.into_reader())).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl CommentSource for FigmaClient {
    fn fetch_comments(&self, file_key: &str) -> Result<Vec<Comment>, FigrepError> {
        self.comments(file_key).map_err(|e| FigrepError::fetch(file_key, e))
    }

    fn fetch_nodes(&self, file_key: &str, node_ids: &BTreeSet<String>) -> Result<FileNodes, FigrepError> {
        self.nodes(file_key, node_ids).map_err(|e| FigrepError::fetch(file_key, e))
    }

    fn fetch_subtree(&self, file_key: &str, node_ids: &BTreeSet<String>) -> Result<FileTree, FigrepError> {
        self.subtree(file_key, node_ids).map_err(|e| FigrepError::fetch(file_key, e))
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(concat!("figrep/", env!("CARGO_PKG_VERSION")))
        .build()
}

fn comments_path(file_key: &str) -> String {
    format!("/v1/files/{}/comments", file_key)
}

fn nodes_path(file_key: &str) -> String {
    format!("/v1/files/{}/nodes", file_key)
}

fn file_path(file_key: &str) -> String {
    format!("/v1/files/{}", file_key)
}

fn join_ids(ids: &BTreeSet<String>) -> String {
    ids.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(comments_path("ABC"), "/v1/files/ABC/comments");
        assert_eq!(nodes_path("ABC"), "/v1/files/ABC/nodes");
        assert_eq!(file_path("ABC"), "/v1/files/ABC");
    }

    #[test]
    fn test_join_ids_is_sorted() {
        let ids: BTreeSet<String> = ["3:1", "1:2", "1:10"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join_ids(&ids), "1:10,1:2,3:1");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = FigmaClient::new("https://api.example.com/", "t");
        assert_eq!(client.base_url(), "https://api.example.com");
    }
}
