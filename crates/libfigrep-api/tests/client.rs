//! Client tests against a one-shot local HTTP server

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use libfigrep_api::{ApiError, FigmaClient};
use libfigrep_core::{CommentSource, FigrepError};

/// Serve exactly one response, returning the raw request head
fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut head = String::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            head.push_str(&line);
        }
        stream.write_all(response.as_bytes()).unwrap();
        head
    });

    (base_url, handle)
}

fn ids(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_comments_request_sends_token() {
    let body = r#"{"comments":[{"id":"1","user":{"handle":"ann"},"created_at":"2024-06-01T09:00:00Z","message":"hi","client_meta":{"node_id":"1:2","node_offset":{"x":0,"y":0}}}]}"#;
    let (base_url, server) = serve_once("200 OK", body);

    let client = FigmaClient::new(&base_url, "secret-token");
    let comments = client.fetch_comments("ABC").unwrap();
    let head = server.join().unwrap();

    assert!(head.starts_with("GET /v1/files/ABC/comments HTTP/1.1"));
    assert!(head.to_ascii_lowercase().contains("x-figma-token: secret-token"));
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].node_id(), Some("1:2"));
}

#[test]
fn test_nodes_request_lists_ids() {
    let body = r#"{"name":"Landing","nodes":{"1:2":{"document":{"id":"1:2","name":"Hero","type":"FRAME"}},"3:4":null}}"#;
    let (base_url, server) = serve_once("200 OK", body);

    let client = FigmaClient::new(&base_url, "t");
    let nodes = client.fetch_nodes("ABC", &ids(&["3:4", "1:2"])).unwrap();
    let head = server.join().unwrap();

    let request_line = head.lines().next().unwrap();
    assert!(request_line.starts_with("GET /v1/files/ABC/nodes?ids=1%3A2%2C3%3A4&depth=1"));
    assert_eq!(nodes.name, "Landing");
    assert!(nodes.nodes.contains_key("1:2"));
    assert!(!nodes.nodes.contains_key("3:4"));
}

#[test]
fn test_subtree_request() {
    let body = r#"{"name":"Landing","document":{"id":"0:0","name":"Document","type":"DOCUMENT","children":[]}}"#;
    let (base_url, server) = serve_once("200 OK", body);

    let client = FigmaClient::new(&base_url, "t");
    let tree = client.fetch_subtree("ABC", &ids(&["1:2"])).unwrap();
    let head = server.join().unwrap();

    assert!(head.starts_with("GET /v1/files/ABC?ids=1%3A2 HTTP/1.1"));
    assert_eq!(tree.document.node_type, "DOCUMENT");
}

#[test]
fn test_status_error_carries_api_message() {
    let (base_url, server) = serve_once("403 Forbidden", r#"{"status":403,"err":"Invalid token"}"#);

    let client = FigmaClient::new(&base_url, "bad");
    let err = client.comments("ABC").unwrap_err();
    server.join().unwrap();

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Invalid token");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_source_errors_are_file_scoped() {
    let (base_url, server) = serve_once("200 OK", "not json");

    let client = FigmaClient::new(&base_url, "t");
    let err = client.fetch_comments("XYZ").unwrap_err();
    server.join().unwrap();

    assert!(err.is_file_scoped());
    match err {
        FigrepError::Fetch { file_key, message } => {
            assert_eq!(file_key, "XYZ");
            assert!(message.contains("malformed response"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_unreachable_host_is_transport_error() {
    // Bind then drop to get a port nobody listens on
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let client = FigmaClient::new(&format!("http://127.0.0.1:{}", port), "t");
    assert!(matches!(client.comments("ABC"), Err(ApiError::Transport(_))));
}
